pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod traits;

pub use client::TradingClient;
pub use error::ApiError;
pub use traits::SellingApi;
