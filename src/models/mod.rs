use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the seller's active list, as returned by a page request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingSummary {
    pub item_id: String,
    pub title: Option<String>,
    pub current_price: Option<String>,
    pub quantity: Option<u32>,
    pub time_left: Option<String>,
    pub watch_count: Option<u32>,
}

impl ListingSummary {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: None,
            current_price: None,
            quantity: None,
            time_left: None,
            watch_count: None,
        }
    }
}

/// A page of the active list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivePage {
    pub items: Vec<ListingSummary>,
    /// `None` when the response carried no page count
    pub total_pages: Option<u32>,
}

/// A price with the currency code from its `currencyID` attribute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub value: String,
    pub currency: Option<String>,
}

/// Name/value pairs from the listing's item specifics, in response order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemSpecifics(pub Vec<(String, Vec<String>)>);

impl ItemSpecifics {
    /// Values for the first specific whose name matches `name`, ignoring case
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(n, values)| n.eq_ignore_ascii_case(name) && !values.is_empty())
            .map(|(_, values)| values.as_slice())
    }

    /// First non-empty match among several candidate names
    pub fn first_of(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .find_map(|name| self.get(name))
            .map(|values| values.join(", "))
    }

    /// Values for the first specific whose name starts with `prefix`
    pub fn starting_with(&self, prefix: &str) -> Option<String> {
        let prefix = prefix.to_ascii_lowercase();
        self.0
            .iter()
            .find(|(n, values)| n.to_ascii_lowercase().starts_with(&prefix) && !values.is_empty())
            .map(|(_, values)| values.join(", "))
    }
}

/// Start or end time of a listing. Raw text is kept when it is not RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl Timestamp {
    pub fn parse(text: &str) -> Self {
        match DateTime::parse_from_rfc3339(text) {
            Ok(dt) => Timestamp::Parsed(dt.with_timezone(&Utc)),
            Err(_) => Timestamp::Raw(text.to_string()),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Parsed(dt) => write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            Timestamp::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Attributes resolved from item specifics, with the text heuristic as fallback
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Attributes {
    pub colors: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
}

/// Full record for one listing, built in a single pass over a GetItem response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDetail {
    pub item_id: String,
    pub title: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub quantity: Option<u32>,
    pub listing_type: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub location: Option<String>,
    pub seller: Option<String>,
    pub watch_count: Option<u32>,
    pub hit_count: Option<u32>,
    pub shipping_cost: Option<String>,
    pub returns_accepted: Option<String>,
    pub picture_urls: Vec<String>,
    pub description: Option<String>,
    pub item_specifics: ItemSpecifics,
    pub attributes: Attributes,
    pub fetched_at: DateTime<Utc>,
}

impl ListingDetail {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            title: None,
            price: None,
            category: None,
            condition: None,
            quantity: None,
            listing_type: None,
            start_time: None,
            end_time: None,
            location: None,
            seller: None,
            watch_count: None,
            hit_count: None,
            shipping_cost: None,
            returns_accepted: None,
            picture_urls: Vec::new(),
            description: None,
            item_specifics: ItemSpecifics::default(),
            attributes: Attributes::default(),
            fetched_at: Utc::now(),
        }
    }
}

/// Result of the detail request for one summary
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    Fetched {
        summary: ListingSummary,
        detail: ListingDetail,
    },
    Unavailable {
        summary: ListingSummary,
        reason: String,
    },
}

impl DetailOutcome {
    pub fn summary(&self) -> &ListingSummary {
        match self {
            DetailOutcome::Fetched { summary, .. } | DetailOutcome::Unavailable { summary, .. } => {
                summary
            }
        }
    }

    pub fn detail(&self) -> Option<&ListingDetail> {
        match self {
            DetailOutcome::Fetched { detail, .. } => Some(detail),
            DetailOutcome::Unavailable { .. } => None,
        }
    }
}
