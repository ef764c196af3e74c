use crate::models::{DetailOutcome, ListingDetail, ListingSummary};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Written wherever a value is missing from the API response
pub const NOT_AVAILABLE: &str = "not available";

pub const LISTING_HEADERS: [&str; 14] = [
    "Item ID",
    "Title",
    "Current Price",
    "Quantity",
    "Time Left",
    "Watch Count",
    "Description",
    "Image URLs",
    "Category",
    "Condition",
    "Colors",
    "Brand",
    "Model",
    "Size",
];

pub const DETAIL_HEADERS: [&str; 17] = [
    "ItemID",
    "Title",
    "Price",
    "Currency",
    "Category",
    "Condition",
    "Quantity",
    "ListingType",
    "StartTime",
    "EndTime",
    "Location",
    "Seller",
    "WatchCount",
    "HitCount",
    "ShippingCost",
    "ReturnPolicy",
    "PictureURLs",
];

/// Column layout of the raw export
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportLayout {
    /// Summary plus attributes; the input the record jobs expect
    Listing,
    /// Every detail field, one row per fetched listing
    Detail,
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn joined_urls(urls: &[String]) -> String {
    if urls.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        urls.join(", ")
    }
}

/// Summary columns first; the detail fills in whatever the summary lacks
pub fn listing_row(summary: &ListingSummary, detail: Option<&ListingDetail>) -> Vec<String> {
    let price = summary
        .current_price
        .clone()
        .or_else(|| detail.and_then(|d| d.price.as_ref().map(|p| p.value.clone())));
    let quantity = summary.quantity.or_else(|| detail.and_then(|d| d.quantity));
    let title = summary
        .title
        .clone()
        .or_else(|| detail.and_then(|d| d.title.clone()));

    let mut row = vec![
        summary.item_id.clone(),
        or_na(title),
        or_na(price),
        or_na(quantity.map(|q| q.to_string())),
        or_na(summary.time_left.clone()),
        or_na(summary.watch_count.map(|w| w.to_string())),
    ];

    match detail {
        Some(d) => row.extend([
            or_na(d.description.clone()),
            joined_urls(&d.picture_urls),
            or_na(d.category.clone()),
            or_na(d.condition.clone()),
            or_na(d.attributes.colors.clone()),
            or_na(d.attributes.brand.clone()),
            or_na(d.attributes.model.clone()),
            or_na(d.attributes.size.clone()),
        ]),
        None => row.extend(std::iter::repeat(NOT_AVAILABLE.to_string()).take(8)),
    }
    row
}

pub fn detail_row(d: &ListingDetail) -> Vec<String> {
    vec![
        d.item_id.clone(),
        or_na(d.title.clone()),
        or_na(d.price.as_ref().map(|p| p.value.clone())),
        or_na(d.price.as_ref().and_then(|p| p.currency.clone())),
        or_na(d.category.clone()),
        or_na(d.condition.clone()),
        or_na(d.quantity.map(|q| q.to_string())),
        or_na(d.listing_type.clone()),
        or_na(d.start_time.as_ref().map(ToString::to_string)),
        or_na(d.end_time.as_ref().map(ToString::to_string)),
        or_na(d.location.clone()),
        or_na(d.seller.clone()),
        or_na(d.watch_count.map(|w| w.to_string())),
        or_na(d.hit_count.map(|h| h.to_string())),
        or_na(d.shipping_cost.clone()),
        or_na(d.returns_accepted.clone()),
        joined_urls(&d.picture_urls),
    ]
}

/// Write the outcomes as CSV; returns the number of data rows written
pub fn write_outcomes<W: Write>(
    writer: W,
    outcomes: &[DetailOutcome],
    layout: ExportLayout,
) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut rows = 0;

    match layout {
        ExportLayout::Listing => {
            csv.write_record(LISTING_HEADERS)?;
            for outcome in outcomes {
                csv.write_record(listing_row(outcome.summary(), outcome.detail()))?;
                rows += 1;
            }
        }
        ExportLayout::Detail => {
            csv.write_record(DETAIL_HEADERS)?;
            for outcome in outcomes {
                match outcome.detail() {
                    Some(detail) => {
                        csv.write_record(detail_row(detail))?;
                        rows += 1;
                    }
                    None => warn!(
                        item_id = %outcome.summary().item_id,
                        "No details, leaving listing out of the export"
                    ),
                }
            }
        }
    }

    csv.flush()?;
    Ok(rows)
}

pub fn export_to_file(path: &Path, outcomes: &[DetailOutcome], layout: ExportLayout) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let rows = write_outcomes(file, outcomes, layout)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("💾 Wrote {} listings to {}", rows, path.display());
    Ok(())
}

/// `<item id>.json`, or `None` when the id is not plain alphanumeric
pub fn dump_file_name(item_id: &str) -> Option<String> {
    let plain = !item_id.is_empty() && item_id.chars().all(|c| c.is_ascii_alphanumeric());
    plain.then(|| format!("{}.json", item_id))
}

/// Save each fetched detail record as `<dir>/<item id>.json`
pub async fn dump_details(dir: &Path, outcomes: &[DetailOutcome]) -> Result<usize> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = 0;
    for detail in outcomes.iter().filter_map(DetailOutcome::detail) {
        let Some(name) = dump_file_name(&detail.item_id) else {
            warn!(item_id = %detail.item_id, "Item id is not a safe file name, not dumping it");
            continue;
        };
        let filename = dir.join(name);
        let json = serde_json::to_string_pretty(detail)?;
        tokio::fs::write(&filename, json)
            .await
            .with_context(|| format!("Failed to write {}", filename.display()))?;
        written += 1;
    }

    info!("💾 Saved {} detail records to {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attributes, Price};

    fn summary() -> ListingSummary {
        ListingSummary {
            item_id: "110001".to_string(),
            title: Some("Red scarf".to_string()),
            current_price: Some("19.5".to_string()),
            quantity: Some(3),
            time_left: Some("P2DT3H".to_string()),
            watch_count: None,
        }
    }

    fn detail() -> ListingDetail {
        let mut d = ListingDetail::new("110001");
        d.title = Some("Red scarf".to_string());
        d.price = Some(Price {
            value: "19.5".to_string(),
            currency: Some("USD".to_string()),
        });
        d.condition = Some("Pre-owned".to_string());
        d.picture_urls = vec!["https://i/1.jpg".to_string(), "https://i/2.jpg".to_string()];
        d.description = Some("<p>Soft, warm</p>".to_string());
        d.attributes = Attributes {
            colors: Some("Red".to_string()),
            brand: Some("Acme".to_string()),
            model: None,
            size: Some("One Size".to_string()),
        };
        d
    }

    fn read_back(bytes: Vec<u8>) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn listing_layout_merges_summary_and_detail() {
        let outcomes = vec![DetailOutcome::Fetched {
            summary: summary(),
            detail: detail(),
        }];
        let mut out = Vec::new();
        assert_eq!(write_outcomes(&mut out, &outcomes, ExportLayout::Listing).unwrap(), 1);

        let rows = read_back(out);
        assert_eq!(rows[0], LISTING_HEADERS);
        assert_eq!(
            rows[1],
            vec![
                "110001",
                "Red scarf",
                "19.5",
                "3",
                "P2DT3H",
                NOT_AVAILABLE,
                "<p>Soft, warm</p>",
                "https://i/1.jpg, https://i/2.jpg",
                NOT_AVAILABLE,
                "Pre-owned",
                "Red",
                "Acme",
                NOT_AVAILABLE,
                "One Size",
            ]
        );
    }

    #[test]
    fn unavailable_detail_keeps_summary_columns() {
        let outcomes = vec![DetailOutcome::Unavailable {
            summary: summary(),
            reason: "timeout".to_string(),
        }];
        let row = listing_row(outcomes[0].summary(), None);
        assert_eq!(row.len(), LISTING_HEADERS.len());
        assert_eq!(&row[..3], ["110001", "Red scarf", "19.5"]);
        assert!(row[6..].iter().all(|v| v == NOT_AVAILABLE));

        let mut out = Vec::new();
        assert_eq!(write_outcomes(&mut out, &outcomes, ExportLayout::Detail).unwrap(), 0);
        assert_eq!(read_back(out).len(), 1);
    }

    #[test]
    fn detail_layout_has_every_field() {
        let row = detail_row(&detail());
        assert_eq!(row.len(), DETAIL_HEADERS.len());
        assert_eq!(row[2], "19.5");
        assert_eq!(row[3], "USD");
        assert_eq!(row[8], NOT_AVAILABLE);
        assert_eq!(row[16], "https://i/1.jpg, https://i/2.jpg");
    }

    #[tokio::test]
    async fn dump_writes_one_json_file_per_detail() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            DetailOutcome::Fetched {
                summary: summary(),
                detail: detail(),
            },
            DetailOutcome::Unavailable {
                summary: ListingSummary::new("2"),
                reason: "gone".to_string(),
            },
        ];

        assert_eq!(dump_details(dir.path(), &outcomes).await.unwrap(), 1);
        let json = std::fs::read_to_string(dir.path().join("110001.json")).unwrap();
        let parsed: ListingDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.item_id, "110001");
        assert_eq!(parsed.attributes.brand.as_deref(), Some("Acme"));
        assert!(!dir.path().join("2.json").exists());
    }

    #[test]
    fn dump_names_only_accept_plain_ids() {
        assert_eq!(dump_file_name("110001").as_deref(), Some("110001.json"));
        assert_eq!(dump_file_name("../etc/passwd"), None);
        assert_eq!(dump_file_name("a/b"), None);
        assert_eq!(dump_file_name(".."), None);
        assert_eq!(dump_file_name(""), None);
    }

    #[tokio::test]
    async fn dump_skips_ids_that_would_leave_the_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("dump");
        let outcomes = vec![
            DetailOutcome::Fetched {
                summary: ListingSummary::new("../escape"),
                detail: ListingDetail::new("../escape"),
            },
            DetailOutcome::Fetched {
                summary: summary(),
                detail: detail(),
            },
        ];

        assert_eq!(dump_details(&dir, &outcomes).await.unwrap(), 1);
        assert!(!root.path().join("escape.json").exists());
        assert!(dir.join("110001.json").exists());
    }
}
