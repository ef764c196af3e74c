//! Translate the raw listing export into the marketplace inventory layout.

use crate::jobs::{JobError, Table, ITEM_ID};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub const TARGET_HEADERS: [&str; 14] = [
    "sku",
    "title",
    "description",
    "standard_price",
    "quantity",
    "main_image",
    "other_images",
    "condition_type",
    "attributes",
    "brand",
    "model",
    "size",
    "external_product_id",
    "external_product_id_type",
];

pub const MAX_TITLE_CHARS: usize = 200;

/// Tags dropped from descriptions; anything else is left as is
const STRIPPED_TAGS: [&str; 5] = ["<p>", "</p>", "<br>", "<br/>", "<br />"];

const IMAGE_SEPARATOR: &str = ", ";

const CONDITIONS: [(&str, &str); 4] = [
    ("New with tags", "New"),
    ("New without tags", "New"),
    ("New", "New"),
    ("Pre-owned", "Used - Good"),
];

pub const DEFAULT_CONDITION: &str = "Used - Good";

/// Column positions in the source export
struct Source {
    item_id: usize,
    title: usize,
    description: usize,
    price: usize,
    quantity: usize,
    images: usize,
    condition: usize,
    colors: usize,
    brand: usize,
    model: usize,
    size: usize,
}

impl Source {
    fn locate(table: &Table) -> Result<Self, JobError> {
        Ok(Self {
            item_id: table.require_column(ITEM_ID)?,
            title: table.require_column("Title")?,
            description: table.require_column("Description")?,
            price: table.require_column("Current Price")?,
            quantity: table.require_column("Quantity")?,
            images: table.require_column("Image URLs")?,
            condition: table.require_column("Condition")?,
            colors: table.require_column("Colors")?,
            brand: table.require_column("Brand")?,
            model: table.require_column("Model")?,
            size: table.require_column("Size")?,
        })
    }
}

pub fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

pub fn clean_description(description: &str) -> String {
    STRIPPED_TAGS
        .iter()
        .fold(description.to_string(), |text, tag| text.replace(tag, ""))
        .trim()
        .to_string()
}

/// Fixed two decimal places; `None` when the text is not a number
pub fn format_price(price: &str) -> Option<String> {
    let value: f64 = price.trim().parse().ok()?;
    value.is_finite().then(|| format!("{:.2}", value))
}

/// First URL and the rest, rejoined with the same separator
pub fn split_images(urls: &str) -> (String, String) {
    let mut parts = urls.split(IMAGE_SEPARATOR);
    let main = parts.next().unwrap_or_default().to_string();
    let others = parts.collect::<Vec<_>>().join(IMAGE_SEPARATOR);
    (main, others)
}

pub fn map_condition(label: &str) -> &'static str {
    CONDITIONS
        .iter()
        .find(|(from, _)| *from == label)
        .map(|(_, to)| *to)
        .unwrap_or(DEFAULT_CONDITION)
}

fn color_attributes(colors: &str) -> String {
    serde_json::json!({ "color": colors }).to_string()
}

/// Map every row; the first unparseable price or quantity aborts the job
pub fn map_listings(table: &Table) -> Result<Table, JobError> {
    let src = Source::locate(table)?;
    let mut out = Table::new(
        table.name.clone(),
        TARGET_HEADERS.iter().map(|h| h.to_string()).collect(),
    );

    for (index, row) in table.rows.iter().enumerate() {
        // 1-based, counting the header line
        let line = index + 2;
        let field = |i: usize| row.get(i).map(String::as_str).unwrap_or_default();

        let price = format_price(field(src.price)).ok_or_else(|| JobError::InvalidNumber {
            row: line,
            column: "Current Price".to_string(),
            value: field(src.price).to_string(),
        })?;
        let quantity: i64 = field(src.quantity)
            .trim()
            .parse()
            .map_err(|_| JobError::InvalidNumber {
                row: line,
                column: "Quantity".to_string(),
                value: field(src.quantity).to_string(),
            })?;
        let (main_image, other_images) = split_images(field(src.images));

        out.rows.push(vec![
            field(src.item_id).to_string(),
            truncate_title(field(src.title)),
            clean_description(field(src.description)),
            price,
            quantity.to_string(),
            main_image,
            other_images,
            map_condition(field(src.condition)).to_string(),
            color_attributes(field(src.colors)),
            field(src.brand).to_string(),
            field(src.model).to_string(),
            field(src.size).to_string(),
            String::new(),
            String::new(),
        ]);
    }

    Ok(out)
}

pub fn run(input: &Path, output: &Path) -> Result<()> {
    let table = Table::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mapped = map_listings(&table)?;
    mapped
        .to_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        rows_in = table.rows.len(),
        rows_out = mapped.rows.len(),
        "Mapped listings written to {}",
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Item ID,Title,Current Price,Quantity,Time Left,Watch Count,Description,Image URLs,Category,Condition,Colors,Brand,Model,Size";

    fn table(rows: &[&str]) -> Table {
        let csv = std::iter::once(HEADER)
            .chain(rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        Table::read("filtered.csv", csv.as_bytes()).unwrap()
    }

    #[test]
    fn maps_a_full_row() {
        let input = table(&[
            r#"110001,Red scarf,19.5,3,P2DT3H,7,"<p>Soft scarf</p>  ","https://i/1.jpg, https://i/2.jpg, https://i/3.jpg",Scarves,New with tags,Red,Acme,S1,One Size"#,
        ]);

        let out = map_listings(&input).unwrap();

        assert_eq!(out.headers, TARGET_HEADERS);
        assert_eq!(
            out.rows[0],
            vec![
                "110001",
                "Red scarf",
                "Soft scarf",
                "19.50",
                "3",
                "https://i/1.jpg",
                "https://i/2.jpg, https://i/3.jpg",
                "New",
                r#"{"color":"Red"}"#,
                "Acme",
                "S1",
                "One Size",
                "",
                "",
            ]
        );
    }

    #[test]
    fn price_always_has_two_decimals() {
        assert_eq!(format_price("19.5").as_deref(), Some("19.50"));
        assert_eq!(format_price("20").as_deref(), Some("20.00"));
        assert_eq!(format_price("0").as_deref(), Some("0.00"));
        assert_eq!(format_price("3.14159").as_deref(), Some("3.14"));
        assert_eq!(format_price(" 1234.999 ").as_deref(), Some("1235.00"));
        assert_eq!(format_price("not available"), None);
        assert_eq!(format_price("NaN"), None);
    }

    #[test]
    fn title_is_cut_by_characters() {
        let long = "é".repeat(250);
        let cut = truncate_title(&long);
        assert_eq!(cut.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(truncate_title("short"), "short");
    }

    #[test]
    fn only_the_fixed_tags_are_stripped() {
        assert_eq!(
            clean_description("  <p>One<br/>two</p><p>three <b>bold</b></p> "),
            "Onetwothree <b>bold</b>"
        );
    }

    #[test]
    fn single_image_has_no_others() {
        assert_eq!(split_images("https://i/1.jpg"), ("https://i/1.jpg".to_string(), String::new()));
        assert_eq!(split_images(""), (String::new(), String::new()));
    }

    #[test]
    fn unknown_condition_falls_back() {
        assert_eq!(map_condition("New without tags"), "New");
        assert_eq!(map_condition("Pre-owned"), "Used - Good");
        assert_eq!(map_condition("For parts or not working"), DEFAULT_CONDITION);
        assert_eq!(map_condition("not available"), DEFAULT_CONDITION);
    }

    #[test]
    fn bad_price_stops_the_job_at_that_row() {
        let input = table(&[
            "1,A,10,1,,,,u,,New,,,,",
            "2,B,not available,1,,,,u,,New,,,,",
        ]);

        let err = map_listings(&input).unwrap_err();
        assert!(matches!(
            err,
            JobError::InvalidNumber { row: 3, ref column, ref value } if column == "Current Price" && value == "not available"
        ));
    }

    #[test]
    fn bad_quantity_is_fatal() {
        let input = table(&["1,A,10,lots,,,,u,,New,,,,"]);
        assert!(matches!(
            map_listings(&input),
            Err(JobError::InvalidNumber { ref column, .. }) if column == "Quantity"
        ));
    }

    #[test]
    fn missing_source_column_is_reported() {
        let input = Table::read("x.csv", "Item ID,Title\n1,A\n".as_bytes()).unwrap();
        assert!(matches!(
            map_listings(&input),
            Err(JobError::MissingColumn { ref column, .. }) if column == "Description"
        ));
    }

    #[test]
    fn run_maps_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("filtered.csv");
        let output = dir.path().join("inventory.csv");
        std::fs::write(&input, format!("{}\n1,A,10,2,,,<p>x</p>,u,,New,,,,\n", HEADER)).unwrap();

        run(&input, &output).unwrap();

        let written = Table::from_path(&output).unwrap();
        assert_eq!(written.headers, TARGET_HEADERS);
        assert_eq!(written.rows.len(), 1);
        assert_eq!(written.rows[0][3], "10.00");
        assert_eq!(written.rows[0][2], "x");
    }
}
