//! Typed views over Trading API responses.
//!
//! Every lookup is namespace-qualified and returns `None` when the node is
//! missing, so a sparse listing still produces a record.

use crate::heuristics;
use crate::models::{ActivePage, ItemSpecifics, ListingDetail, ListingSummary, Price, Timestamp};
use crate::trading::request::NAMESPACE;
use crate::trading::error::ErrorEntry;
use crate::trading::ApiError;
use roxmltree::{Document, Node};
use tracing::{debug, warn};

/// First element named `name` below `node`, at any depth
fn find<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|n| n.has_tag_name((NAMESPACE, name)))
}

/// Follow a chain of direct children
fn path<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().try_fold(node, |current, name| {
        current
            .children()
            .find(|n| n.has_tag_name((NAMESPACE, *name)))
    })
}

fn text_of(node: Option<Node<'_, '_>>) -> Option<String> {
    node.and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn number_of(node: Option<Node<'_, '_>>) -> Option<u32> {
    text_of(node).and_then(|t| t.parse().ok())
}

fn parse_document(body: &str) -> Result<Document<'_>, ApiError> {
    Document::parse(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

fn error_entries(root: Node<'_, '_>) -> Vec<ErrorEntry> {
    root.children()
        .filter(|n| n.has_tag_name((NAMESPACE, "Errors")))
        .map(|errors| ErrorEntry {
            code: text_of(path(errors, &["ErrorCode"])).unwrap_or_default(),
            severity: text_of(path(errors, &["SeverityCode"])).unwrap_or_default(),
            short_message: text_of(path(errors, &["ShortMessage"])).unwrap_or_default(),
            long_message: text_of(path(errors, &["LongMessage"])).unwrap_or_default(),
        })
        .collect()
}

/// Turn `Ack=Failure` into an error; log warnings and carry on otherwise
fn check_ack(root: Node<'_, '_>) -> Result<(), ApiError> {
    let ack = text_of(path(root, &["Ack"])).unwrap_or_default();
    let entries = error_entries(root);

    match ack.as_str() {
        "Failure" | "PartialFailure" => {
            if entries.is_empty() {
                return Err(ApiError::api("", format!("Ack {}", ack), ""));
            }
            Err(ApiError::from_entries(entries))
        }
        _ => {
            for entry in &entries {
                warn!(code = %entry.code, "API warning: {}", entry.long_message);
            }
            Ok(())
        }
    }
}

/// Parse a GetMyeBaySelling response into one page of summaries
pub fn parse_active_page(body: &str) -> Result<ActivePage, ApiError> {
    let doc = parse_document(body)?;
    let root = doc.root_element();
    check_ack(root)?;

    let Some(active_list) = path(root, &["ActiveList"]) else {
        debug!("Response has no ActiveList");
        return Ok(ActivePage::default());
    };

    let total_pages = number_of(path(active_list, &["PaginationResult", "TotalNumberOfPages"]));

    let mut items = Vec::new();
    if let Some(array) = path(active_list, &["ItemArray"]) {
        for item in array.children().filter(|n| n.has_tag_name((NAMESPACE, "Item"))) {
            match parse_summary(item) {
                Some(summary) => items.push(summary),
                None => warn!("Skipping active list entry without ItemID"),
            }
        }
    }

    Ok(ActivePage { items, total_pages })
}

fn parse_summary(item: Node<'_, '_>) -> Option<ListingSummary> {
    let mut summary = ListingSummary::new(text_of(path(item, &["ItemID"]))?);
    summary.title = text_of(path(item, &["Title"]));
    summary.current_price = text_of(path(item, &["SellingStatus", "CurrentPrice"]));
    summary.quantity = number_of(path(item, &["QuantityAvailable"]))
        .or_else(|| number_of(path(item, &["Quantity"])));
    summary.time_left = text_of(path(item, &["TimeLeft"]));
    summary.watch_count = number_of(path(item, &["WatchCount"]));
    Some(summary)
}

/// Parse a GetItem response into a detail record
pub fn parse_item_detail(body: &str) -> Result<ListingDetail, ApiError> {
    let doc = parse_document(body)?;
    let root = doc.root_element();
    check_ack(root)?;

    let item = path(root, &["Item"])
        .ok_or_else(|| ApiError::Malformed("GetItem response has no Item".to_string()))?;
    let item_id = text_of(path(item, &["ItemID"]))
        .ok_or_else(|| ApiError::Malformed("Item has no ItemID".to_string()))?;

    let mut detail = ListingDetail::new(item_id);
    detail.title = text_of(path(item, &["Title"]));
    detail.price = find(item, "CurrentPrice").and_then(|node| {
        text_of(Some(node)).map(|value| Price {
            value,
            currency: node.attribute("currencyID").map(str::to_string),
        })
    });
    detail.category = text_of(path(item, &["PrimaryCategory", "CategoryName"]));
    detail.condition = text_of(path(item, &["ConditionDisplayName"]));
    detail.quantity = number_of(path(item, &["Quantity"]));
    detail.listing_type = text_of(path(item, &["ListingType"]));
    detail.start_time = text_of(find(item, "StartTime")).map(|t| Timestamp::parse(&t));
    detail.end_time = text_of(find(item, "EndTime")).map(|t| Timestamp::parse(&t));
    detail.location = text_of(path(item, &["Location"]));
    detail.seller = text_of(path(item, &["Seller", "UserID"]));
    detail.watch_count = number_of(path(item, &["WatchCount"]));
    detail.hit_count = number_of(path(item, &["HitCount"]));
    detail.shipping_cost = text_of(path(item, &["ShippingCostSummary", "ShippingServiceCost"]))
        .or_else(|| text_of(find(item, "ShippingServiceCost")));
    detail.returns_accepted = text_of(path(item, &["ReturnPolicy", "ReturnsAcceptedOption"]));
    detail.picture_urls = item
        .descendants()
        .filter(|n| n.has_tag_name((NAMESPACE, "PictureURL")))
        .filter_map(|n| text_of(Some(n)))
        .collect();
    detail.description = text_of(path(item, &["Description"]));
    detail.item_specifics = parse_item_specifics(item);
    detail.attributes = heuristics::resolve_attributes(
        &detail.item_specifics,
        detail.title.as_deref(),
        detail.description.as_deref(),
    );

    Ok(detail)
}

fn parse_item_specifics(item: Node<'_, '_>) -> ItemSpecifics {
    let Some(specifics) = path(item, &["ItemSpecifics"]) else {
        return ItemSpecifics::default();
    };
    ItemSpecifics(
        specifics
            .children()
            .filter(|n| n.has_tag_name((NAMESPACE, "NameValueList")))
            .filter_map(|pair| {
                let name = text_of(path(pair, &["Name"]))?;
                let values = pair
                    .children()
                    .filter(|n| n.has_tag_name((NAMESPACE, "Value")))
                    .filter_map(|n| text_of(Some(n)))
                    .collect();
                Some((name, values))
            })
            .collect(),
    )
}
