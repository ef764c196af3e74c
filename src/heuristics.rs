//! Attribute resolution for listings.
//!
//! Item specifics are authoritative. When a listing has no structured color or
//! size, we guess one from the title and then the description text. The guess
//! is a keyword scan, not a parser: it can miss values and it can pick up a
//! color word that describes something other than the item.

use crate::models::{Attributes, ItemSpecifics};
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

const COLOR_NAMES: &[&str] = &["Color", "Colour", "Main Colour", "Main Color"];
const SIZE_NAMES: &[&str] = &["Size", "US Shoe Size"];

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(black|white|red|blue|green|yellow|orange|purple|pink|brown|gr[ae]y|beige|navy|silver|gold|multicolou?r|tan|cream|khaki|maroon|olive|teal|turquoise|ivory|burgundy)\b",
    )
    .expect("color pattern is valid")
});

/// "Size: M", "size 10.5", "Size XL"
static SIZE_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsize\s*:?\s*(\d{1,3}(?:\.\d)?|[2-5]?X{0,3}[SML])\b")
        .expect("size phrase pattern is valid")
});

/// Upper-case letter sizes standing on their own
static LETTER_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(/,])(XXS|XS|S|M|L|XL|XXL|XXXL|[2-5]XL)(?:$|[\s)/,.])")
        .expect("letter size pattern is valid")
});

/// Resolve colors, brand, model and size for one listing
pub fn resolve_attributes(
    specifics: &ItemSpecifics,
    title: Option<&str>,
    description_html: Option<&str>,
) -> Attributes {
    let description = description_html.map(visible_text);
    let texts: Vec<&str> = title.into_iter().chain(description.as_deref()).collect();

    let colors = specifics
        .first_of(COLOR_NAMES)
        .or_else(|| texts.iter().find_map(|text| guess_colors(text)));

    let size = specifics
        .first_of(SIZE_NAMES)
        .or_else(|| specifics.starting_with("Size"))
        .or_else(|| texts.iter().find_map(|text| guess_size(text)));

    Attributes {
        colors,
        brand: specifics.first_of(&["Brand"]),
        model: specifics.first_of(&["Model"]),
        size,
    }
}

/// Distinct color words in order of first appearance, comma separated
pub fn guess_colors(text: &str) -> Option<String> {
    let mut found: Vec<String> = Vec::new();
    for m in COLOR_RE.find_iter(text) {
        let color = capitalize(m.as_str());
        if !found.contains(&color) {
            found.push(color);
        }
    }
    if found.is_empty() {
        None
    } else {
        Some(found.join(", "))
    }
}

pub fn guess_size(text: &str) -> Option<String> {
    if let Some(caps) = SIZE_PHRASE_RE.captures(text) {
        return Some(caps[1].to_uppercase());
    }
    LETTER_SIZE_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Text content of an HTML fragment, whitespace collapsed
pub fn visible_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
