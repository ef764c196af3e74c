//! Request bodies for the Trading API calls we make.

pub const NAMESPACE: &str = "urn:ebay:apis:eBLBaseComponents";

/// Operation name, sent in the `X-EBAY-API-CALL-NAME` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallName {
    GetMyeBaySelling,
    GetItem,
}

impl CallName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallName::GetMyeBaySelling => "GetMyeBaySelling",
            CallName::GetItem => "GetItem",
        }
    }
}

/// Active list page, sorted by time left
pub fn active_list_body(page_number: u32, entries_per_page: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<GetMyeBaySellingRequest xmlns="{NAMESPACE}">
  <ErrorLanguage>en_US</ErrorLanguage>
  <WarningLevel>High</WarningLevel>
  <DetailLevel>ReturnAll</DetailLevel>
  <ActiveList>
    <Sort>TimeLeft</Sort>
    <Pagination>
      <EntriesPerPage>{entries_per_page}</EntriesPerPage>
      <PageNumber>{page_number}</PageNumber>
    </Pagination>
  </ActiveList>
</GetMyeBaySellingRequest>"#
    )
}

pub fn get_item_body(item_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<GetItemRequest xmlns="{NAMESPACE}">
  <ErrorLanguage>en_US</ErrorLanguage>
  <WarningLevel>High</WarningLevel>
  <DetailLevel>ReturnAll</DetailLevel>
  <IncludeItemSpecifics>true</IncludeItemSpecifics>
  <ItemID>{}</ItemID>
</GetItemRequest>"#,
        escape(item_id)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
