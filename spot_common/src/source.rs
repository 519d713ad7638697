//! Where a quote comes from and how to find it on the page.
//!
//! A `Locator` is a pair of markers: an anchor (usually an attribute fragment such as
//! `data-qa-id="symbol-last-value"`) and the closing tag of the element it sits in.
//! The text between the end of the anchoring tag and the closing marker, stripped of
//! nested tags, is the raw value text. Matching of markers is ASCII case-insensitive.

use serde::{Deserialize, Serialize};

/// Marker pair locating the value text inside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub anchor: String,
    pub close: String,
}

impl Locator {
    pub fn new(anchor: &str, close: &str) -> Self {
        Self {
            anchor: anchor.to_string(),
            close: close.to_string(),
        }
    }

    /// Text content of the first element matched by this locator that holds a digit.
    pub fn find(&self, page: &str) -> Option<String> {
        let lower = page.to_ascii_lowercase();
        let anchor = self.anchor.to_ascii_lowercase();
        let close = self.close.to_ascii_lowercase();
        let mut from = 0;

        while let Some(rel) = lower.get(from..)?.find(&anchor) {
            let hit = from + rel;
            let open_end = hit + lower[hit..].find('>')? + 1;
            let end = open_end + lower[open_end..].find(&close)?;
            let text = strip_tags(&page[open_end..end]);
            if text.chars().any(|c| c.is_ascii_digit()) {
                return Some(text);
            }
            // An empty anchor matches everywhere; always move past at least one char.
            let next_char = lower[hit..].chars().next().map_or(1, char::len_utf8);
            from = hit + anchor.len().max(next_char);
        }
        None
    }
}

/// URL plus locators tried in order; the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub url: String,
    pub locators: Vec<Locator>,
}

impl SourceDescriptor {
    pub fn locate(&self, page: &str) -> Option<String> {
        self.locators.iter().find_map(|locator| locator.find(page))
    }
}

/// Remove markup and collapse whitespace.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    let out = out.replace("&nbsp;", " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
