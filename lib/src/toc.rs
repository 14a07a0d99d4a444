use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::util::unescape_html;

/// An identified heading as found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    /// `#` followed by the heading's id.
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TocItem>,
}

/// The nested outline of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOfContents {
    pub items: Vec<TocItem>,
}

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<h([1-6])\b[^>]*?\sid="([^"]*)"[^>]*>(.*?)</h[1-6]\s*>"#)
        .expect("heading regex is valid")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

impl TocItem {
    fn new(heading: Heading) -> Self {
        TocItem { url: format!("#{}", heading.id), title: heading.text, items: vec![] }
    }

    /// The heading id this item links to.
    pub fn id(&self) -> &str {
        self.url.strip_prefix('#').unwrap_or(&self.url)
    }
}

impl TableOfContents {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Depth-first iterator over every item with its depth, starting at `0`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TocItem)> + '_ {
        let mut stack: Vec<(usize, &TocItem)> = self.items.iter().rev().map(|i| (0, i)).collect();
        std::iter::from_fn(move || {
            let (depth, item) = stack.pop()?;
            stack.extend(item.items.iter().rev().map(|i| (depth + 1, i)));
            Some((depth, item))
        })
    }
}

/// Finds every heading with a non-empty `id` in `html`, in document order.
pub fn headings(html: &str) -> impl Iterator<Item = Heading> + '_ {
    HEADING.captures_iter(html).filter_map(|caps| {
        let id = caps.get(2)?.as_str();
        if id.is_empty() {
            return None;
        }

        let level = caps.get(1)?.as_str().parse().ok()?;
        let inner = TAG.replace_all(caps.get(3)?.as_str(), "");
        let text = unescape_html(&inner).trim().to_string();
        Some(Heading { id: unescape_html(id), text, level })
    })
}

/// Rebuilds the nested outline of the headings in `html`.
///
/// A heading becomes a child of the nearest preceding heading with a
/// strictly smaller level. Open frames with a level at or above the incoming
/// heading's are closed, attaching each to the frame below it, before the
/// heading is pushed.
pub fn extract_toc(html: &str) -> TableOfContents {
    let mut roots = vec![];
    let mut frames: Vec<(usize, TocItem)> = vec![];

    fn close(frames: &mut Vec<(usize, TocItem)>, roots: &mut Vec<TocItem>) {
        if let Some((_, item)) = frames.pop() {
            match frames.last_mut() {
                Some((_, parent)) => parent.items.push(item),
                None => roots.push(item),
            }
        }
    }

    for heading in headings(html) {
        while frames.last().map_or(false, |(level, _)| *level >= heading.level) {
            close(&mut frames, &mut roots);
        }

        frames.push((heading.level, TocItem::new(heading)));
    }

    while !frames.is_empty() {
        close(&mut frames, &mut roots);
    }

    TableOfContents { items: roots }
}
