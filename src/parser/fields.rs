use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::directory::element_text;

static HEADER_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static DATA_CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Label → text pairs scraped from one detail page, in first-seen label order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFieldTable {
    entries: Vec<(String, String)>,
}

impl RawFieldTable {
    /// A repeated label keeps its original position and takes the new value.
    pub fn insert(&mut self, label: String, value: String) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pair the i-th `<th>` with the i-th `<td>` across the whole page.
/// Unpaired cells on either side are dropped.
pub fn parse_fields(html: &str) -> RawFieldTable {
    let doc = Html::parse_document(html);
    let headers = doc.select(&HEADER_CELL_SEL).map(element_text);
    let values = doc.select(&DATA_CELL_SEL).map(element_text);

    let mut table = RawFieldTable::default();
    for (label, value) in headers.zip(values) {
        table.insert(label, value);
    }
    table
}
