use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, ScrapeError};

/// The four JSIC levels, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Division,
    MajorGroup,
    Group,
    Detail,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Division, Level::MajorGroup, Level::Group, Level::Detail];

    pub fn name(self) -> &'static str {
        match self {
            Level::Division => "division",
            Level::MajorGroup => "major_group",
            Level::Group => "group",
            Level::Detail => "detail",
        }
    }

    /// Header label used for this level on the detail pages.
    pub fn field_label(self) -> &'static str {
        match self {
            Level::Division => "大分類",
            Level::MajorGroup => "中分類",
            Level::Group => "小分類",
            Level::Detail => "細分類",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| {
                ScrapeError::InvalidArgument(format!(
                    "'classification' must be either 'division', 'major_group', 'group', or 'detail', got '{}'",
                    s
                ))
            })
    }
}

/// Codes per level, in listing-page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeDirectory {
    pub division: Vec<String>,
    pub major_group: Vec<String>,
    pub group: Vec<String>,
    pub detail: Vec<String>,
}

impl CodeDirectory {
    pub fn codes(&self, level: Level) -> &[String] {
        match level {
            Level::Division => &self.division,
            Level::MajorGroup => &self.major_group,
            Level::Group => &self.group,
            Level::Detail => &self.detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLabel {
    pub code: String,
    pub label: String,
}

/// One split example field. `Some(vec![items])`: the single wrapped element
/// is the list split on '；'.
pub type ExampleField = Option<Vec<Vec<String>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Examples {
    pub example: ExampleField,
    pub unsuitable_example: ExampleField,
}

/// One output row. Which slots are filled depends on what the page carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    /// Indexed by `Level`, coarsest first.
    pub ancestry: [Option<CodeLabel>; 4],
    pub description: Option<String>,
    /// Only filled for `Level::Detail`; both columns exist even when empty.
    pub examples: Option<Examples>,
}

impl DetailRecord {
    pub fn ancestor(&self, level: Level) -> Option<&CodeLabel> {
        self.ancestry[level.index()].as_ref()
    }

    pub fn set_ancestor(&mut self, level: Level, value: CodeLabel) {
        self.ancestry[level.index()] = Some(value);
    }

    fn columns(&self) -> Vec<Column> {
        let mut cols = Vec::new();
        for level in Level::ALL {
            if self.ancestor(level).is_some() {
                cols.push(Column::Code(level));
                cols.push(Column::Label(level));
            }
        }
        if self.description.is_some() {
            cols.push(Column::Description);
        }
        if self.examples.is_some() {
            cols.push(Column::Example);
            cols.push(Column::UnsuitableExample);
        }
        cols
    }

    fn cell(&self, col: Column) -> String {
        match col {
            Column::Code(l) => self.ancestor(l).map(|c| c.code.clone()).unwrap_or_default(),
            Column::Label(l) => self.ancestor(l).map(|c| c.label.clone()).unwrap_or_default(),
            Column::Description => self.description.clone().unwrap_or_default(),
            Column::Example => example_cell(self.examples.as_ref().and_then(|e| e.example.as_ref())),
            Column::UnsuitableExample => {
                example_cell(self.examples.as_ref().and_then(|e| e.unsuitable_example.as_ref()))
            }
        }
    }
}

/// The tabular step unpacks the one-element wrapper: its sole element is the cell,
/// written as a list literal, `['x', 'y']`.
fn example_cell(field: Option<&Vec<Vec<String>>>) -> String {
    field
        .and_then(|wrapped| wrapped.first())
        .map(|items| {
            let quoted: Vec<String> = items.iter().map(|s| quote_item(s)).collect();
            format!("[{}]", quoted.join(", "))
        })
        .unwrap_or_default()
}

/// Single quotes unless the text holds a single quote and no double quote.
fn quote_item(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Code(Level),
    Label(Level),
    Description,
    Example,
    UnsuitableExample,
}

impl Column {
    fn sort_key(self) -> (usize, usize) {
        match self {
            Column::Code(l) => (l.index(), 0),
            Column::Label(l) => (l.index(), 1),
            Column::Description => (4, 0),
            Column::Example => (5, 0),
            Column::UnsuitableExample => (6, 0),
        }
    }

    fn header(self, level: Level) -> String {
        match self {
            Column::Code(l) => format!("code_{}", l),
            Column::Label(l) => format!("label_{}", l),
            Column::Description => format!("description_{}", level),
            Column::Example => "example".to_string(),
            Column::UnsuitableExample => "unsuitable_example".to_string(),
        }
    }
}

/// All records of one level, row `i` belonging to the `i`-th directory code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationTable {
    pub level: Level,
    pub records: Vec<DetailRecord>,
}

impl ClassificationTable {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn columns(&self) -> Vec<Column> {
        let mut cols: Vec<Column> = self.records.iter().flat_map(|r| r.columns()).collect();
        cols.sort_by_key(|c| c.sort_key());
        cols.dedup();
        cols
    }

    /// Union of the fields present on any record, in canonical order (ancestry
    /// coarse to fine, description, examples) rather than first-seen order.
    pub fn headers(&self) -> Vec<String> {
        self.columns().into_iter().map(|c| c.header(self.level)).collect()
    }

    /// Header row plus one row per record, no index column.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let cols = self.columns();
        // No fields on any record: nothing to write, even when rows exist.
        if cols.is_empty() {
            return Ok(());
        }
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(cols.iter().map(|c| c.header(self.level)))?;
        for record in &self.records {
            writer.write_record(cols.iter().map(|c| record.cell(*c)))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        self.write_csv(file)
    }
}
