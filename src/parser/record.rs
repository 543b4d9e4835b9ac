use crate::parser::fields::RawFieldTable;
use crate::table::{CodeLabel, DetailRecord, ExampleField, Examples, Level};

const DESCRIPTION_MARKER: &str = "説明";
const EXAMPLE_LABEL: &str = "事例";
const UNSUITABLE_EXAMPLE_LABEL: &str = "不適合事例";
const EXAMPLE_SEPARATOR: char = '；';

/// Project a page's raw fields into the record for `level`.
pub fn project(raw: &RawFieldTable, level: Level) -> DetailRecord {
    let mut record = DetailRecord::default();

    for ancestor in Level::ALL {
        if let Some(value) = raw.get(ancestor.field_label()) {
            if let Some(pair) = split_code_label(value) {
                record.set_ancestor(ancestor, pair);
            }
        }
    }

    for (label, value) in raw.iter() {
        if label.contains(DESCRIPTION_MARKER) {
            record.description = Some(normalize_description(value));
        }
    }

    if level == Level::Detail {
        record.examples = Some(Examples {
            example: split_examples(raw.get(EXAMPLE_LABEL)),
            unsuitable_example: split_examples(raw.get(UNSUITABLE_EXAMPLE_LABEL)),
        });
    }

    record
}

/// "<code> <label> ..." → code and label. Tokens past the second are ignored.
pub fn split_code_label(value: &str) -> Option<CodeLabel> {
    let mut tokens = value.split_whitespace();
    let code = tokens.next()?.to_string();
    let label = tokens.next().unwrap_or_default().to_string();
    Some(CodeLabel { code, label })
}

/// Strip full-width spaces, ASCII spaces and the "総説" heading.
pub fn normalize_description(value: &str) -> String {
    value.replace('\u{3000}', "").replace(' ', "").replace("総説", "")
}

/// Split on '；' and wrap the list in a one-element sequence.
pub fn split_examples(value: Option<&str>) -> ExampleField {
    value.map(|v| vec![v.split(EXAMPLE_SEPARATOR).map(str::to_string).collect()])
}
