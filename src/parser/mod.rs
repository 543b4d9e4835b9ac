pub mod fields;
pub mod record;

use tracing::debug;

use crate::table::{DetailRecord, Level};

/// Two passes: page → raw label/value fields → record for `level`.
pub fn process_page(html: &str, level: Level) -> DetailRecord {
    let raw = fields::parse_fields(html);
    if raw.is_empty() {
        debug!("No label/value cells on page");
    } else {
        debug!("{} label/value pairs on page", raw.len());
    }
    record::project(&raw, level)
}
