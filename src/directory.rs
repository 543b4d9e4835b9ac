use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::table::CodeDirectory;

static DIVISION_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static MAJOR_GROUP_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static CODE_ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"li[style="list-style-type:none"]"#).unwrap());

/// Group codes are exactly three characters on the listing page; anything else is a detail code.
const GROUP_CODE_LEN: usize = 3;

/// Fetch the listing page and return the codes of every level.
pub async fn fetch_code_directory(fetcher: &impl PageFetcher, url: &str) -> Result<CodeDirectory> {
    info!("Fetching JSIC code listing: {}", url);
    let html = fetcher.fetch(url).await?;
    let dir = parse_directory(&html);
    info!(
        "Codes found: {} divisions, {} major groups, {} groups, {} details",
        dir.division.len(),
        dir.major_group.len(),
        dir.group.len(),
        dir.detail.len()
    );
    Ok(dir)
}

/// Parse the listing page. Missing headings or items give empty lists, never an error.
pub fn parse_directory(html: &str) -> CodeDirectory {
    let doc = Html::parse_document(html);

    let division = doc.select(&DIVISION_SEL).filter_map(heading_code).collect();
    let major_group = doc.select(&MAJOR_GROUP_SEL).filter_map(heading_code).collect();

    let mut group = Vec::new();
    let mut detail = Vec::new();
    for item in doc.select(&CODE_ITEM_SEL) {
        let text = element_text(item);
        let Some(code) = text.split_whitespace().next() else {
            continue;
        };
        if is_group_code(code) {
            group.push(code.to_string());
        } else {
            detail.push(code.to_string());
        }
    }

    CodeDirectory {
        division,
        major_group,
        group,
        detail,
    }
}

/// Headings read "<marker> <code> <title>"; the code is the second token.
fn heading_code(el: ElementRef) -> Option<String> {
    let text = element_text(el);
    let code = text.split_whitespace().nth(1).map(str::to_string);
    if code.is_none() {
        debug!("Skipping heading without code: {:?}", text);
    }
    code
}

fn is_group_code(token: &str) -> bool {
    token.chars().count() == GROUP_CODE_LEN
}

pub(crate) fn element_text(el: ElementRef) -> String {
    el.text().collect()
}
