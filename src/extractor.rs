use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::directory::fetch_code_directory;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::parser;
use crate::table::{ClassificationTable, Level};

const PROGRESS_EVERY: usize = 10;

pub struct Extractor<'a, F: PageFetcher> {
    fetcher: &'a F,
    config: &'a Config,
}

impl<'a, F: PageFetcher> Extractor<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a Config) -> Self {
        Self { fetcher, config }
    }

    /// Validate `name` before any request, then extract that level.
    pub async fn extract_classification(&self, name: &str) -> Result<ClassificationTable> {
        let level: Level = name.parse()?;
        self.extract(level).await
    }

    /// Re-crawl the listing page, then fetch and parse one detail page per code.
    /// The first failed request aborts the whole level.
    pub async fn extract(&self, level: Level) -> Result<ClassificationTable> {
        let directory = fetch_code_directory(self.fetcher, &self.config.directory_url).await?;
        let codes = directory.codes(level);
        let total = codes.len();

        info!("Number of {}: {}", level, total);

        let pb = progress_bar(total);
        let mut table = ClassificationTable::new(level);

        for (count, code) in codes.iter().enumerate() {
            if (count + 1) % PROGRESS_EVERY == 0 {
                info!("Progress of extracting JSIC {}: {} / {}", level, count + 1, total);
            }

            pace(self.config.pace).await;
            let url = self.config.detail_url(code);
            let html = self.fetcher.fetch(&url).await?;
            table.records.push(parser::process_page(&html, level));
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(table)
    }
}

/// Applied before every detail request, the first one included.
async fn pace(interval: Duration) {
    tokio::time::sleep(interval).await;
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::fetch::fake::FakeFetcher;

    const LIST_URL: &str = "https://list.test/codes.html";
    const DETAIL_BASE: &str = "https://detail.test/terms/10/03";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn config(pace: Duration) -> Config {
        Config {
            directory_url: LIST_URL.to_string(),
            detail_url_base: DETAIL_BASE.to_string(),
            pace,
            ..Config::default()
        }
    }

    fn detail_page(field: &str, code: &str, label: &str) -> String {
        format!(
            "<html><body><table><tr><th>{}</th><td>{}　{}</td></tr>\
             <tr><th>説明</th><td>{} の説明</td></tr></table></body></html>",
            field, code, label, label
        )
    }

    /// Listing fixture plus one page per code, built from the fixture files where present.
    fn site() -> FakeFetcher {
        let mut f = FakeFetcher::default()
            .with_page(LIST_URL, fixture("listing"))
            .with_page(format!("{}/A", DETAIL_BASE), fixture("division_A"))
            .with_page(format!("{}/B", DETAIL_BASE), detail_page("大分類", "B", "漁業"))
            .with_page(format!("{}/0111", DETAIL_BASE), fixture("detail_0111"));
        for code in ["01", "02", "03"] {
            f = f.with_page(format!("{}/{}", DETAIL_BASE, code), detail_page("中分類", code, "業"));
        }
        for code in ["010", "011", "012", "021", "031"] {
            f = f.with_page(format!("{}/{}", DETAIL_BASE, code), detail_page("小分類", code, "業"));
        }
        for code in ["0112", "0121", "0211", "0311", "0312"] {
            f = f.with_page(format!("{}/{}", DETAIL_BASE, code), detail_page("細分類", code, "業"));
        }
        f
    }

    #[tokio::test]
    async fn rows_follow_directory_order() {
        let fetcher = site();
        let cfg = config(Duration::ZERO);
        let ex = Extractor::new(&fetcher, &cfg);

        for (name, expected) in [
            ("division", vec!["A", "B"]),
            ("major_group", vec!["01", "02", "03"]),
            ("group", vec!["010", "011", "012", "021", "031"]),
            ("detail", vec!["0111", "0112", "0121", "0211", "0311", "0312"]),
        ] {
            let table = ex.extract_classification(name).await.unwrap();
            let level: Level = name.parse().unwrap();
            let codes: Vec<&str> = table
                .records
                .iter()
                .map(|r| r.ancestor(level).unwrap().code.as_str())
                .collect();
            assert_eq!(table.len(), expected.len(), "{}", name);
            assert_eq!(codes, expected, "{}", name);
        }
    }

    #[tokio::test]
    async fn invalid_level_makes_no_requests() {
        let fetcher = site();
        let cfg = config(Duration::ZERO);
        let err = Extractor::new(&fetcher, &cfg)
            .extract_classification("industry")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidArgument(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn directory_is_crawled_on_every_call() {
        let fetcher = site();
        let cfg = config(Duration::ZERO);
        let ex = Extractor::new(&fetcher, &cfg);
        ex.extract(Level::Division).await.unwrap();
        ex.extract(Level::Division).await.unwrap();
        // listing + 2 divisions, twice
        assert_eq!(fetcher.calls(), 6);
        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(requested[0], LIST_URL);
        assert_eq!(requested[1], format!("{}/A", DETAIL_BASE));
    }

    #[tokio::test]
    async fn division_fixture_record() {
        let fetcher = site();
        let cfg = config(Duration::ZERO);
        let table = Extractor::new(&fetcher, &cfg).extract(Level::Division).await.unwrap();
        let a = &table.records[0];
        assert_eq!(a.ancestor(Level::Division).unwrap().label, "農業，林業");
        assert!(a.ancestor(Level::MajorGroup).is_none());
        let desc = a.description.as_deref().unwrap();
        assert!(desc.starts_with("この大分類には"));
        assert!(!desc.contains('　') && !desc.contains(' ') && !desc.contains("総説"));
        assert_eq!(
            table.headers(),
            vec!["code_division", "label_division", "description_division"]
        );
    }

    #[tokio::test]
    async fn detail_fixture_examples() {
        let fetcher = site();
        let cfg = config(Duration::ZERO);
        let table = Extractor::new(&fetcher, &cfg).extract(Level::Detail).await.unwrap();
        let first = &table.records[0];
        assert_eq!(first.ancestor(Level::Group).unwrap().code, "011");
        let ex = first.examples.as_ref().unwrap();
        assert_eq!(
            ex.example,
            Some(vec![vec!["水稲作農業".to_string(), "陸稲作農業".to_string(), "稲作請負業".to_string()]])
        );
        assert_eq!(ex.unsuitable_example, Some(vec![vec!["もち米加工業".to_string()]]));

        let second = table.records[1].examples.as_ref().unwrap();
        assert!(second.example.is_none());
        assert!(second.unsuitable_example.is_none());
    }

    #[tokio::test]
    async fn failed_detail_fetch_aborts_level() {
        let fetcher = FakeFetcher::default()
            .with_page(LIST_URL, fixture("listing"))
            .with_page(format!("{}/01", DETAIL_BASE), detail_page("中分類", "01", "農業"));
        let cfg = config(Duration::ZERO);
        let err = Extractor::new(&fetcher, &cfg)
            .extract(Level::MajorGroup)
            .await
            .unwrap_err();
        match err {
            ScrapeError::Network { url, .. } => assert_eq!(url, format!("{}/02", DETAIL_BASE)),
            other => panic!("unexpected error: {other}"),
        }
        // listing, 01, 02; 03 never requested
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_before_every_detail_fetch() {
        let fetcher = site();
        let cfg = config(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        let table = Extractor::new(&fetcher, &cfg).extract(Level::MajorGroup).await.unwrap();
        assert_eq!(table.len(), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
    }
}
