use std::path::PathBuf;
use std::time::Duration;

use crate::table::Level;

pub const DIRECTORY_URL: &str =
    "https://www.soumu.go.jp/toukei_toukatsu/index/seido/sangyo/02toukatsu01_03000044.html";
pub const DETAIL_URL_BASE: &str = "https://www.e-stat.go.jp/classifications/terms/10/03";

/// Delay before every detail-page request.
pub const DEFAULT_PACE: Duration = Duration::from_secs(2);
pub const DEFAULT_OUT_DIR: &str = "data";
pub const DEFAULT_LEVELS: &[Level] = &[Level::Division, Level::MajorGroup, Level::Detail];

#[derive(Debug, Clone)]
pub struct Config {
    pub directory_url: String,
    pub detail_url_base: String,
    pub pace: Duration,
    pub out_dir: PathBuf,
    pub levels: Vec<Level>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_url: DIRECTORY_URL.to_string(),
            detail_url_base: DETAIL_URL_BASE.to_string(),
            pace: DEFAULT_PACE,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl Config {
    pub fn detail_url(&self, code: &str) -> String {
        format!("{}/{}", self.detail_url_base.trim_end_matches('/'), code)
    }

    pub fn output_path(&self, level: Level) -> PathBuf {
        self.out_dir.join(format!("jsic_{}.csv", level.name()))
    }
}
