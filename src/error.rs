use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Classification level outside division / major_group / group / detail
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport failure or non-2xx response
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
