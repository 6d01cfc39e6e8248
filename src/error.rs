use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported variable: {0}")]
    UnsupportedVariable(String),

    #[error("inconsistent grid for {variable}: {reason}")]
    InconsistentGrid { variable: String, reason: String },

    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error(
        "site ({latitude}, {longitude}) is {distance_km:.1} km from the nearest grid cell (max {max_km:.1} km)"
    )]
    SiteOutsideGrid {
        latitude: f64,
        longitude: f64,
        distance_km: f64,
        max_km: f64,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
