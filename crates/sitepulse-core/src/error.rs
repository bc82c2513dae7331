use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A report `date` dimension that is not a valid `YYYYMMDD` calendar day.
    #[error("invalid report date: {0:?}")]
    InvalidDate(String),

    /// The report does not have the dimension/metric layout that was requested.
    /// Rows are paired positionally, so any drift here would silently
    /// misassign fields.
    #[error("report schema mismatch: {0}")]
    ReportSchema(String),
}
