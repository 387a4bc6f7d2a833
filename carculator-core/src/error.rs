use thiserror::Error;

/// Failure kinds raised while reading or validating scenario data.
///
/// Functions in this crate return `anyhow::Result`; the root cause of a failure is one of these
/// variants whenever the input itself is at fault, so callers can branch on it with
/// `err.downcast_ref::<CarculatorError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarculatorError {
    #[error("Could not locate {0}")]
    FileNotFound(String),
    #[error("The fleet {domain} list differs from {expected}")]
    ScopeMismatch { domain: String, expected: String },
    #[error("Unknown IAM model {0:?}")]
    UnknownModel(String),
    #[error("Region {region:?} not found in IAM table, available regions: {available:?}")]
    RegionNotFound {
        region: String,
        available: Vec<String>,
    },
    #[error("Malformed table: {0}")]
    MalformedTable(String),
    #[error("Total electricity generation is zero in {year}, shares cannot be normalized")]
    ZeroTotal { year: u32 },
}

impl CarculatorError {
    pub(crate) fn scope_mismatch<T: std::fmt::Debug>(domain: &str, expected: &[T]) -> Self {
        Self::ScopeMismatch {
            domain: domain.into(),
            expected: format!("{expected:?}"),
        }
    }
}
