//! Error types for the advisor report core.

use std::{error::Error, fmt, io};

/// Error type for aggregation and report generation.
#[derive(Debug)]
pub enum ReportError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A record carried an impact outside `High`, `Medium`, `Low`.
    MalformedRecord {
        /// Identifier of the offending record.
        id: String,
        /// The unexpected impact value.
        impact: String,
    },
    /// A category label cannot be used as a worksheet name.
    InvalidSheetName {
        /// The rejected label.
        name: String,
        /// Why the label was rejected.
        reason: String,
    },
    /// The workbook could not be built or written.
    Render(String),
    /// The recommendation source could not be read.
    Source(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::MalformedRecord { id, impact } => {
                write!(f, "malformed record {id}: unexpected impact '{impact}'")
            }
            Self::InvalidSheetName { name, reason } => {
                write!(f, "invalid sheet name '{name}': {reason}")
            }
            Self::Render(message) => write!(f, "render error: {message}"),
            Self::Source(message) => write!(f, "source error: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::Render(value.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Source(format!("invalid recommendation json: {value}"))
    }
}

/// Convenience result type for the advisor report core.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::ReportError;
    use std::io;

    #[test]
    fn io_error_formats_message() {
        let error = ReportError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
    }

    #[test]
    fn malformed_record_names_id_and_value() {
        let error = ReportError::MalformedRecord {
            id: "/subscriptions/abc".to_string(),
            impact: "Critical".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/subscriptions/abc"));
        assert!(message.contains("Critical"));
    }

    #[test]
    fn invalid_sheet_name_formats_reason() {
        let error = ReportError::InvalidSheetName {
            name: "a/b".to_string(),
            reason: "contains '/'".to_string(),
        };
        assert_eq!(error.to_string(), "invalid sheet name 'a/b': contains '/'");
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: ReportError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            ReportError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io variant, got {other:?}"),
        }
    }

    #[test]
    fn from_json_error_maps_to_source() {
        let err = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        let error: ReportError = err.into();
        assert!(matches!(error, ReportError::Source(_)));
    }
}
