//! Schedule ingestion errors.

use super::time::TimeError;

/// Errors raised while loading the transit graph.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The schedule file could not be opened or read
    #[error("failed to read schedule: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV layer rejected the input
    #[error("malformed schedule CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A time column could not be parsed
    #[error("bad time in record {index}: {source}")]
    Time {
        index: i64,
        #[source]
        source: TimeError,
    },

    /// A record is structurally valid CSV but semantically wrong
    #[error("bad schedule record {index}: {reason}")]
    Record { index: i64, reason: &'static str },

    /// No usable records were found
    #[error("schedule contains no usable records")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::time::parse_time_value;

    #[test]
    fn error_display() {
        let source = parse_time_value("8").unwrap_err();
        let err = DataError::Time { index: 4, source };
        assert_eq!(
            err.to_string(),
            "bad time in record 4: invalid time: expected H:MM:SS format"
        );

        let err = DataError::Record {
            index: 7,
            reason: "stop name is empty",
        };
        assert_eq!(err.to_string(), "bad schedule record 7: stop name is empty");

        assert_eq!(
            DataError::Empty.to_string(),
            "schedule contains no usable records"
        );
    }
}
