//! Per-field query errors

use thiserror::Error;

use crate::database::DbStatus;

/// Failure of a single query against a device handle
///
/// These errors are local to one field of one [`DeviceRecord`](crate::DeviceRecord)
/// and never abort enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The driver reported zero size. It uses zero for both "no data" and
    /// "error", and the two cannot be told apart at this layer.
    #[error("driver returned no data")]
    Empty,
    /// The database query returned a nonzero status code
    #[error("driver status {0}")]
    Provider(u32),
    /// The fill call reported a different size than the probe
    #[error("size changed between probe ({probed}) and fill ({filled})")]
    Resized { probed: u32, filled: u32 },
    /// Text field was not valid UTF-8
    #[error("text is not valid UTF-8")]
    InvalidText,
}

impl QueryError {
    /// Database status for a `Provider` error, when the code is a known one
    pub fn status(&self) -> Option<DbStatus> {
        match self {
            Self::Provider(code) => DbStatus::from_code(*code),
            _ => None,
        }
    }

    /// Raw driver code for a `Provider` error
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Provider(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_status() {
        let err = QueryError::Provider(4);
        assert_eq!(err.status(), Some(DbStatus::SerialMismatch));
        assert_eq!(err.code(), Some(4));

        // Unknown codes are kept as-is
        let err = QueryError::Provider(42);
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), Some(42));
    }

    #[test]
    fn test_empty_has_no_code() {
        assert_eq!(QueryError::Empty.code(), None);
        assert_eq!(QueryError::Empty.to_string(), "driver returned no data");
    }
}
