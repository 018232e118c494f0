//! Unified error handling for the corridor-survey library.
//!
//! Noisy field data never produces an error here: missing geometry, unscored
//! components and oversized sections degrade the output and are reported as
//! [`crate::pipeline::Diagnostic`]s instead. Errors are reserved for inputs
//! that cannot be read at all.

use std::fmt;

/// Unified error type for corridor-survey operations.
#[derive(Debug, Clone)]
pub enum SurveyError {
    /// The GPS track could not be parsed
    TrackParse { source: String, message: String },
    /// The GPS track path does not exist or holds no track files
    TrackNotFound { path: String },
    /// Filesystem error while reading an input
    Io { path: String, message: String },
    /// Frame input could not be decoded
    FrameParse { message: String },
    /// Configuration error
    Config { message: String },
    /// Intervention code not present in the catalogue
    UnknownIntervention { code: String },
    /// Generic internal error
    Internal { message: String },
}

impl fmt::Display for SurveyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyError::TrackParse { source, message } => {
                write!(f, "Track '{}' could not be parsed: {}", source, message)
            }
            SurveyError::TrackNotFound { path } => {
                write!(f, "No GPX track found at '{}'", path)
            }
            SurveyError::Io { path, message } => {
                write!(f, "I/O error reading '{}': {}", path, message)
            }
            SurveyError::FrameParse { message } => {
                write!(f, "Frame input could not be decoded: {}", message)
            }
            SurveyError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            SurveyError::UnknownIntervention { code } => {
                write!(
                    f,
                    "Unknown intervention code '{}'. Valid codes: {}",
                    code,
                    crate::intervention::InterventionCode::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            SurveyError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for SurveyError {}

/// Result type alias for corridor-survey operations.
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Extension trait for converting Option to SurveyError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an unknown intervention error.
    fn ok_or_unknown_intervention(self, code: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_intervention(self, code: &str) -> Result<T> {
        self.ok_or_else(|| SurveyError::UnknownIntervention {
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SurveyError::TrackParse {
            source: "trip.gpx".to_string(),
            message: "unexpected end of document".to_string(),
        };
        assert!(err.to_string().contains("trip.gpx"));
        assert!(err.to_string().contains("unexpected end"));
    }

    #[test]
    fn test_unknown_intervention_lists_codes() {
        let err = SurveyError::UnknownIntervention {
            code: "XYZ".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("XYZ"));
        assert!(msg.contains("DBST"));
        assert!(msg.contains("REHAB"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_unknown_intervention("FOO");
        assert!(matches!(
            result,
            Err(SurveyError::UnknownIntervention { .. })
        ));
        assert_eq!(Some(3).ok_or_unknown_intervention("RM").unwrap(), 3);
    }
}
