//! Error taxonomy for the timing core.
//!
//! Store, config and controller code stays on `anyhow::Result`; anything a user
//! can trigger through an import or a bad segment id surfaces as a
//! [`DebateError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    /// Imported data is structurally valid JSON but not acceptable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// File content is not parseable JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An operation named a segment the current format does not define.
    #[error("unknown segment '{0}'")]
    UnknownSegment(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type DebateResult<T> = Result<T, DebateError>;

impl DebateError {
    pub fn validation(reason: impl Into<String>) -> Self {
        DebateError::Validation(reason.into())
    }

    /// Single message suitable for showing to the person who picked the file.
    pub fn user_message(&self) -> String {
        match self {
            DebateError::Validation(reason) => format!("Could not load file: {reason}."),
            DebateError::Parse(_) => {
                "Could not load file. Please make sure it is a valid debate timer JSON file."
                    .to_string()
            }
            DebateError::UnknownSegment(id) => format!("No timer named '{id}' in this format."),
            DebateError::Storage(_) => "Saved data could not be written.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_converts_to_parse() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DebateError = err.into();
        assert!(matches!(err, DebateError::Parse(_)));
        assert!(err.user_message().contains("valid debate timer"));
    }

    #[test]
    fn validation_message_carries_reason() {
        let err = DebateError::validation("missing field 'teams'");
        assert!(err.to_string().contains("teams"));
        assert!(err.user_message().contains("teams"));
    }

    #[test]
    fn storage_is_transparent() {
        let err: DebateError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.to_string(), "disk full");
    }
}
