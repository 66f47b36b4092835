//! Per-document failure taxonomy.
//!
//! Each variant maps to one `FailureKind` stored on the record.

use thiserror::Error;

use crate::models::report::FailureKind;
use crate::pipeline::import::EncodeError;
use crate::pipeline::structuring::StructuringError;

#[derive(Error, Debug)]
pub enum DigitizeError {
    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    #[error("Extraction failed: {0}")]
    Extraction(StructuringError),

    #[error("Could not read model reply: {0}")]
    Parse(StructuringError),
}

impl DigitizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Encoding(_) => FailureKind::Encoding,
            Self::Extraction(_) => FailureKind::Extraction,
            Self::Parse(_) => FailureKind::Parse,
        }
    }
}

impl From<StructuringError> for DigitizeError {
    fn from(e: StructuringError) -> Self {
        if e.is_parse_failure() {
            Self::Parse(e)
        } else {
            Self::Extraction(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structuring_errors_split_by_stage() {
        let parse: DigitizeError = StructuringError::MalformedResponse("x".into()).into();
        assert_eq!(parse.kind(), FailureKind::Parse);

        let json: DigitizeError = StructuringError::JsonParsing("x".into()).into();
        assert_eq!(json.kind(), FailureKind::Parse);

        let remote: DigitizeError = StructuringError::Timeout(120).into();
        assert_eq!(remote.kind(), FailureKind::Extraction);
        assert!(remote.to_string().contains("120s"));
    }

    #[test]
    fn encode_errors_are_encoding_failures() {
        let err: DigitizeError = EncodeError::EmptyFile.into();
        assert_eq!(err.kind(), FailureKind::Encoding);
        assert_eq!(err.to_string(), "Encoding failed: File is empty");
    }
}
