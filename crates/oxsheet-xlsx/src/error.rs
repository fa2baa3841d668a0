//! XLSX error types

use oxsheet_core::ErrorKind;
use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed XML in a part
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Well-formed XML with content that cannot be used
    #[error("Parse error in {part}: {message}")]
    Parse { part: String, message: String },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] oxsheet_core::Error),
}

impl XlsxError {
    pub(crate) fn xml<P: Into<String>>(part: P, source: quick_xml::Error) -> Self {
        XlsxError::Xml {
            part: part.into(),
            source,
        }
    }

    pub(crate) fn parse<P: Into<String>, M: Into<String>>(part: P, message: M) -> Self {
        XlsxError::Parse {
            part: part.into(),
            message: message.into(),
        }
    }

    /// Map onto the document model's error taxonomy
    ///
    /// Container and XML failures are I/O errors; model errors raised while
    /// building or saving keep their own kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxError::Core(e) => e.kind(),
            _ => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_delegates_to_core() {
        let err: XlsxError = oxsheet_core::Error::InvalidSheetName("a/b".into()).into();
        assert_eq!(err.kind(), ErrorKind::Format);

        let err = XlsxError::MissingPart("xl/workbook.xml".into());
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_parse_error_names_part() {
        let err = XlsxError::parse("xl/styles.xml", "bad fontId");
        assert_eq!(err.to_string(), "Parse error in xl/styles.xml: bad fontId");
    }
}
