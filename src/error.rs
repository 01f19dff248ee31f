use thiserror::Error;

use crate::wire::WireType;

pub type Result<T> = std::result::Result<T, Error>;

/// Decode-side failures. Encoding cannot fail: the output buffer grows as
/// needed and every representable value has an encoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Header shorter than five bytes, a schema length that overruns the
    /// document, or body bytes left over after every instruction ran.
    #[error("invalid document: {0}")]
    InvalidDocument(&'static str),

    /// A trusted-mode document arrived whose hash has no cached
    /// instruction list.
    #[error("no cached instruction list for schema hash {0}")]
    SchemaNotFound(u32),

    /// The sender's wire type for a field the receiver decodes differs
    /// from what the receiver compiled for.
    #[error("schema mismatch on field `{field}`: expected {expected}, found {found}")]
    SchemaMismatch {
        field: String,
        expected: WireType,
        found: WireType,
    },

    /// A length-prefixed read would overrun the input, or a length varint
    /// exceeds a configured cap.
    #[error("{what}: length {len} exceeds limit {max}")]
    BoundsExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// Internal-consistency failure, e.g. an unknown wire-type byte in the
    /// schema or a varint with too many continuation bytes.
    #[error("malformed document: {0}")]
    Malformed(String),
}

impl Error {
    pub(crate) fn mismatch(expected: WireType, found: WireType) -> Error {
        Error::SchemaMismatch {
            field: String::new(),
            expected,
            found,
        }
    }

    /// Attaches the field name to a mismatch raised while compiling that
    /// field's instruction. Inner (element-level) mismatches keep the
    /// outermost field name.
    pub(crate) fn named(self, name: &str) -> Error {
        match self {
            Error::SchemaMismatch {
                field,
                expected,
                found,
            } if field.is_empty() => Error::SchemaMismatch {
                field: name.to_string(),
                expected,
                found,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_naming() {
        let e = Error::mismatch(WireType::STRING, WireType::INT64).named("title");
        match e {
            Error::SchemaMismatch { field, .. } => assert_eq!(field, "title"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_named_keeps_existing_field() {
        let e = Error::mismatch(WireType::BOOL, WireType::INT)
            .named("inner")
            .named("outer");
        match e {
            Error::SchemaMismatch { field, .. } => assert_eq!(field, "inner"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let e = Error::BoundsExceeded {
            what: "string",
            len: 600,
            max: 512,
        };
        assert_eq!(e.to_string(), "string: length 600 exceeds limit 512");
    }
}
