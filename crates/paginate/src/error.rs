use query_builder::exec::ExecError;
use thiserror::Error;

/// Everything that can go wrong while paginating.
///
/// Cursor errors are client errors: a malformed or replayed-against-the-
/// wrong-field-list cursor is the caller's input problem, and is reported
/// precisely enough to map onto a 4xx. Nothing here is retried or logged
/// away internally.
#[derive(Debug, Error)]
pub enum PaginateError {
    /// The cursor string is not valid base64url or not valid form data.
    #[error("unparsable cursor")]
    UnparsableCursor,

    /// The cursor carries a different number of fields than the sort-field
    /// list it is being replayed against.
    #[error("cursor field count mismatch: expected {expected}, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },

    /// The cursor's field at some position does not match the expected key.
    /// Field order is significant: a cursor is only valid against the exact
    /// field ordering it was generated for.
    #[error("cursor field name mismatch at position {position}: expected `{expected}`, got `{actual}`")]
    FieldNameMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    /// The default codec was asked to encode a value kind it does not
    /// serialize. Deliberate fail-fast instead of a lossy fallback.
    #[error("unsupported cursor value type: {0}")]
    UnsupportedCursorValueType(&'static str),

    /// A decoded cursor field could not be coerced to its typed value.
    #[error("invalid cursor value for `{key}`: {reason}")]
    InvalidCursorValue { key: String, reason: String },

    /// Offset pagination called with a page below 1 (pages are 1-based).
    #[error("invalid page number: {0}")]
    InvalidPageNumber(u64),

    /// Predicate recursion referenced a field index beyond the list.
    /// Internal invariant violation; unreachable for matched-length inputs.
    #[error("unknown cursor field at index {0}")]
    UnknownCursorField(usize),

    /// Cursor pagination requires at least one sort field.
    #[error("at least one sort field is required")]
    EmptyFieldList,

    /// Two sort fields resolved to the same cursor key.
    #[error("duplicate sort key: `{0}`")]
    DuplicateSortKey(String),

    /// The executor failed; passed through unchanged.
    #[error(transparent)]
    Execute(#[from] ExecError),
}
