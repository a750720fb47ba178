//! Keyset ("cursor") and offset pagination over the query-builder AST.
//!
//! The cursor engine encodes page boundaries as opaque tokens, builds the
//! composite tie-break predicate for keyset traversal, and knows the
//! deferred-join trick for offset pagination over wide selects. Query
//! construction, dialect rendering and execution live in the
//! `query-builder` crate; this crate only drives its combinators and the
//! `QueryExecutor` seam.

pub mod codec;
pub mod cursor;
pub mod error;
pub mod fields;
pub mod keyset;
pub mod offset;
pub mod offset_cursor;
pub mod page;

pub use codec::{CursorCodec, DefaultCodec, ParseCursor, RawStrings};
pub use cursor::CursorPagination;
pub use error::PaginateError;
pub use fields::{BoundField, SortExpr, SortField};
pub use offset::OffsetPagination;
pub use offset_cursor::OffsetCursorPagination;
pub use page::{CursorPage, OffsetPage};
