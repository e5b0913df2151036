//! Structured records from `git diff` text.
//!
//! Two independent parsers turn diff output into ordered [`DiffRecord`]s:
//!
//! - [`FullDiffParser`] reads verbose `diff --git` output, including modes,
//!   renames, blob ids and patch bodies.
//! - [`QuickDiffParser`] reads `<status>\t<path>` summaries and fills in only
//!   paths and the new/deleted flags.
//!
//! Neither parser runs git or touches the filesystem. Blob ids from `index`
//! lines go through a caller-supplied [`BlobResolver`]; [`LazyResolver`]
//! simply wraps each id.
//!
//! # Examples
//!
//! ```
//! use git_diff_records::{parse_full, parse_quick};
//!
//! let full = parse_full(
//!     "diff --git a/a.txt b/b.txt
//! similarity index 90%
//! rename from a.txt
//! rename to b.txt
//! index 1111111111111111111111111111111111111111..2222222222222222222222222222222222222222 100644
//! ",
//! )
//! .unwrap();
//! assert!(full[0].is_renamed());
//! assert_eq!(full[0].similarity_index(), 90);
//! assert_eq!(full[0].to_string(), "R090\ta.txt\tb.txt");
//!
//! let quick = parse_quick("A\tnew.txt\nD\told.txt\n").unwrap();
//! assert!(quick[0].is_new());
//! assert!(quick[1].is_deleted());
//! ```

pub mod blob;
pub mod diff;

pub use blob::{Blob, BlobError, BlobResolver, LazyResolver, ObjectId};
pub use diff::{
    ChangeKind, DiffParseError, DiffRecord, DiffRecordBuilder, FullDiffParser, QuickDiffParser,
};

/// Parse verbose diff text, identifying blobs with [`LazyResolver`].
pub fn parse_full(text: &str) -> Result<Vec<DiffRecord>, DiffParseError> {
    FullDiffParser::new(&LazyResolver).parse(text)
}

/// Parse `<status>\t<path>` text.
pub fn parse_quick(text: &str) -> Result<Vec<DiffRecord>, DiffParseError> {
    QuickDiffParser::new().parse(text)
}
