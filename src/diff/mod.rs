pub mod full;
mod header;
pub mod quick;
pub mod record;

pub use full::FullDiffParser;
pub use quick::QuickDiffParser;
pub use record::{ChangeKind, DiffRecord, DiffRecordBuilder};

use crate::blob::BlobError;
use error_set::error_set;

error_set! {
    /// Errors from parsing diff text. Any error aborts the whole parse.
    DiffParseError := {
        /// A header line is missing where required, or does not have the expected shape
        #[display("Malformed diff header at line {line}: '{content}'")]
        MalformedHeader { line: usize, content: String },
        /// A block that is not a pure mode change has no `index` line
        #[display("Missing index line for '{path}' at line {line}")]
        MissingIndexLine { path: String, line: usize },
        /// The blob resolver rejected an id
        UnresolvableBlob(BlobError),
    }
}
