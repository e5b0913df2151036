//! Parser for one-line-per-file status output such as `git diff --name-status`.

use super::DiffParseError;
use super::record::DiffRecord;
use tracing::debug;

/// Parses `<status>\t<path>` lines into sparse [`DiffRecord`]s.
///
/// Only the paths and the new/deleted flags are filled in: `A` marks a new
/// file, `D` a deleted one, and every other status leaves both flags unset.
/// Blank lines are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickDiffParser;

impl QuickDiffParser {
    /// Create a quick-format parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse every non-blank line of `text`, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`DiffParseError::MalformedHeader`] for a line without a tab,
    /// or with an empty status or path.
    pub fn parse<B>(&self, text: &str) -> Result<Vec<DiffRecord<B>>, DiffParseError> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(idx, line)| parse_line(idx + 1, line))
            .collect()
    }
}

fn parse_line<B>(line_number: usize, line: &str) -> Result<DiffRecord<B>, DiffParseError> {
    let malformed = || DiffParseError::MalformedHeader {
        line: line_number,
        content: line.to_string(),
    };

    let (status, rest) = line.split_once('\t').ok_or_else(malformed)?;
    let path = rest.split('\t').next().unwrap_or_default();
    if status.is_empty() || path.is_empty() {
        return Err(malformed());
    }

    let record = DiffRecord::builder(path, path)
        .new_file(status == "A")
        .deleted_file(status == "D")
        .build();
    debug!(path, status, "parsed quick diff record");
    Ok(record)
}
