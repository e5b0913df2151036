//! Parser for verbose `git diff` output.
//!
//! Each `diff --git` block carries a variable number of extended header
//! lines before its hunks:
//!
//! ```text
//! diff --git a/<path> b/<path>
//! [old mode <mode>
//!  new mode <mode>]
//! [new file mode <mode> | deleted file mode <mode> | similarity index <N>%
//!                                                     rename from <path>
//!                                                     rename to <path>]
//! index <hash>..<hash>[ <mode>]
//! <patch body>
//! ```
//!
//! The parser walks the lines with a cursor and decides how many header lines
//! to consume by looking at the next one. A block made of only the path line
//! and a mode pair, directly followed by the next block or the end of input,
//! has no `index` line at all.
//!
//! # Examples
//!
//! ```
//! use git_diff_records::{FullDiffParser, LazyResolver};
//!
//! let text = "diff --git a/foo.txt b/foo.txt
//! index 0000000000000000000000000000000000000000..1111111111111111111111111111111111111111 100644
//! @@ -0,0 +1 @@
//! +hello
//! ";
//! let records = FullDiffParser::new(&LazyResolver).parse(text).unwrap();
//! assert_eq!(records.len(), 1);
//! assert!(records[0].is_new());
//! assert_eq!(records[0].patch_body(), Some("@@ -0,0 +1 @@\n+hello"));
//! ```

use super::DiffParseError;
use super::header::{self, IndexLine, LineMatch, Marker};
use super::record::DiffRecord;
use crate::blob::{BlobResolver, ObjectId};
use tracing::{debug, trace};

/// Where the parser is within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectModePair,
    ExpectIndexOrEarlyExit,
    ExpectChangeTypeMarker,
    ExpectIndex,
    CollectBody,
    Emit,
}

/// Header fields gathered for the block being parsed.
#[derive(Debug)]
struct PendingBlock<'t> {
    path_before: &'t str,
    path_after: &'t str,
    mode_before: Option<&'t str>,
    mode_after: Option<&'t str>,
    has_mode_pair: bool,
    marker: Option<Marker<'t>>,
    index: Option<IndexLine<'t>>,
    body: Vec<&'t str>,
}

/// Line cursor over the input. Trailing blank lines are dropped up front.
struct Cursor<'t> {
    lines: Vec<&'t str>,
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(text: &'t str) -> Self {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&'t str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'t str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// 1-based number of the line `peek` would return.
    fn line_number(&self) -> usize {
        self.pos + 1
    }

    fn malformed(&self) -> DiffParseError {
        DiffParseError::MalformedHeader {
            line: self.line_number(),
            content: self.peek().unwrap_or_default().to_string(),
        }
    }
}

/// Parses verbose diff text into one [`DiffRecord`] per `diff --git` block.
#[derive(Debug, Clone, Copy)]
pub struct FullDiffParser<'r, R> {
    resolver: &'r R,
}

impl<'r, R: BlobResolver> FullDiffParser<'r, R> {
    /// Create a parser that resolves blob ids through `resolver`.
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Parse every block in `text`, in input order.
    ///
    /// # Errors
    ///
    /// Returns the first [`DiffParseError`] hit; no partial result is kept.
    pub fn parse(&self, text: &str) -> Result<Vec<DiffRecord<R::Handle>>, DiffParseError> {
        let mut cursor = Cursor::new(text);
        let mut records = Vec::new();

        while !cursor.is_exhausted() {
            let record = self.parse_block(&mut cursor)?;
            debug!(
                path_before = record.path_before(),
                path_after = record.path_after(),
                kind = ?record.kind(),
                "parsed diff record"
            );
            records.push(record);
        }

        Ok(records)
    }

    fn parse_block<'t>(
        &self,
        cursor: &mut Cursor<'t>,
    ) -> Result<DiffRecord<R::Handle>, DiffParseError> {
        let mut block = expect_header(cursor)?;
        let mut state = State::ExpectModePair;

        loop {
            trace!(?state, line = cursor.line_number(), "diff parser state");
            state = match state {
                State::ExpectModePair => {
                    if cursor.peek().is_some_and(|line| line.starts_with("old mode")) {
                        expect_mode_pair(cursor, &mut block)?;
                    }
                    State::ExpectIndexOrEarlyExit
                }
                State::ExpectIndexOrEarlyExit => {
                    if cursor
                        .peek()
                        .is_none_or(|line| line.starts_with("diff --git"))
                    {
                        trace!(path = block.path_after, "block without index line");
                        State::Emit
                    } else {
                        State::ExpectChangeTypeMarker
                    }
                }
                State::ExpectChangeTypeMarker => {
                    expect_marker(cursor, &mut block)?;
                    State::ExpectIndex
                }
                State::ExpectIndex => {
                    expect_index(cursor, &mut block)?;
                    State::CollectBody
                }
                State::CollectBody => {
                    while let Some(line) = cursor
                        .peek()
                        .filter(|line| !header::starts_block(line))
                    {
                        block.body.push(line);
                        cursor.advance();
                    }
                    State::Emit
                }
                State::Emit => return self.finish(block),
            };
        }
    }

    fn finish(&self, block: PendingBlock<'_>) -> Result<DiffRecord<R::Handle>, DiffParseError> {
        let mut builder = DiffRecord::builder(block.path_before, block.path_after)
            .mode_before(block.mode_before)
            .mode_after(block.mode_after);

        match block.marker {
            Some(Marker::NewFile { .. }) => builder = builder.new_file(true),
            Some(Marker::DeletedFile { .. }) => builder = builder.deleted_file(true),
            Some(Marker::Similarity { percent }) => builder = builder.renamed(percent),
            None => {}
        }

        if let Some(index) = &block.index {
            builder = builder.content(self.resolve(&index.before)?, self.resolve(&index.after)?);
        }

        let body = (!block.body.is_empty()).then(|| block.body.join("\n"));
        Ok(builder.patch_body(body).build())
    }

    fn resolve(&self, id: &ObjectId) -> Result<Option<R::Handle>, DiffParseError> {
        if id.is_null() {
            return Ok(None);
        }
        Ok(Some(self.resolver.resolve(id)?))
    }
}

fn expect_header<'t>(cursor: &mut Cursor<'t>) -> Result<PendingBlock<'t>, DiffParseError> {
    let LineMatch::Matched((path_before, path_after)) =
        cursor.peek().map_or(LineMatch::Other, header::diff_git)
    else {
        return Err(cursor.malformed());
    };
    cursor.advance();

    Ok(PendingBlock {
        path_before,
        path_after,
        mode_before: None,
        mode_after: None,
        has_mode_pair: false,
        marker: None,
        index: None,
        body: Vec::new(),
    })
}

fn expect_mode_pair<'t>(
    cursor: &mut Cursor<'t>,
    block: &mut PendingBlock<'t>,
) -> Result<(), DiffParseError> {
    let LineMatch::Matched(old) = cursor.peek().map_or(LineMatch::Other, header::old_mode) else {
        return Err(cursor.malformed());
    };
    cursor.advance();

    let LineMatch::Matched(new) = cursor.peek().map_or(LineMatch::Other, header::new_mode) else {
        return Err(cursor.malformed());
    };
    cursor.advance();

    block.mode_before = Some(old);
    block.mode_after = Some(new);
    block.has_mode_pair = true;
    Ok(())
}

fn expect_marker<'t>(
    cursor: &mut Cursor<'t>,
    block: &mut PendingBlock<'t>,
) -> Result<(), DiffParseError> {
    let marker = match cursor.peek().map_or(LineMatch::Other, header::marker) {
        LineMatch::Matched(marker) => marker,
        LineMatch::Other => return Ok(()),
        LineMatch::Malformed => return Err(cursor.malformed()),
    };
    cursor.advance();

    match marker {
        Marker::NewFile { mode } => {
            block.mode_before = None;
            block.mode_after = Some(mode);
        }
        Marker::DeletedFile { mode } => {
            block.mode_before = Some(mode);
            block.mode_after = None;
        }
        Marker::Similarity { .. } => {
            // `rename from` / `rename to`
            cursor.advance();
            cursor.advance();
        }
    }

    block.marker = Some(marker);
    Ok(())
}

fn expect_index<'t>(
    cursor: &mut Cursor<'t>,
    block: &mut PendingBlock<'t>,
) -> Result<(), DiffParseError> {
    match cursor.peek().map_or(LineMatch::Other, header::index) {
        LineMatch::Matched(index) => {
            cursor.advance();
            if let Some(mode) = index.mode {
                block.mode_after = Some(mode);
            }
            block.index = Some(index);
            Ok(())
        }
        // Mode pair followed by lines other than an index: keep them as the body.
        LineMatch::Other if block.has_mode_pair && block.marker.is_none() => Ok(()),
        LineMatch::Other => Err(DiffParseError::MissingIndexLine {
            path: block.path_after.to_string(),
            line: cursor.line_number(),
        }),
        LineMatch::Malformed => Err(cursor.malformed()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::blob::{Blob, BlobError, LazyResolver};
    use similar_asserts::assert_eq;

    const ZERO: &str = "0000000000000000000000000000000000000000";
    const ONES: &str = "1111111111111111111111111111111111111111";
    const TWOS: &str = "2222222222222222222222222222222222222222";

    fn parse(text: &str) -> Result<Vec<DiffRecord>, DiffParseError> {
        FullDiffParser::new(&LazyResolver).parse(text)
    }

    fn blob_id(blob: Option<&Blob>) -> Option<&str> {
        blob.map(|b| b.id().as_str())
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n").unwrap().is_empty());
    }

    #[test]
    fn trailing_blank_lines_are_tolerated() {
        assert!(parse("  \n\t\n").unwrap().is_empty());

        let text = format!(
            "diff --git a/x b/x\nindex {ONES}..{TWOS}\n@@ -1,2 +1,2 @@\n \n-a\n+b\n  \n\t\n"
        );
        let records = parse(&text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patch_body(), Some("@@ -1,2 +1,2 @@\n \n-a\n+b"));
    }

    #[test]
    fn new_file_from_null_hash() {
        let text = format!(
            "diff --git a/foo.txt b/foo.txt\nindex {ZERO}..{ONES} 100644\n@@ -0,0 +1 @@\n+hello\n"
        );
        let records = parse(&text).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.path_before(), "foo.txt");
        assert_eq!(record.path_after(), "foo.txt");
        assert_eq!(record.blob_before(), None);
        assert_eq!(blob_id(record.blob_after()), Some(ONES));
        assert!(record.is_new());
        assert!(!record.is_deleted());
        assert_eq!(record.mode_after(), Some("100644"));
        assert_eq!(record.patch_body(), Some("@@ -0,0 +1 @@\n+hello"));
    }

    #[test]
    fn explicit_new_file_marker() {
        let text = format!(
            "diff --git a/new.rs b/new.rs\nnew file mode 100644\nindex {ZERO}..{ONES}\n--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1 @@\n+fn main() {{}}\n"
        );
        let record = &parse(&text).unwrap()[0];
        assert!(record.is_new());
        assert!(!record.is_deleted());
        assert_eq!(record.mode_before(), None);
        assert_eq!(record.mode_after(), Some("100644"));
        assert_eq!(
            record.patch_body(),
            Some("--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1 @@\n+fn main() {}")
        );
    }

    #[test]
    fn deleted_file_marker() {
        let text = format!(
            "diff --git a/old.rs b/old.rs\ndeleted file mode 100755\nindex {ONES}..{ZERO}\n--- a/old.rs\n+++ /dev/null\n@@ -1 +0,0 @@\n-gone\n"
        );
        let record = &parse(&text).unwrap()[0];
        assert!(record.is_deleted());
        assert!(!record.is_new());
        assert_eq!(record.mode_before(), Some("100755"));
        assert_eq!(record.mode_after(), None);
        assert_eq!(blob_id(record.blob_before()), Some(ONES));
        assert_eq!(record.blob_after(), None);
    }

    #[test]
    fn rename_with_similarity() {
        let text = format!(
            "diff --git a/a.txt b/b.txt\nsimilarity index 90%\nrename from a.txt\nrename to b.txt\nindex {ONES}..{TWOS} 100644\n--- a/a.txt\n+++ b/b.txt\n@@ -1 +1 @@\n-x\n+y\n"
        );
        let record = &parse(&text).unwrap()[0];
        assert!(record.is_renamed());
        assert_eq!(record.similarity_index(), 90);
        assert_eq!(record.path_before(), "a.txt");
        assert_eq!(record.path_after(), "b.txt");
        assert!(!record.is_new());
        assert!(!record.is_deleted());
    }

    #[test]
    fn rename_lines_are_not_validated() {
        let text =
            format!("diff --git a/a b/b\nsimilarity index 50%\nanything\ngoes\nindex {ONES}..{TWOS}\n");
        let record = &parse(&text).unwrap()[0];
        assert!(record.is_renamed());
        assert_eq!(record.patch_body(), None);
    }

    #[test]
    fn mode_change_with_content() {
        let text = format!(
            "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\nindex {ONES}..{TWOS}\n--- a/run.sh\n+++ b/run.sh\n@@ -1 +1 @@\n-a\n+b\n"
        );
        let record = &parse(&text).unwrap()[0];
        assert_eq!(record.mode_before(), Some("100644"));
        assert_eq!(record.mode_after(), Some("100755"));
        assert!(!record.is_new());
        assert!(!record.is_deleted());
    }

    #[test]
    fn index_mode_overrides_mode_after() {
        let text = format!("diff --git a/x b/x\nindex {ONES}..{TWOS}   100755  \n@@ -1 +1 @@\n-a\n+b\n");
        let record = &parse(&text).unwrap()[0];
        assert_eq!(record.mode_before(), None);
        assert_eq!(record.mode_after(), Some("100755"));
    }

    #[test]
    fn mode_only_block_followed_by_next_block() {
        let text = format!(
            "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\ndiff --git a/lib.rs b/lib.rs\nindex {ONES}..{TWOS} 100644\n@@ -1 +1 @@\n-a\n+b\n"
        );
        let records = parse(&text).unwrap();
        assert_eq!(records.len(), 2);

        let mode_only = &records[0];
        assert_eq!(mode_only.path_after(), "run.sh");
        assert_eq!(mode_only.blob_before(), None);
        assert_eq!(mode_only.blob_after(), None);
        assert!(!mode_only.is_new());
        assert!(!mode_only.is_deleted());
        assert_eq!(mode_only.mode_before(), Some("100644"));
        assert_eq!(mode_only.mode_after(), Some("100755"));
        assert_eq!(mode_only.patch_body(), None);
        assert_eq!(mode_only.kind(), crate::ChangeKind::ModeChanged);

        assert_eq!(records[1].path_after(), "lib.rs");
        assert_eq!(records[1].patch_body(), Some("@@ -1 +1 @@\n-a\n+b"));
    }

    #[test]
    fn mode_only_block_at_end_of_input() {
        let text = "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n";
        let records = parse(text).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_new());
        assert!(!records[0].is_deleted());
    }

    #[test]
    fn header_only_block_at_end_of_input() {
        let records = parse("diff --git a/x b/x\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].blob_before(), None);
        assert!(!records[0].is_new());
    }

    #[test]
    fn mode_pair_followed_by_stray_lines_keeps_them_as_body() {
        let text = "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\nBinary files differ\n";
        let record = &parse(text).unwrap()[0];
        assert_eq!(record.blob_before(), None);
        assert!(!record.is_new());
        assert_eq!(record.patch_body(), Some("Binary files differ"));
    }

    #[test]
    fn body_stops_at_any_diff_line() {
        let text = format!(
            "diff --git a/x b/x\nindex {ONES}..{TWOS}\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/y b/y\nindex {ONES}..{TWOS}\n"
        );
        let records = parse(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].patch_body(), Some("@@ -1 +1 @@\n-a\n+b"));
        assert_eq!(records[1].patch_body(), None);
    }

    #[test]
    fn same_file_twice_gives_two_records() {
        let block = format!("diff --git a/x b/x\nindex {ONES}..{TWOS}\n@@ -1 +1 @@\n-a\n+b\n");
        let records = parse(&format!("{block}{block}")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
    }

    #[test]
    fn crlf_input() {
        let text = format!("diff --git a/x b/x\r\nindex {ONES}..{TWOS}\r\n@@ -1 +1 @@\r\n-a\r\n+b\r\n");
        let record = &parse(&text).unwrap()[0];
        assert_eq!(record.patch_body(), Some("@@ -1 +1 @@\n-a\n+b"));
    }

    #[test]
    fn missing_header_is_malformed() {
        let err = parse("index abc..def\n").unwrap_err();
        assert!(matches!(
            err,
            DiffParseError::MalformedHeader { line: 1, ref content } if content == "index abc..def"
        ));
    }

    #[test]
    fn leading_garbage_is_malformed() {
        let err = parse(&format!("\ndiff --git a/x b/x\nindex {ONES}..{TWOS}\n")).unwrap_err();
        assert!(matches!(err, DiffParseError::MalformedHeader { line: 1, .. }));
    }

    #[test]
    fn missing_index_line() {
        let err = parse("diff --git a/x b/x\n--- a/x\n+++ b/x\n").unwrap_err();
        assert!(matches!(
            err,
            DiffParseError::MissingIndexLine { ref path, line: 2 } if path == "x"
        ));
    }

    #[test]
    fn missing_index_after_rename() {
        let err = parse("diff --git a/a b/b\nsimilarity index 100%\nrename from a\nrename to b\n")
            .unwrap_err();
        assert!(matches!(err, DiffParseError::MissingIndexLine { line: 5, .. }));
    }

    #[test]
    fn missing_index_after_new_file_marker() {
        let err = parse("diff --git a/x b/x\nnew file mode 100644\n@@ -0,0 +1 @@\n").unwrap_err();
        assert!(matches!(err, DiffParseError::MissingIndexLine { line: 3, .. }));
    }

    #[test]
    fn non_numeric_similarity_is_malformed() {
        let err = parse(&format!(
            "diff --git a/a b/b\nsimilarity index ninety%\nrename from a\nrename to b\nindex {ONES}..{TWOS}\n"
        ))
        .unwrap_err();
        assert!(matches!(err, DiffParseError::MalformedHeader { line: 2, .. }));
    }

    #[test]
    fn old_mode_without_new_mode_is_malformed() {
        let err = parse(&format!("diff --git a/x b/x\nold mode 100644\nindex {ONES}..{TWOS}\n")).unwrap_err();
        assert!(matches!(
            err,
            DiffParseError::MalformedHeader { line: 3, ref content } if content.starts_with("index")
        ));
    }

    #[test]
    fn garbled_index_line_is_malformed() {
        let err = parse("diff --git a/x b/x\nindex 12345\n").unwrap_err();
        assert!(matches!(err, DiffParseError::MalformedHeader { line: 2, .. }));
    }

    #[test]
    fn error_messages() {
        let err = parse("diff --git a/x b/x\n--- a/x\n").unwrap_err();
        assert_eq!(err.to_string(), "Missing index line for 'x' at line 2");

        let err = parse("not a diff\n").unwrap_err();
        assert_eq!(err.to_string(), "Malformed diff header at line 1: 'not a diff'");
    }

    #[test]
    fn resolver_is_never_asked_for_null_ids() {
        let resolver = |id: &ObjectId| -> Result<String, BlobError> {
            assert!(!id.is_null());
            Ok(format!("blob:{id}"))
        };
        let text = format!("diff --git a/x b/x\nindex {ZERO}..{ONES}\n");
        let records = FullDiffParser::new(&resolver).parse(&text).unwrap();
        assert_eq!(records[0].blob_before(), None);
        assert_eq!(records[0].blob_after(), Some(&format!("blob:{ONES}")));
    }

    #[test]
    fn resolver_errors_abort_the_parse() {
        let resolver = |id: &ObjectId| -> Result<Blob, BlobError> {
            if id.as_str() == TWOS {
                Err(BlobError::UnresolvableBlob {
                    id: id.to_string(),
                    message: "missing object".to_string(),
                })
            } else {
                Ok(Blob::new(id.clone()))
            }
        };
        let text = format!(
            "diff --git a/x b/x\nindex {ZERO}..{ONES}\ndiff --git a/y b/y\nindex {ONES}..{TWOS}\n"
        );
        let err = FullDiffParser::new(&resolver).parse(&text).unwrap_err();
        assert!(matches!(
            err,
            DiffParseError::UnresolvableBlob(BlobError::UnresolvableBlob { ref id, .. }) if id == TWOS
        ));
    }

    #[test]
    fn name_status_rendering() {
        let text = format!(
            "diff --git a/new.txt b/new.txt\nnew file mode 100644\nindex {ZERO}..{ONES}\n\
             diff --git a/gone.txt b/gone.txt\ndeleted file mode 100644\nindex {ONES}..{ZERO}\n\
             diff --git a/a.txt b/b.txt\nsimilarity index 87%\nrename from a.txt\nrename to b.txt\nindex {ONES}..{TWOS}\n\
             diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n\
             diff --git a/lib.rs b/lib.rs\nindex {ONES}..{TWOS} 100644\n@@ -1 +1 @@\n-a\n+b\n"
        );
        let rendered = parse(&text)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(rendered, @r"
        A	new.txt
        D	gone.txt
        R087	a.txt	b.txt
        M	run.sh
        M	lib.rs
        ");
    }
}
