use crate::blob::Blob;
use std::fmt;

/// How a file changed, derived from a record's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
    Renamed,
    /// Only the file mode changed; no content was compared.
    ModeChanged,
    Modified,
}

impl ChangeKind {
    /// The single-letter status git uses in `--name-status` output.
    pub fn status_letter(self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
            ChangeKind::ModeChanged | ChangeKind::Modified => 'M',
        }
    }
}

/// One changed file from a git diff.
///
/// Records are built once by a parser (or by [`DiffRecordBuilder`]) and not
/// mutated afterwards. Blob handles are whatever the resolver produced, so
/// large content is shared rather than copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord<B = Blob> {
    path_before: String,
    path_after: String,
    blob_before: Option<B>,
    blob_after: Option<B>,
    mode_before: Option<String>,
    mode_after: Option<String>,
    is_new: bool,
    is_deleted: bool,
    is_renamed: bool,
    similarity_index: u8,
    patch_body: Option<String>,
}

impl<B> DiffRecord<B> {
    /// Start a record for the given paths. Every other field defaults to
    /// absent/false/zero.
    pub fn builder(
        path_before: impl Into<String>,
        path_after: impl Into<String>,
    ) -> DiffRecordBuilder<B> {
        DiffRecordBuilder {
            record: DiffRecord {
                path_before: path_before.into(),
                path_after: path_after.into(),
                blob_before: None,
                blob_after: None,
                mode_before: None,
                mode_after: None,
                is_new: false,
                is_deleted: false,
                is_renamed: false,
                similarity_index: 0,
                patch_body: None,
            },
            has_content: false,
        }
    }

    /// Path on the old side (`a/`).
    pub fn path_before(&self) -> &str {
        &self.path_before
    }

    /// Path on the new side (`b/`). Differs from `path_before` only for renames.
    pub fn path_after(&self) -> &str {
        &self.path_after
    }

    /// Content before the change, `None` when there was none.
    pub fn blob_before(&self) -> Option<&B> {
        self.blob_before.as_ref()
    }

    /// Content after the change, `None` when there is none.
    pub fn blob_after(&self) -> Option<&B> {
        self.blob_after.as_ref()
    }

    /// File mode before the change, as git printed it.
    pub fn mode_before(&self) -> Option<&str> {
        self.mode_before.as_deref()
    }

    /// File mode after the change, as git printed it.
    pub fn mode_after(&self) -> Option<&str> {
        self.mode_after.as_deref()
    }

    /// True when the file was created.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// True when the file was removed.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// True when git paired the two paths as a rename.
    pub fn is_renamed(&self) -> bool {
        self.is_renamed
    }

    /// Percentage similarity between both sides of a rename, 0 otherwise.
    pub fn similarity_index(&self) -> u8 {
        self.similarity_index
    }

    /// Raw hunk text, without a trailing newline.
    pub fn patch_body(&self) -> Option<&str> {
        self.patch_body.as_deref()
    }

    /// Lines of the patch body; empty when there is no body.
    pub fn patch_lines(&self) -> impl Iterator<Item = &str> {
        self.patch_body.iter().flat_map(|body| body.split('\n'))
    }

    /// Classify the change from the record's flags and modes.
    pub fn kind(&self) -> ChangeKind {
        if self.is_new {
            ChangeKind::Added
        } else if self.is_deleted {
            ChangeKind::Deleted
        } else if self.is_renamed {
            ChangeKind::Renamed
        } else if self.mode_before.is_some()
            && self.mode_after.is_some()
            && self.mode_before != self.mode_after
            && self.patch_body.is_none()
        {
            ChangeKind::ModeChanged
        } else {
            ChangeKind::Modified
        }
    }
}

/// Renders the record as a `git diff --name-status` line.
impl<B> fmt::Display for DiffRecord<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ChangeKind::Renamed => write!(
                f,
                "R{:03}\t{}\t{}",
                self.similarity_index, self.path_before, self.path_after
            ),
            ChangeKind::Deleted => write!(f, "D\t{}", self.path_before),
            kind => write!(f, "{}\t{}", kind.status_letter(), self.path_after),
        }
    }
}

/// Builds a [`DiffRecord`] from any subset of its fields.
///
/// Once blob sides are supplied with [`content`](Self::content), an absent
/// side always implies the matching new/deleted flag, whatever order the
/// setters were called in.
#[derive(Debug, Clone)]
pub struct DiffRecordBuilder<B = Blob> {
    record: DiffRecord<B>,
    has_content: bool,
}

impl<B> DiffRecordBuilder<B> {
    /// Explicitly flag the file as created.
    pub fn new_file(mut self, is_new: bool) -> Self {
        self.record.is_new = is_new;
        self
    }

    /// Explicitly flag the file as removed.
    pub fn deleted_file(mut self, is_deleted: bool) -> Self {
        self.record.is_deleted = is_deleted;
        self
    }

    /// Mark the record as a rename with the given similarity percentage.
    pub fn renamed(mut self, similarity_index: u8) -> Self {
        self.record.is_renamed = true;
        self.record.similarity_index = similarity_index;
        self
    }

    /// Set the old file mode.
    pub fn mode_before(mut self, mode: Option<impl Into<String>>) -> Self {
        self.record.mode_before = mode.map(Into::into);
        self
    }

    /// Set the new file mode.
    pub fn mode_after(mut self, mode: Option<impl Into<String>>) -> Self {
        self.record.mode_after = mode.map(Into::into);
        self
    }

    /// Set both blob sides from an `index` line. An absent side marks the
    /// file as new (before) or deleted (after), on top of any explicit flag.
    pub fn content(mut self, before: Option<B>, after: Option<B>) -> Self {
        self.record.blob_before = before;
        self.record.blob_after = after;
        self.has_content = true;
        self
    }

    /// Set the raw hunk text.
    pub fn patch_body(mut self, body: Option<impl Into<String>>) -> Self {
        self.record.patch_body = body.map(Into::into);
        self
    }

    /// Finish the record. Without [`content`](Self::content) the flags
    /// are exactly what was set.
    pub fn build(self) -> DiffRecord<B> {
        let mut record = self.record;
        if self.has_content {
            record.is_new |= record.blob_before.is_none();
            record.is_deleted |= record.blob_after.is_none();
        }
        record
    }
}
