//! Object ids and blob handles referenced by `index` lines.
//!
//! The parser only identifies blobs. Turning an id into something useful
//! (fetching content, caching, looking it up in an object database) is the
//! job of a [`BlobResolver`], which callers supply.
//!
//! # Examples
//!
//! ```
//! use git_diff_records::blob::{BlobResolver, LazyResolver, ObjectId};
//!
//! let id = ObjectId::from_hex("1111111111111111111111111111111111111111").unwrap();
//! let blob = LazyResolver.resolve(&id).unwrap();
//! assert_eq!(blob.id(), &id);
//! assert!(!id.is_null());
//! assert!(ObjectId::null().is_null());
//! ```

use error_set::error_set;
use std::fmt;
use std::sync::Arc;

error_set! {
    /// Errors reported by a [`BlobResolver`]
    BlobError := {
        /// A non-null id could not be turned into a blob handle
        #[display("Unable to resolve blob {id}: {message}")]
        UnresolvableBlob { id: String, message: String },
    }
}

/// Hex spelling of the id git uses for "no content on this side".
pub const NULL_ID_HEX: &str = "0000000000000000000000000000000000000000";

/// A hexadecimal object id as printed on an `index` line.
///
/// Abbreviated ids are accepted; only the full 40-character all-zero id is
/// treated as null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    /// Build an id from hex digits, returning `None` for empty or non-hex input.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(Arc::from(hex)))
    }

    /// The all-zero id.
    #[must_use]
    pub fn null() -> Self {
        Self(Arc::from(NULL_ID_HEX))
    }

    /// True for exactly forty `0` characters.
    #[must_use]
    pub fn is_null(&self) -> bool {
        &*self.0 == NULL_ID_HEX
    }

    /// The id as hex digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An id-only blob handle. Cloning shares the id, content is never loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob {
    id: ObjectId,
}

impl Blob {
    /// Wrap an id without loading anything.
    pub fn new(id: ObjectId) -> Self {
        Self { id }
    }

    /// The blob's object id.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// Turns object ids into content handles.
///
/// The parsers never call [`resolve`](BlobResolver::resolve) with the null
/// id; that side is reported as absent before resolution happens. Any I/O,
/// caching or retry policy belongs to the implementation.
pub trait BlobResolver {
    /// Handle stored in each [`DiffRecord`](crate::DiffRecord).
    type Handle;

    /// Resolve a non-null id to a handle.
    fn resolve(&self, id: &ObjectId) -> Result<Self::Handle, BlobError>;
}

impl<F, H> BlobResolver for F
where
    F: Fn(&ObjectId) -> Result<H, BlobError>,
{
    type Handle = H;

    fn resolve(&self, id: &ObjectId) -> Result<H, BlobError> {
        self(id)
    }
}

/// Resolver that defers everything: every id becomes an id-only [`Blob`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyResolver;

impl BlobResolver for LazyResolver {
    type Handle = Blob;

    fn resolve(&self, id: &ObjectId) -> Result<Blob, BlobError> {
        Ok(Blob::new(id.clone()))
    }
}
