//! Generic document store capability and its backends.
//!
//! [`DocumentStore`] is the only interface the service layer depends on.
//! [`MongoStore`] talks to a MongoDB collection; [`MemoryStore`] keeps
//! documents in process with the same matching, update and uniqueness rules.

mod memory_store;
mod mongo_store;

use async_trait::async_trait;
pub use memory_store::MemoryStore;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
pub use mongo_store::MongoStore;

use crate::MongoResult;

/// Equality filter over (possibly dotted) field paths.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// Creates a filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter matching the document with the given id.
    pub fn by_id(id: ObjectId) -> Self {
        Self(doc! { "_id": id })
    }

    /// Adds an equality condition on a field path such as `email.value`.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.0.insert(path, value);
        self
    }

    /// Returns the underlying BSON document.
    #[inline]
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Consumes the filter returning the underlying BSON document.
    #[inline]
    pub fn into_document(self) -> Document {
        self.0
    }
}

/// Partial update applied with `$set` semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Document);

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field path such as `metadata.last_seen_at` to a value.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.0.insert(path, value);
        self
    }

    /// Returns whether the patch changes nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the field assignments of this patch.
    #[inline]
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Returns the `{ "$set": ... }` update document.
    pub fn into_update(self) -> Document {
        doc! { "$set": self.0 }
    }
}

/// Persistence capability for one collection of documents of type `T`.
///
/// Implementations must be safe to share between request handlers and must
/// bound each call so that a stalled backend surfaces as an error.
#[async_trait]
pub trait DocumentStore<T>: Send + Sync
where
    T: Send + Sync,
{
    /// Returns the first document matching the filter, if any.
    async fn find_one(&self, filter: Filter) -> MongoResult<Option<T>>;

    /// Returns every document matching the filter.
    async fn find_many(&self, filter: Filter) -> MongoResult<Vec<T>>;

    /// Inserts a document, returning the identifier assigned by the store.
    ///
    /// Fails with [`MongoError::DuplicateKey`] when a unique field collides.
    ///
    /// [`MongoError::DuplicateKey`]: crate::MongoError::DuplicateKey
    async fn insert(&self, document: &T) -> MongoResult<ObjectId>;

    /// Applies the patch to the document with the given id.
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn update(&self, id: ObjectId, patch: Patch) -> MongoResult<u64>;

    /// Deletes all documents matching the filter, returning how many were removed.
    async fn delete(&self, filter: Filter) -> MongoResult<u64>;

    /// Declares a field path whose values must be unique across the collection.
    ///
    /// The index created for the field is named after the field path.
    async fn ensure_unique(&self, path: &str) -> MongoResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builder() {
        let filter = Filter::new().eq("email.value", "a@b.io").eq("username", "alice");
        assert_eq!(
            filter.into_document(),
            doc! { "email.value": "a@b.io", "username": "alice" }
        );
    }

    #[test]
    fn test_patch_into_update() {
        let patch = Patch::new().set("metadata.profile.avatar", "x.png");
        assert!(!patch.is_empty());
        assert_eq!(
            patch.into_update(),
            doc! { "$set": { "metadata.profile.avatar": "x.png" } }
        );
    }
}
