use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::{DocumentStore, Filter, Patch};
use crate::{MongoError, MongoResult, TRACING_TARGET_QUERY};

/// In-process [`DocumentStore`].
///
/// Documents are kept as BSON so filters and patches address the same
/// dotted field paths a MongoDB collection would. Unique fields declared
/// through [`DocumentStore::ensure_unique`] are enforced on insert and update.
pub struct MemoryStore<T> {
    state: RwLock<MemoryState>,
    _marker: PhantomData<fn() -> T>,
}

#[derive(Default)]
struct MemoryState {
    documents: Vec<Document>,
    unique: BTreeSet<String>,
}

impl MemoryState {
    /// Returns the first unique path on which `candidate` collides with a
    /// stored document other than the one at `skip`.
    fn collision(&self, candidate: &Document, skip: Option<usize>) -> Option<String> {
        self.unique.iter().find_map(|path| {
            let value = lookup_path(candidate, path)?;
            let taken = self
                .documents
                .iter()
                .enumerate()
                .filter(|(index, _)| Some(*index) != skip)
                .any(|(_, stored)| lookup_path(stored, path) == Some(value));
            taken.then(|| path.clone())
        })
    }
}

impl<T> MemoryStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            _marker: PhantomData,
        }
    }

    /// Returns the number of stored documents.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Returns whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T> DocumentStore<T> for MemoryStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn find_one(&self, filter: Filter) -> MongoResult<Option<T>> {
        let state = self.state.read().await;
        state
            .documents
            .iter()
            .find(|document| matches(document, &filter))
            .map(|document| bson::from_document(document.clone()).map_err(MongoError::from))
            .transpose()
    }

    async fn find_many(&self, filter: Filter) -> MongoResult<Vec<T>> {
        let state = self.state.read().await;
        state
            .documents
            .iter()
            .filter(|document| matches(document, &filter))
            .map(|document| bson::from_document(document.clone()).map_err(MongoError::from))
            .collect()
    }

    async fn insert(&self, document: &T) -> MongoResult<ObjectId> {
        let mut document = bson::to_document(document)?;
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(Bson::Null) | None => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
            Some(_) => {
                return Err(MongoError::Unexpected(
                    "document id must be an ObjectId".into(),
                ));
            }
        };

        let mut state = self.state.write().await;
        if state
            .documents
            .iter()
            .any(|stored| stored.get("_id") == Some(&Bson::ObjectId(id)))
        {
            return Err(MongoError::DuplicateKey {
                index: "_id".to_owned(),
            });
        }

        if let Some(index) = state.collision(&document, None) {
            tracing::debug!(target: TRACING_TARGET_QUERY, %index, "Rejected duplicate document");
            return Err(MongoError::DuplicateKey { index });
        }

        state.documents.push(document);
        Ok(id)
    }

    async fn update(&self, id: ObjectId, patch: Patch) -> MongoResult<u64> {
        let mut state = self.state.write().await;
        let Some(position) = state
            .documents
            .iter()
            .position(|stored| stored.get("_id") == Some(&Bson::ObjectId(id)))
        else {
            return Ok(0);
        };

        let mut updated = state.documents[position].clone();
        for (path, value) in patch.as_document() {
            set_path(&mut updated, path, value.clone());
        }

        if let Some(index) = state.collision(&updated, Some(position)) {
            return Err(MongoError::DuplicateKey { index });
        }

        state.documents[position] = updated;
        Ok(1)
    }

    async fn delete(&self, filter: Filter) -> MongoResult<u64> {
        let mut state = self.state.write().await;
        let before = state.documents.len();
        state.documents.retain(|document| !matches(document, &filter));
        Ok((before - state.documents.len()) as u64)
    }

    async fn ensure_unique(&self, path: &str) -> MongoResult<()> {
        let mut state = self.state.write().await;

        let mut seen = Vec::new();
        for document in &state.documents {
            if let Some(value) = lookup_path(document, path) {
                if seen.contains(&value) {
                    return Err(MongoError::DuplicateKey {
                        index: path.to_owned(),
                    });
                }
                seen.push(value);
            }
        }

        state.unique.insert(path.to_owned());
        Ok(())
    }
}

/// Returns whether every condition of the filter holds for the document.
fn matches(document: &Document, filter: &Filter) -> bool {
    filter
        .as_document()
        .iter()
        .all(|(path, expected)| lookup_path(document, path) == Some(expected))
}

/// Resolves a dotted field path inside a document.
fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Assigns a value at a dotted field path, creating intermediate documents.
fn set_path(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}
