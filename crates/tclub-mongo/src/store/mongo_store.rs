use std::future::IntoFuture;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::bson::oid::ObjectId;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{DocumentStore, Filter, Patch};
use crate::{MongoClient, MongoError, MongoResult, TRACING_TARGET_QUERY};

/// [`DocumentStore`] backed by a MongoDB collection.
///
/// Every operation is bounded by the client's operation timeout.
pub struct MongoStore<T: Send + Sync> {
    collection: Collection<T>,
    timeout: Duration,
}

impl<T: Send + Sync> MongoStore<T> {
    /// Creates a store over the named collection of the client's database.
    pub fn new(client: &MongoClient, collection: &str) -> Self {
        Self {
            collection: client.collection(collection),
            timeout: client.operation_timeout(),
        }
    }

    async fn bounded<F, R>(&self, operation: &'static str, call: F) -> MongoResult<R>
    where
        F: IntoFuture<Output = mongodb::error::Result<R>>,
    {
        with_timeout(operation, self.collection.name(), self.timeout, call).await
    }
}

/// Runs a driver call, failing with [`MongoError::Timeout`] once `timeout` elapses.
pub(crate) async fn with_timeout<F, R>(
    operation: &'static str,
    collection: &str,
    timeout: Duration,
    call: F,
) -> MongoResult<R>
where
    F: IntoFuture<Output = mongodb::error::Result<R>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(MongoError::from),
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_QUERY,
                operation,
                collection,
                timeout_ms = timeout.as_millis() as u64,
                "Document store operation timed out"
            );
            Err(MongoError::Timeout { operation, timeout })
        }
    }
}

#[async_trait]
impl<T> DocumentStore<T> for MongoStore<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn find_one(&self, filter: Filter) -> MongoResult<Option<T>> {
        self.bounded("find_one", self.collection.find_one(filter.into_document()))
            .await
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn find_many(&self, filter: Filter) -> MongoResult<Vec<T>> {
        let collection = &self.collection;
        self.bounded("find_many", async move {
            let cursor = collection.find(filter.into_document()).await?;
            cursor.try_collect().await
        })
        .await
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn insert(&self, document: &T) -> MongoResult<ObjectId> {
        let result = self
            .bounded("insert", self.collection.insert_one(document))
            .await?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            MongoError::Unexpected("inserted document id is not an ObjectId".into())
        })?;

        tracing::debug!(target: TRACING_TARGET_QUERY, %id, "Document inserted");
        Ok(id)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn update(&self, id: ObjectId, patch: Patch) -> MongoResult<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let result = self
            .bounded(
                "update",
                self.collection
                    .update_one(doc! { "_id": id }, patch.into_update()),
            )
            .await?;

        Ok(result.matched_count)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn delete(&self, filter: Filter) -> MongoResult<u64> {
        let result = self
            .bounded("delete", self.collection.delete_many(filter.into_document()))
            .await?;

        Ok(result.deleted_count)
    }

    #[tracing::instrument(skip(self), target = TRACING_TARGET_QUERY, fields(collection = self.collection.name()))]
    async fn ensure_unique(&self, path: &str) -> MongoResult<()> {
        let options = IndexOptions::builder()
            .name(path.to_owned())
            .unique(true)
            .build();
        let mut keys = Document::new();
        keys.insert(path, 1);
        let model = IndexModel::builder()
            .keys(keys)
            .options(options)
            .build();

        self.bounded("ensure_unique", self.collection.create_index(model))
            .await?;

        tracing::info!(target: TRACING_TARGET_QUERY, path, "Unique index ensured");
        Ok(())
    }
}
