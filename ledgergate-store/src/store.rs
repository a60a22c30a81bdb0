//! The [`DocumentStore`] connection handle and its read operations.

use std::time::Duration;

use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::{AggregateOptions, ClientOptions, FindOneOptions, FindOptions};
use mongodb::{Client, Collection};
use thiserror::Error;
use tracing::{debug, info};

use ledgergate_core::DbConfig;

/// Errors crossing the store boundary.
///
/// Driver faults are surfaced unchanged; the request that hit them is
/// terminal, the process is not.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("malformed document: missing field '{0}'")]
    Malformed(&'static str),
}

/// Handle to the chain-state database.
///
/// Cloning is cheap; the underlying driver owns the connection pool and
/// every operation borrows a connection for its duration. The store
/// holds no mutable state, so freshly committed documents are visible to
/// the next query.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db: mongodb::Database,
    page_size_min: u32,
    page_size_max: u32,
}

impl DocumentStore {
    /// Connect to the configured database.
    ///
    /// Server selection is bounded so an unreachable store turns into a
    /// [`StoreError`] instead of a hang.
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        info!(url = %config.url, name = %config.name, "connecting to document store");

        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some("ledgergate".to_string());
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        Ok(Self {
            db: client.database(&config.name),
            page_size_min: config.page_size_min,
            page_size_max: config.page_size_max,
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection::<Document>(name)
    }

    /// Look up a single document matching `filter`.
    pub async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, StoreError> {
        let mut options = FindOneOptions::default();
        options.projection = projection;
        Ok(self.collection(collection).find_one(filter, options).await?)
    }

    /// Bounded find-project-sort-limit.
    pub async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
        sort: Document,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        debug!(collection, limit, "find");
        let mut options = FindOptions::default();
        options.projection = projection;
        options.sort = Some(sort);
        options.limit = Some(i64::from(limit));
        let cursor = self.collection(collection).find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Run `stages`, then apply sort, projection, and limit.
    ///
    /// 64-bit integers survive the pipeline: BSON `Int64` values stay
    /// `Int64` in this driver, so computed sums over chain quantities
    /// keep their full width.
    pub async fn aggregate(
        &self,
        collection: &str,
        stages: Vec<Document>,
        sort: Document,
        projection: Option<Document>,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError> {
        debug!(collection, stages = stages.len(), limit, "aggregate");

        let mut pipeline = stages;
        pipeline.push(doc! { "$sort": sort });
        if let Some(projection) = projection {
            pipeline.push(doc! { "$project": projection });
        }
        pipeline.push(doc! { "$limit": i64::from(limit) });

        let mut options = AggregateOptions::default();
        options.allow_disk_use = Some(true);
        let cursor = self
            .collection(collection)
            .aggregate(pipeline, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Count every document in a collection.
    pub async fn count_documents(&self, collection: &str) -> Result<u64, StoreError> {
        Ok(self.collection(collection).count_documents(None, None).await?)
    }

    /// Internal-id anchored paging for the legacy listing endpoints.
    ///
    /// Pages ascend by `_id`; passing the last id of the previous page
    /// yields the next one. The page size is clamped to the configured
    /// `[db.pageSizeMin, db.pageSizeMax]` window.
    pub async fn query_paged_documents(
        &self,
        collection: &str,
        mut condition: Document,
        prev_page_id: Option<ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, StoreError> {
        if let Some(id) = prev_page_id {
            condition.insert("_id", doc! { "$gt": id });
        }
        let page_size = clamp_page_size(page_size, self.page_size_min, self.page_size_max);
        self.find(collection, condition, None, doc! { "_id": 1 }, page_size)
            .await
    }
}

fn clamp_page_size(requested: u32, min: u32, max: u32) -> u32 {
    requested.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_clamps_to_configured_window() {
        assert_eq!(clamp_page_size(0, 10, 100), 10);
        assert_eq!(clamp_page_size(10, 10, 100), 10);
        assert_eq!(clamp_page_size(55, 10, 100), 55);
        assert_eq!(clamp_page_size(1000, 10, 100), 100);
    }
}
