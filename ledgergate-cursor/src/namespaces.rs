//! # Namespace Cursor
//!
//! Namespaces sort on `(namespace.startHeight, _id)` descending. A
//! namespace id identifies one level of a path, so id lookups match the
//! level field corresponding to the document's depth. Only active
//! namespace documents participate; expired generations stay in the
//! collection but never surface.
//!
//! This module also resolves well-known namespace aliases to mosaic ids
//! for the balance and mosaic-filter machinery. Aliases may change, so
//! the resolution is re-read per query rather than cached.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};

use ledgergate_core::NamespaceId;
use ledgergate_store::{promote_id_to_meta, promote_ids_to_meta, DocumentStore, StoreError};

use crate::engine::{absolute_tuple, lookup_path, tuple_from_document, CursorQuery};
use crate::error::CursorError;
use crate::types::{AbsoluteAnchor, AnchorTuple, Direction};

const COLLECTION: &str = "namespaces";
const SORT_KEY: &[&str] = &["namespace.startHeight", "_id"];

/// Anchors accepted by the namespace cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceAnchor {
    Absolute(AbsoluteAnchor),
    Id(NamespaceId),
    DocumentId(ObjectId),
}

/// Id-equality filter honoring the level/depth layout.
fn id_filter(id: NamespaceId) -> Document {
    let id = id.0 as i64;
    doc! {
        "meta.active": true,
        "$or": [
            { "namespace.level0": id, "namespace.depth": 1 },
            { "namespace.level1": id, "namespace.depth": 2 },
            { "namespace.level2": id, "namespace.depth": 3 },
        ],
    }
}

/// Cursor over the `namespaces` collection.
#[derive(Debug, Clone)]
pub struct NamespaceCursor {
    store: DocumentStore,
}

impl NamespaceCursor {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn from(&self, anchor: NamespaceAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::From, n).await
    }

    pub async fn since(&self, anchor: NamespaceAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::Since, n).await
    }

    async fn page(
        &self,
        anchor: NamespaceAnchor,
        direction: Direction,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let tuple = self.resolve(anchor).await?;
        let mut page = CursorQuery::new(COLLECTION, SORT_KEY)
            .condition(doc! { "meta.active": true })
            .run(&self.store, &tuple, direction, n)
            .await?;
        promote_ids_to_meta(&mut page);
        Ok(page)
    }

    async fn resolve(&self, anchor: NamespaceAnchor) -> Result<AnchorTuple, CursorError> {
        let filter = match anchor {
            NamespaceAnchor::Absolute(keyword) => {
                return Ok(absolute_tuple(SORT_KEY, keyword.is_upper_bound()))
            }
            NamespaceAnchor::Id(id) => id_filter(id),
            NamespaceAnchor::DocumentId(id) => doc! { "_id": id },
        };
        let document = self
            .store
            .find_one(COLLECTION, filter, Some(doc! { "namespace.startHeight": 1 }))
            .await?
            .ok_or(CursorError::NotFound)?;
        tuple_from_document(&document, SORT_KEY)
    }

    /// Single namespace by id.
    pub async fn by_id(&self, id: NamespaceId) -> Result<Document, CursorError> {
        let mut document = self
            .store
            .find_one(COLLECTION, id_filter(id), None)
            .await?
            .ok_or(CursorError::NotFound)?;
        promote_id_to_meta(&mut document);
        Ok(document)
    }
}

/// Mosaic id aliased by a well-known namespace.
///
/// Returned as the stored BSON value so downstream equality matches use
/// the exact representation the write path chose.
pub(crate) async fn alias_mosaic_id(
    store: &DocumentStore,
    id: NamespaceId,
) -> Result<Bson, CursorError> {
    let namespace = store
        .find_one(
            COLLECTION,
            id_filter(id),
            Some(doc! { "namespace.alias.mosaicId": 1 }),
        )
        .await?
        .ok_or(StoreError::Malformed("namespace.alias.mosaicId"))?;
    lookup_path(&namespace, "namespace.alias.mosaicId")
        .cloned()
        .ok_or_else(|| StoreError::Malformed("namespace.alias.mosaicId").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_filter_matches_each_depth() {
        let filter = id_filter(NamespaceId(0x1234_5678_9ABC_DEF0));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
        for (i, clause) in clauses.iter().enumerate() {
            let clause = clause.as_document().unwrap();
            assert!(clause.contains_key(format!("namespace.level{i}").as_str()));
            assert_eq!(clause.get_i32("namespace.depth").unwrap(), i as i32 + 1);
        }
        assert_eq!(filter.get_bool("meta.active").unwrap(), true);
    }
}
