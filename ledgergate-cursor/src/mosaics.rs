//! # Mosaic Cursor
//!
//! Mosaics sort on `(mosaic.startHeight, _id)` descending. Mosaic ids
//! are full-width 64-bit values stored as signed longs, so key
//! conversion is a two's-complement reinterpretation, not a checked
//! cast.

use mongodb::bson::{doc, Document};

use ledgergate_core::MosaicId;
use ledgergate_store::{promote_id_to_meta, promote_ids_to_meta, DocumentStore};

use crate::engine::{absolute_tuple, tuple_from_document, CursorQuery};
use crate::error::CursorError;
use crate::types::{AbsoluteAnchor, AnchorTuple, Direction};

const COLLECTION: &str = "mosaics";
const SORT_KEY: &[&str] = &["mosaic.startHeight", "_id"];

/// Anchors accepted by the mosaic cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosaicAnchor {
    Absolute(AbsoluteAnchor),
    Id(MosaicId),
}

/// Cursor over the `mosaics` collection.
#[derive(Debug, Clone)]
pub struct MosaicCursor {
    store: DocumentStore,
}

impl MosaicCursor {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub async fn from(&self, anchor: MosaicAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::From, n).await
    }

    pub async fn since(&self, anchor: MosaicAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::Since, n).await
    }

    async fn page(
        &self,
        anchor: MosaicAnchor,
        direction: Direction,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let tuple = self.resolve(anchor).await?;
        let mut page = CursorQuery::new(COLLECTION, SORT_KEY)
            .run(&self.store, &tuple, direction, n)
            .await?;
        promote_ids_to_meta(&mut page);
        Ok(page)
    }

    async fn resolve(&self, anchor: MosaicAnchor) -> Result<AnchorTuple, CursorError> {
        let filter = match anchor {
            MosaicAnchor::Absolute(keyword) => {
                return Ok(absolute_tuple(SORT_KEY, keyword.is_upper_bound()))
            }
            MosaicAnchor::Id(id) => doc! { "mosaic.id": id.0 as i64 },
        };
        let document = self
            .store
            .find_one(COLLECTION, filter, Some(doc! { "mosaic.startHeight": 1 }))
            .await?
            .ok_or(CursorError::NotFound)?;
        tuple_from_document(&document, SORT_KEY)
    }

    /// Single mosaic by id.
    pub async fn by_id(&self, id: MosaicId) -> Result<Document, CursorError> {
        let mut document = self
            .store
            .find_one(COLLECTION, doc! { "mosaic.id": id.0 as i64 }, None)
            .await?
            .ok_or(CursorError::NotFound)?;
        promote_id_to_meta(&mut document);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn high_bit_mosaic_ids_reinterpret_as_longs() {
        let id = MosaicId(0x85BB_EA6C_C462_B244);
        let as_long = id.0 as i64;
        assert!(as_long < 0);
        assert_eq!(as_long as u64, id.0);
    }

    #[test]
    fn absolute_anchors_bound_both_fields() {
        let upper = absolute_tuple(SORT_KEY, true);
        assert_eq!(upper.values()[0], Bson::Int64(i64::MAX));
        assert!(matches!(upper.values()[1], Bson::ObjectId(_)));
    }
}
