//! # Block Cursor
//!
//! Blocks sort on `block.height` alone. A height anchor resolves like
//! any other numeric key: a key-equality lookup that must hit exactly
//! one block, so heights above the tip are not found. The `latest`
//! anchor is chain-dependent: it anchors at `chain height + 1` so the
//! tip block is part of `from(latest)`.
//!
//! Alongside the cursor this module carries the gateway's plain block
//! reads: single block by height, the legacy ascending block range, and
//! the transactions confirmed in one block.

use mongodb::bson::{doc, Document};
use tracing::debug;

use ledgergate_core::Height;
use ledgergate_store::{promote_ids_to_meta, strip_id, strip_ids, DocumentStore};

use crate::engine::{absolute_tuple, tuple_from_document, CursorQuery};
use crate::error::CursorError;
use crate::types::{AbsoluteAnchor, AnchorTuple, Direction};

const COLLECTION: &str = "blocks";
const CHAIN_STATISTIC: &str = "chainStatistic";
const SORT_KEY: &[&str] = &["block.height"];

/// Anchors accepted by the block cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAnchor {
    Absolute(AbsoluteAnchor),
    Height(Height),
}

/// Cursor over the `blocks` collection.
#[derive(Debug, Clone)]
pub struct BlockCursor {
    store: DocumentStore,
}

impl BlockCursor {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Up to `n` blocks strictly below the anchor, highest first.
    pub async fn from(&self, anchor: BlockAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::From, n).await
    }

    /// Up to `n` blocks strictly above the anchor, highest first.
    pub async fn since(&self, anchor: BlockAnchor, n: u32) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::Since, n).await
    }

    async fn page(
        &self,
        anchor: BlockAnchor,
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
        strip_ids(&mut page);
        Ok(page)
    }

    async fn resolve(&self, anchor: BlockAnchor) -> Result<AnchorTuple, CursorError> {
        let height = match anchor {
            // the tip itself must fall inside from(latest)
            BlockAnchor::Absolute(keyword) if keyword.is_upper_bound() => {
                let tip = self.chain_height().await?;
                return Ok(AnchorTuple(vec![((tip + 1) as i64).into()]));
            }
            BlockAnchor::Absolute(_) => return Ok(absolute_tuple(SORT_KEY, false)),
            BlockAnchor::Height(height) => height,
        };
        let document = self
            .store
            .find_one(
                COLLECTION,
                doc! { "block.height": height.0 as i64 },
                Some(doc! { "block.height": 1 }),
            )
            .await?
            .ok_or(CursorError::NotFound)?;
        tuple_from_document(&document, SORT_KEY)
    }

    /// Current chain tip, read from the chain statistic document.
    pub async fn chain_height(&self) -> Result<u64, CursorError> {
        let statistic = self
            .store
            .find_one(CHAIN_STATISTIC, doc! {}, Some(doc! { "current.height": 1 }))
            .await?
            .ok_or(ledgergate_store::StoreError::Malformed("current.height"))?;
        let height = statistic
            .get_document("current")
            .ok()
            .and_then(|current| current.get_i64("height").ok())
            .ok_or(ledgergate_store::StoreError::Malformed("current.height"))?;
        Ok(height as u64)
    }

    /// Cumulative chain score halves, read from the chain statistic.
    pub async fn chain_score(&self) -> Result<(i64, i64), CursorError> {
        let statistic = self
            .store
            .find_one(
                CHAIN_STATISTIC,
                doc! {},
                Some(doc! { "current.scoreLow": 1, "current.scoreHigh": 1 }),
            )
            .await?
            .ok_or(ledgergate_store::StoreError::Malformed("current"))?;
        let current = statistic
            .get_document("current")
            .map_err(|_| ledgergate_store::StoreError::Malformed("current"))?;
        let low = current
            .get_i64("scoreLow")
            .map_err(|_| ledgergate_store::StoreError::Malformed("current.scoreLow"))?;
        let high = current
            .get_i64("scoreHigh")
            .map_err(|_| ledgergate_store::StoreError::Malformed("current.scoreHigh"))?;
        Ok((high, low))
    }

    /// Single block by exact height. Heights above the tip are not found.
    pub async fn block_at(&self, height: Height) -> Result<Document, CursorError> {
        let tip = self.chain_height().await?;
        if height.0 == 0 || height.0 > tip {
            debug!(height = height.0, tip, "height outside chain");
            return Err(CursorError::NotFound);
        }
        let mut block = self
            .store
            .find_one(COLLECTION, doc! { "block.height": height.0 as i64 }, None)
            .await?
            .ok_or(CursorError::NotFound)?;
        strip_id(&mut block);
        Ok(block)
    }

    /// Legacy ascending range: blocks with heights in
    /// `[height, height + count)`, returned highest first.
    pub async fn blocks_from(&self, height: Height, count: u32) -> Result<Vec<Document>, CursorError> {
        let lower = height.0 as i64;
        let upper = lower.saturating_add(i64::from(count));
        let mut page = self
            .store
            .find(
                COLLECTION,
                doc! { "block.height": { "$gte": lower, "$lt": upper } },
                None,
                doc! { "block.height": -1 },
                count,
            )
            .await?;
        strip_ids(&mut page);
        Ok(page)
    }

    /// Transactions confirmed in the block at `height`, paged by
    /// internal id. Dependent sub-transactions are not part of the
    /// listing.
    pub async fn transactions_at(
        &self,
        height: Height,
        prev_page_id: Option<mongodb::bson::oid::ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, CursorError> {
        let tip = self.chain_height().await?;
        if height.0 == 0 || height.0 > tip {
            return Err(CursorError::NotFound);
        }
        let condition = doc! {
            "meta.height": height.0 as i64,
            "meta.aggregateId": { "$exists": false },
        };
        let mut page = self
            .store
            .query_paged_documents("transactions", condition, prev_page_id, page_size)
            .await?;
        promote_ids_to_meta(&mut page);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_resolves_to_the_lower_sentinel() {
        let tuple = absolute_tuple(SORT_KEY, false);
        assert_eq!(tuple.values(), &[mongodb::bson::Bson::Int64(i64::MIN)]);
    }
}
