//! # Account Cursors
//!
//! Accounts are ranked by fields that mostly do not exist in the stored
//! documents: the current importance is the last element of an array,
//! harvest statistics fold over the activity buckets, and balances fold
//! over the held mosaics. Each ranked view therefore runs as an
//! aggregation that materializes its sort field on the fly, range-matches
//! against it, and projects it away again before documents leave the
//! engine.
//!
//! Anchor accounts are identified by address, or by public key converted
//! to an address through the network descriptor; resolution runs the
//! same materialization restricted to the one account.

use mongodb::bson::{doc, Bson, Document};

use ledgergate_core::{
    Address, NetworkKind, PublicKey, CURRENCY_NAMESPACE_ID, HARVEST_NAMESPACE_ID,
};
use ledgergate_store::{strip_id, strip_ids, DocumentStore, StoreError};

use crate::engine::{absolute_tuple, binary, lookup_path, tuple_from_document, CursorQuery};
use crate::error::CursorError;
use crate::namespaces::alias_mosaic_id;
use crate::types::{AbsoluteAnchor, AnchorTuple, Direction};

const COLLECTION: &str = "accounts";

/// The ranked account views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRanking {
    /// Current importance score.
    Importance,
    /// Number of recorded activity buckets.
    HarvestedBlocks,
    /// Total fees paid across activity buckets.
    HarvestedFees,
    /// Held amount of the mosaic aliased by the currency namespace.
    CurrencyBalance,
    /// Held amount of the mosaic aliased by the harvest namespace.
    HarvestBalance,
}

impl AccountRanking {
    pub(crate) fn sort_key(self) -> &'static [&'static str] {
        match self {
            AccountRanking::Importance => {
                &["account.importance", "account.publicKeyHeight", "_id"]
            }
            AccountRanking::HarvestedBlocks => {
                &["account.harvestedBlocks", "account.publicKeyHeight", "_id"]
            }
            AccountRanking::HarvestedFees => &[
                "account.harvestedFees",
                "account.harvestedBlocks",
                "account.publicKeyHeight",
                "_id",
            ],
            AccountRanking::CurrencyBalance | AccountRanking::HarvestBalance => {
                &["account.balance", "account.publicKeyHeight", "_id"]
            }
        }
    }

    /// The scaffold fields materialized for this view, projected away
    /// before return.
    fn computed_fields(self) -> &'static [&'static str] {
        match self {
            AccountRanking::Importance => &["account.importance"],
            AccountRanking::HarvestedBlocks => &["account.harvestedBlocks"],
            // the tie-break field is materialized too
            AccountRanking::HarvestedFees => {
                &["account.harvestedFees", "account.harvestedBlocks"]
            }
            AccountRanking::CurrencyBalance | AccountRanking::HarvestBalance => {
                &["account.balance"]
            }
        }
    }
}

/// Anchors accepted by the account cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAnchor {
    Absolute(AbsoluteAnchor),
    Address(Address),
    PublicKey(PublicKey),
}

/// Cursor over the ranked account views.
#[derive(Debug, Clone)]
pub struct AccountCursor {
    store: DocumentStore,
    network: NetworkKind,
}

impl AccountCursor {
    pub fn new(store: DocumentStore, network: NetworkKind) -> Self {
        Self { store, network }
    }

    pub async fn from(
        &self,
        ranking: AccountRanking,
        anchor: AccountAnchor,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(ranking, anchor, Direction::From, n).await
    }

    pub async fn since(
        &self,
        ranking: AccountRanking,
        anchor: AccountAnchor,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(ranking, anchor, Direction::Since, n).await
    }

    async fn page(
        &self,
        ranking: AccountRanking,
        anchor: AccountAnchor,
        direction: Direction,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let add_fields = self.materialize_stage(ranking).await?;
        let tuple = self.resolve(ranking, anchor, &add_fields).await?;

        let mut page = CursorQuery::new(COLLECTION, ranking.sort_key())
            .pre_stage(add_fields)
            .strip(ranking.computed_fields())
            .run(&self.store, &tuple, direction, n)
            .await?;
        strip_ids(&mut page);
        Ok(page)
    }

    /// The `$addFields` stage materializing this view's sort scaffold.
    async fn materialize_stage(&self, ranking: AccountRanking) -> Result<Document, CursorError> {
        let fields = match ranking {
            // last recorded importance; accounts with no history rank at zero
            AccountRanking::Importance => doc! {
                "account.importance": { "$ifNull": [
                    { "$arrayElemAt": ["$account.importances.value", -1] },
                    0_i64,
                ] },
            },
            AccountRanking::HarvestedBlocks => doc! {
                "account.harvestedBlocks": {
                    "$size": { "$ifNull": ["$account.activityBuckets", []] },
                },
            },
            AccountRanking::HarvestedFees => doc! {
                "account.harvestedBlocks": {
                    "$size": { "$ifNull": ["$account.activityBuckets", []] },
                },
                "account.harvestedFees": { "$reduce": {
                    "input": { "$ifNull": ["$account.activityBuckets", []] },
                    "initialValue": 0_i64,
                    "in": { "$add": ["$$value", "$$this.totalFeesPaid"] },
                } },
            },
            AccountRanking::CurrencyBalance => {
                self.balance_fields(CURRENCY_NAMESPACE_ID).await?
            }
            AccountRanking::HarvestBalance => self.balance_fields(HARVEST_NAMESPACE_ID).await?,
        };
        Ok(doc! { "$addFields": fields })
    }

    /// Balance scaffold for the mosaic currently aliased by a well-known
    /// namespace. The alias is resolved on every query; aliases may be
    /// relinked while the process runs.
    async fn balance_fields(
        &self,
        namespace_id: ledgergate_core::NamespaceId,
    ) -> Result<Document, CursorError> {
        let mosaic_id = alias_mosaic_id(&self.store, namespace_id).await?;
        Ok(doc! {
            "account.balance": { "$reduce": {
                "input": { "$ifNull": ["$account.mosaics", []] },
                "initialValue": 0_i64,
                "in": { "$add": ["$$value", { "$cond": [
                    { "$eq": ["$$this.id", mosaic_id] },
                    "$$this.amount",
                    0_i64,
                ] }] },
            } },
        })
    }

    /// The concrete address behind an anchor; keyword anchors carry none.
    pub fn resolve_address(&self, anchor: AccountAnchor) -> Result<Address, CursorError> {
        match anchor {
            AccountAnchor::Absolute(_) => Err(CursorError::InvalidFormat(
                "an account address or public key is required".to_string(),
            )),
            AccountAnchor::Address(address) => Ok(address),
            AccountAnchor::PublicKey(key) => Ok(self.network.public_key_to_address(&key)),
        }
    }

    /// Single account state by address or public key.
    pub async fn by_id(&self, anchor: AccountAnchor) -> Result<Document, CursorError> {
        let address = self.resolve_address(anchor)?;
        let mut document = self
            .store
            .find_one(
                COLLECTION,
                doc! { "account.address": binary(&address.0) },
                None,
            )
            .await?
            .ok_or(CursorError::NotFound)?;
        strip_id(&mut document);
        Ok(document)
    }

    /// Stored signer public key of the anchored account, as the store
    /// spells it. Outgoing-transaction listings filter on this value.
    pub async fn signer_public_key(&self, anchor: AccountAnchor) -> Result<Bson, CursorError> {
        if let AccountAnchor::PublicKey(key) = anchor {
            return Ok(binary(&key.0));
        }
        let account = self.by_id(anchor).await?;
        lookup_path(&account, "account.publicKey")
            .cloned()
            .ok_or_else(|| StoreError::Malformed("account.publicKey").into())
    }

    async fn resolve(
        &self,
        ranking: AccountRanking,
        anchor: AccountAnchor,
        add_fields: &Document,
    ) -> Result<AnchorTuple, CursorError> {
        let address = match anchor {
            AccountAnchor::Absolute(keyword) => {
                return Ok(absolute_tuple(ranking.sort_key(), keyword.is_upper_bound()))
            }
            AccountAnchor::Address(address) => address,
            AccountAnchor::PublicKey(key) => self.network.public_key_to_address(&key),
        };

        let stages = vec![
            doc! { "$match": { "account.address": binary(&address.0) } },
            add_fields.clone(),
        ];
        let hits = self
            .store
            .aggregate(COLLECTION, stages, doc! { "_id": 1 }, None, 1)
            .await?;
        let document = hits.into_iter().next().ok_or(CursorError::NotFound)?;
        tuple_from_document(&document, ranking.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_end_in_the_document_id() {
        for ranking in [
            AccountRanking::Importance,
            AccountRanking::HarvestedBlocks,
            AccountRanking::HarvestedFees,
            AccountRanking::CurrencyBalance,
            AccountRanking::HarvestBalance,
        ] {
            assert_eq!(*ranking.sort_key().last().unwrap(), "_id");
        }
    }

    #[test]
    fn computed_fields_lead_their_sort_keys() {
        for ranking in [
            AccountRanking::Importance,
            AccountRanking::HarvestedBlocks,
            AccountRanking::HarvestedFees,
            AccountRanking::CurrencyBalance,
            AccountRanking::HarvestBalance,
        ] {
            assert_eq!(ranking.computed_fields()[0], ranking.sort_key()[0]);
        }
    }

    #[test]
    fn fees_view_materializes_its_tie_break() {
        let fields = AccountRanking::HarvestedFees.computed_fields();
        assert!(fields.contains(&"account.harvestedBlocks"));
        assert_eq!(AccountRanking::HarvestedFees.sort_key().len(), 4);
    }

    #[test]
    fn balance_views_share_a_sort_key() {
        assert_eq!(
            AccountRanking::CurrencyBalance.sort_key(),
            AccountRanking::HarvestBalance.sort_key()
        );
    }
}
