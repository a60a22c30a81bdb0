//! # Transaction Cursor
//!
//! Transactions sort on `(meta.height, meta.index)` descending across
//! three collections: confirmed, unconfirmed, and partial. The partial
//! collection is the one place where aggregate-dependent
//! sub-transactions are first-class; everywhere else a document carrying
//! a `meta.aggregateId` back-reference is a dependent and is excluded
//! from cursor pages.
//!
//! The typed variant narrows pages to one transaction type and, for
//! transfers, applies one of two join filters: "carries a mosaic other
//! than the network currency or harvest mosaic" or "touches an account
//! with a multisig entry".

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};

use ledgergate_core::{Address, Hash256, CURRENCY_NAMESPACE_ID, HARVEST_NAMESPACE_ID};
use ledgergate_store::{promote_id_to_meta, promote_ids_to_meta, DocumentStore};

use crate::engine::{absolute_tuple, binary, lookup_path, tuple_from_document, CursorQuery};
use crate::error::CursorError;
use crate::namespaces::alias_mosaic_id;
use crate::types::{AbsoluteAnchor, AnchorTuple, Direction};

const SORT_KEY: &[&str] = &["meta.height", "meta.index"];

// aggregates are protocol-capped, so one bounded read collects every dependent
const MAX_DEPENDENTS: u32 = 1_000;

/// The three transaction collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionGroup {
    Confirmed,
    Unconfirmed,
    Partial,
}

impl TransactionGroup {
    pub fn collection(self) -> &'static str {
        match self {
            TransactionGroup::Confirmed => "transactions",
            TransactionGroup::Unconfirmed => "unconfirmedTransactions",
            TransactionGroup::Partial => "partialTransactions",
        }
    }

    /// Whether cursor pages consist of aggregate-dependent documents.
    ///
    /// Partial transactions are staged aggregates, so their dependents
    /// are the payload; the other groups page top-level transactions
    /// only.
    pub fn requires_aggregate_dependents(self) -> bool {
        matches!(self, TransactionGroup::Partial)
    }
}

/// Named transaction types and their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Transfer,
    RegisterNamespace,
    AddressAlias,
    MosaicAlias,
    MosaicDefinition,
    MosaicSupplyChange,
    ModifyMultisigAccount,
    AggregateComplete,
    AggregateBonded,
    HashLock,
    SecretLock,
    SecretProof,
}

impl TransactionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "transfer" => Some(TransactionType::Transfer),
            "registerNamespace" => Some(TransactionType::RegisterNamespace),
            "addressAlias" => Some(TransactionType::AddressAlias),
            "mosaicAlias" => Some(TransactionType::MosaicAlias),
            "mosaicDefinition" => Some(TransactionType::MosaicDefinition),
            "mosaicSupplyChange" => Some(TransactionType::MosaicSupplyChange),
            "modifyMultisigAccount" => Some(TransactionType::ModifyMultisigAccount),
            "aggregateComplete" => Some(TransactionType::AggregateComplete),
            "aggregateBonded" => Some(TransactionType::AggregateBonded),
            "hashLock" => Some(TransactionType::HashLock),
            "secretLock" => Some(TransactionType::SecretLock),
            "secretProof" => Some(TransactionType::SecretProof),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            TransactionType::Transfer => 0x4154,
            TransactionType::RegisterNamespace => 0x414E,
            TransactionType::AddressAlias => 0x424E,
            TransactionType::MosaicAlias => 0x434E,
            TransactionType::MosaicDefinition => 0x414D,
            TransactionType::MosaicSupplyChange => 0x424D,
            TransactionType::ModifyMultisigAccount => 0x4155,
            TransactionType::AggregateComplete => 0x4141,
            TransactionType::AggregateBonded => 0x4241,
            TransactionType::HashLock => 0x4148,
            TransactionType::SecretLock => 0x4152,
            TransactionType::SecretProof => 0x4252,
        }
    }

    fn is_aggregate(self) -> bool {
        matches!(
            self,
            TransactionType::AggregateComplete | TransactionType::AggregateBonded
        )
    }
}

/// Join filters applicable to transfer pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFilter {
    /// At least one mosaic besides the network currency and harvest mosaics.
    Mosaic,
    /// At least one touched address owns a multisig entry.
    Multisig,
}

impl TransferFilter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mosaic" => Some(TransferFilter::Mosaic),
            "multisig" => Some(TransferFilter::Multisig),
            _ => None,
        }
    }
}

/// Anchors accepted by the transaction cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionAnchor {
    Absolute(AbsoluteAnchor),
    Hash(Hash256),
    Id(ObjectId),
}

/// Cursor over one of the transaction collections.
#[derive(Debug, Clone)]
pub struct TransactionCursor {
    store: DocumentStore,
    group: TransactionGroup,
}

impl TransactionCursor {
    pub fn new(store: DocumentStore, group: TransactionGroup) -> Self {
        Self { store, group }
    }

    pub async fn from(
        &self,
        anchor: TransactionAnchor,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::From, None, n).await
    }

    pub async fn since(
        &self,
        anchor: TransactionAnchor,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::Since, None, n).await
    }

    /// Typed page, optionally narrowed by a transfer join filter.
    pub async fn from_typed(
        &self,
        anchor: TransactionAnchor,
        kind: TransactionType,
        filter: Option<TransferFilter>,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::From, Some((kind, filter)), n).await
    }

    pub async fn since_typed(
        &self,
        anchor: TransactionAnchor,
        kind: TransactionType,
        filter: Option<TransferFilter>,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.page(anchor, Direction::Since, Some((kind, filter)), n).await
    }

    async fn page(
        &self,
        anchor: TransactionAnchor,
        direction: Direction,
        selector: Option<(TransactionType, Option<TransferFilter>)>,
        n: u32,
    ) -> Result<Vec<Document>, CursorError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let query = self.build_query(selector).await?;
        let tuple = self.resolve(anchor).await?;
        let mut page = query.run(&self.store, &tuple, direction, n).await?;
        promote_ids_to_meta(&mut page);
        Ok(page)
    }

    async fn build_query(
        &self,
        selector: Option<(TransactionType, Option<TransferFilter>)>,
    ) -> Result<CursorQuery, CursorError> {
        let dependents = self.group.requires_aggregate_dependents();
        let mut query = CursorQuery::new(self.group.collection(), SORT_KEY)
            .condition(doc! { "meta.aggregateId": { "$exists": dependents } });

        let Some((kind, filter)) = selector else {
            return Ok(query);
        };
        query = query.condition(doc! { "transaction.type": kind.code() });

        match filter {
            None => Ok(query),
            Some(filter) if kind != TransactionType::Transfer => Err(CursorError::InvalidFormat(
                format!("no filter {filter:?} exists for transaction type {kind:?}"),
            )),
            Some(TransferFilter::Mosaic) => {
                // the network mosaic ids are aliased, never hard-coded
                let currency = alias_mosaic_id(&self.store, CURRENCY_NAMESPACE_ID).await?;
                let harvest = alias_mosaic_id(&self.store, HARVEST_NAMESPACE_ID).await?;
                Ok(query
                    .pre_stage(doc! { "$addFields": { "hasNonNetworkMosaics": {
                        "$reduce": {
                            "input": { "$ifNull": ["$transaction.mosaics", []] },
                            "initialValue": false,
                            "in": { "$or": [
                                "$$value",
                                { "$not": { "$in": ["$$this.id", [currency, harvest]] } },
                            ] },
                        }
                    } } })
                    .condition(doc! { "hasNonNetworkMosaics": true })
                    .strip(&["hasNonNetworkMosaics"]))
            }
            Some(TransferFilter::Multisig) => Ok(query
                .post_stage(doc! { "$lookup": {
                    "from": "multisigs",
                    "localField": "meta.addresses",
                    "foreignField": "multisig.accountAddress",
                    "as": "multisigMatches",
                } })
                .post_stage(doc! { "$match": {
                    "$expr": { "$gt": [{ "$size": "$multisigMatches" }, 0] }
                } })
                .strip(&["multisigMatches"])),
        }
    }

    async fn resolve(&self, anchor: TransactionAnchor) -> Result<AnchorTuple, CursorError> {
        let filter = match anchor {
            TransactionAnchor::Absolute(keyword) => {
                return Ok(absolute_tuple(SORT_KEY, keyword.is_upper_bound()))
            }
            TransactionAnchor::Hash(hash) => doc! { "meta.hash": binary(&hash.0) },
            TransactionAnchor::Id(id) => doc! { "_id": id },
        };
        let projection = doc! { "meta.height": 1, "meta.index": 1 };
        let document = self
            .store
            .find_one(self.group.collection(), filter, Some(projection))
            .await?
            .ok_or(CursorError::NotFound)?;
        tuple_from_document(&document, SORT_KEY)
    }

    /// Transactions touching an account in any role, paged by internal id.
    pub async fn by_address(
        &self,
        address: &Address,
        prev_page_id: Option<ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.account_page(doc! { "meta.addresses": binary(&address.0) }, prev_page_id, page_size)
            .await
    }

    /// Transactions addressed to an account.
    pub async fn incoming_to(
        &self,
        address: &Address,
        prev_page_id: Option<ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.account_page(
            doc! { "transaction.recipientAddress": binary(&address.0) },
            prev_page_id,
            page_size,
        )
        .await
    }

    /// Transactions signed by an account. The signer is matched on the
    /// stored public key, not the address.
    pub async fn outgoing_from(
        &self,
        signer_public_key: Bson,
        prev_page_id: Option<ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, CursorError> {
        self.account_page(
            doc! { "transaction.signerPublicKey": signer_public_key },
            prev_page_id,
            page_size,
        )
        .await
    }

    async fn account_page(
        &self,
        mut condition: Document,
        prev_page_id: Option<ObjectId>,
        page_size: u32,
    ) -> Result<Vec<Document>, CursorError> {
        condition.insert(
            "meta.aggregateId",
            doc! { "$exists": self.group.requires_aggregate_dependents() },
        );
        let mut page = self
            .store
            .query_paged_documents(self.group.collection(), condition, prev_page_id, page_size)
            .await?;
        promote_ids_to_meta(&mut page);
        Ok(page)
    }

    /// Single transaction by hash, dependents attached when it is an
    /// aggregate.
    pub async fn by_hash(&self, hash: &Hash256) -> Result<Document, CursorError> {
        self.load_with_dependents(doc! { "meta.hash": binary(&hash.0) })
            .await
    }

    /// Single transaction by internal id, dependents attached when it
    /// is an aggregate.
    pub async fn by_id(&self, id: ObjectId) -> Result<Document, CursorError> {
        self.load_with_dependents(doc! { "_id": id }).await
    }

    async fn load_with_dependents(&self, filter: Document) -> Result<Document, CursorError> {
        let mut document = self
            .store
            .find_one(self.group.collection(), filter, None)
            .await?
            .ok_or(CursorError::NotFound)?;

        if is_aggregate(&document) {
            let id = document
                .get_object_id("_id")
                .map_err(|_| ledgergate_store::StoreError::Malformed("_id"))?;
            let mut dependents = self
                .store
                .find(
                    self.group.collection(),
                    doc! { "meta.aggregateId": id },
                    None,
                    doc! { "meta.index": 1 },
                    MAX_DEPENDENTS,
                )
                .await?;
            promote_ids_to_meta(&mut dependents);
            if let Ok(transaction) = document.get_document_mut("transaction") {
                transaction.insert(
                    "transactions",
                    Bson::Array(dependents.into_iter().map(Bson::Document).collect()),
                );
            }
        }

        promote_id_to_meta(&mut document);
        Ok(document)
    }
}

fn is_aggregate(document: &Document) -> bool {
    let code = match lookup_path(document, "transaction.type") {
        Some(Bson::Int32(code)) => *code,
        Some(Bson::Int64(code)) => *code as i32,
        _ => return false,
    };
    code == TransactionType::AggregateComplete.code()
        || code == TransactionType::AggregateBonded.code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_map_to_their_collections() {
        assert_eq!(TransactionGroup::Confirmed.collection(), "transactions");
        assert_eq!(TransactionGroup::Unconfirmed.collection(), "unconfirmedTransactions");
        assert_eq!(TransactionGroup::Partial.collection(), "partialTransactions");
    }

    #[test]
    fn only_partial_requires_dependents() {
        assert!(!TransactionGroup::Confirmed.requires_aggregate_dependents());
        assert!(!TransactionGroup::Unconfirmed.requires_aggregate_dependents());
        assert!(TransactionGroup::Partial.requires_aggregate_dependents());
    }

    #[test]
    fn type_names_resolve_to_codes() {
        assert_eq!(TransactionType::from_name("transfer"), Some(TransactionType::Transfer));
        assert_eq!(TransactionType::Transfer.code(), 0x4154);
        assert_eq!(
            TransactionType::from_name("aggregateBonded").unwrap().code(),
            0x4241
        );
        assert_eq!(TransactionType::from_name("teleport"), None);
    }

    #[test]
    fn filter_names_resolve() {
        assert_eq!(TransferFilter::from_name("mosaic"), Some(TransferFilter::Mosaic));
        assert_eq!(TransferFilter::from_name("multisig"), Some(TransferFilter::Multisig));
        assert_eq!(TransferFilter::from_name("vault"), None);
    }

    #[test]
    fn aggregate_detection_reads_the_type_code() {
        let aggregate = doc! { "transaction": { "type": TransactionType::AggregateBonded.code() } };
        let transfer = doc! { "transaction": { "type": TransactionType::Transfer.code() } };
        let untyped = doc! { "transaction": {} };
        assert!(is_aggregate(&aggregate));
        assert!(!is_aggregate(&transfer));
        assert!(!is_aggregate(&untyped));
    }
}
