//! Generic cursor machinery shared by every entity.
//!
//! A cursor query is assembled from the entity's collection, its
//! composite sort key, and optional aggregation scaffolding (computed
//! fields before the range match, joins after it). The range condition
//! is the lexicographic walk over the anchor tuple; anchor-exclusive on
//! both sides by construction.

use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{doc, Binary, Bson, Document};

use ledgergate_store::{max_object_id, min_object_id, DocumentStore, StoreError, MAX_LONG, MIN_LONG};

use crate::error::CursorError;
use crate::types::{AnchorTuple, Direction};

/// Build the lexicographic range condition over `sort_key`.
///
/// For a descending sort key `(f1, …, fk)` and anchor `(a1, …, ak)`,
/// `From` produces
///
/// ```text
/// (f1 < a1) OR (f1 = a1 AND f2 < a2) OR … OR (f1 = a1 AND … AND fk < ak)
/// ```
///
/// and `Since` substitutes `>` for `<`. The OR-of-ANDs form is load
/// bearing: a single compound comparator would lose tie-break fidelity
/// across the primary field, and a bare `_id` sort would misorder once
/// the timestamp embedded in ids wraps.
pub fn range_condition(sort_key: &[&str], anchor: &AnchorTuple, direction: Direction) -> Document {
    let comparator = direction.comparator();
    let values = anchor.values();
    debug_assert_eq!(sort_key.len(), values.len());

    let mut clauses = Vec::with_capacity(sort_key.len());
    for depth in 0..sort_key.len() {
        let mut clause = Document::new();
        for (field, value) in sort_key.iter().zip(values).take(depth) {
            clause.insert(*field, value.clone());
        }
        let mut bound = Document::new();
        bound.insert(comparator, values[depth].clone());
        clause.insert(sort_key[depth], bound);
        clauses.push(Bson::Document(clause));
    }

    if clauses.len() == 1 {
        match clauses.remove(0) {
            Bson::Document(clause) => clause,
            _ => unreachable!(),
        }
    } else {
        doc! { "$or": clauses }
    }
}

/// Sort specification over the full sort key, `order` being `-1` or `1`.
pub fn sort_document(sort_key: &[&str], order: i32) -> Document {
    let mut sort = Document::new();
    for field in sort_key {
        sort.insert(*field, order);
    }
    sort
}

/// Absolute anchor tuple sitting above (or below) every document.
///
/// Long sentinels bound the value fields; the id sentinels bound the
/// trailing document id when the sort key carries one.
pub(crate) fn absolute_tuple(sort_key: &[&str], upper: bool) -> AnchorTuple {
    let values = sort_key
        .iter()
        .map(|field| match (*field, upper) {
            ("_id", true) => Bson::ObjectId(max_object_id()),
            ("_id", false) => Bson::ObjectId(min_object_id()),
            (_, true) => Bson::Int64(MAX_LONG),
            (_, false) => Bson::Int64(MIN_LONG),
        })
        .collect();
    AnchorTuple(values)
}

/// Generic BSON binary, the stored shape of hashes and addresses.
pub(crate) fn binary(bytes: &[u8]) -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Generic,
        bytes: bytes.to_vec(),
    })
}

/// Walk a dotted field path into a document.
pub(crate) fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Read the anchor tuple for `sort_key` out of a resolved document.
pub(crate) fn tuple_from_document(
    document: &Document,
    sort_key: &'static [&'static str],
) -> Result<AnchorTuple, CursorError> {
    let mut values = Vec::with_capacity(sort_key.len());
    for &field in sort_key {
        let value = lookup_path(document, field)
            .ok_or(StoreError::Malformed(field))?
            .clone();
        values.push(value);
    }
    Ok(AnchorTuple(values))
}

/// One assembled cursor query, ready to run against an anchor tuple.
///
/// Flat entities run as a plain bounded find; the presence of computed
/// fields, joins, or scaffold stripping switches execution to an
/// aggregation pipeline of the shape
/// `pre stages → $match(range) → post stages → $sort → $project → $limit`.
#[derive(Debug, Clone)]
pub(crate) struct CursorQuery {
    collection: &'static str,
    sort_key: &'static [&'static str],
    pre_stages: Vec<Document>,
    post_stages: Vec<Document>,
    extra_condition: Option<Document>,
    strip_fields: Vec<&'static str>,
}

impl CursorQuery {
    pub(crate) fn new(collection: &'static str, sort_key: &'static [&'static str]) -> Self {
        Self {
            collection,
            sort_key,
            pre_stages: Vec::new(),
            post_stages: Vec::new(),
            extra_condition: None,
            strip_fields: Vec::new(),
        }
    }

    /// AND an extra condition into the range match.
    pub(crate) fn condition(mut self, condition: Document) -> Self {
        self.extra_condition = Some(match self.extra_condition.take() {
            Some(existing) => doc! { "$and": [existing, condition] },
            None => condition,
        });
        self
    }

    /// Add a stage running before the range match (computed fields).
    pub(crate) fn pre_stage(mut self, stage: Document) -> Self {
        self.pre_stages.push(stage);
        self
    }

    /// Add a stage running after the range match (joins, join filters).
    pub(crate) fn post_stage(mut self, stage: Document) -> Self {
        self.post_stages.push(stage);
        self
    }

    /// Project away computed scaffold fields before documents leave the
    /// engine.
    pub(crate) fn strip(mut self, fields: &[&'static str]) -> Self {
        self.strip_fields.extend_from_slice(fields);
        self
    }

    pub(crate) async fn run(
        &self,
        store: &DocumentStore,
        anchor: &AnchorTuple,
        direction: Direction,
        limit: u32,
    ) -> Result<Vec<Document>, CursorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let range = range_condition(self.sort_key, anchor, direction);
        let filter = match &self.extra_condition {
            Some(extra) => doc! { "$and": [range, extra.clone()] },
            None => range,
        };
        let sort = sort_document(self.sort_key, direction.scan_order());

        let needs_pipeline = !self.pre_stages.is_empty()
            || !self.post_stages.is_empty()
            || !self.strip_fields.is_empty();

        let mut page = if needs_pipeline {
            let mut stages = self.pre_stages.clone();
            stages.push(doc! { "$match": filter });
            stages.extend(self.post_stages.iter().cloned());

            let projection = if self.strip_fields.is_empty() {
                None
            } else {
                let mut projection = Document::new();
                for field in &self.strip_fields {
                    projection.insert(*field, 0);
                }
                Some(projection)
            };
            store
                .aggregate(self.collection, stages, sort, projection, limit)
                .await?
        } else {
            store.find(self.collection, filter, None, sort, limit).await?
        };

        // the window was located in scan order; output is always descending
        if direction == Direction::Since {
            page.reverse();
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AbsoluteAnchor;

    const TX_KEY: &[&str] = &["meta.height", "meta.index"];
    const MOSAIC_KEY: &[&str] = &["mosaic.startHeight", "_id"];

    #[test]
    fn single_field_condition_collapses() {
        let anchor = AnchorTuple(vec![Bson::Int64(7)]);
        let condition = range_condition(&["block.height"], &anchor, Direction::From);
        assert_eq!(condition, doc! { "block.height": { "$lt": 7_i64 } });
    }

    #[test]
    fn two_field_condition_walks_the_prefixes() {
        let anchor = AnchorTuple(vec![Bson::Int64(10), Bson::Int32(3)]);
        let condition = range_condition(TX_KEY, &anchor, Direction::From);
        assert_eq!(
            condition,
            doc! {
                "$or": [
                    { "meta.height": { "$lt": 10_i64 } },
                    { "meta.height": 10_i64, "meta.index": { "$lt": 3_i32 } },
                ]
            }
        );
    }

    #[test]
    fn since_flips_the_comparator() {
        let anchor = AnchorTuple(vec![Bson::Int64(10), Bson::Int32(3)]);
        let condition = range_condition(TX_KEY, &anchor, Direction::Since);
        assert_eq!(
            condition,
            doc! {
                "$or": [
                    { "meta.height": { "$gt": 10_i64 } },
                    { "meta.height": 10_i64, "meta.index": { "$gt": 3_i32 } },
                ]
            }
        );
    }

    #[test]
    fn four_field_condition_has_one_clause_per_prefix() {
        let key: &[&str] = &[
            "account.harvestedFees",
            "account.harvestedBlocks",
            "account.publicKeyHeight",
            "_id",
        ];
        let anchor = AnchorTuple(vec![
            Bson::Int64(100),
            Bson::Int64(4),
            Bson::Int64(9),
            Bson::ObjectId(max_object_id()),
        ]);
        let condition = range_condition(key, &anchor, Direction::From);
        let clauses = condition.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);

        // clause i carries i equality terms before its comparator
        for (i, clause) in clauses.iter().enumerate() {
            let clause = clause.as_document().unwrap();
            assert_eq!(clause.len(), i + 1);
            let (_, last) = clause.iter().last().unwrap();
            assert!(last.as_document().unwrap().contains_key("$lt"));
        }
    }

    #[test]
    fn sort_document_spans_the_key() {
        assert_eq!(
            sort_document(TX_KEY, -1),
            doc! { "meta.height": -1, "meta.index": -1 }
        );
        assert_eq!(
            sort_document(MOSAIC_KEY, 1),
            doc! { "mosaic.startHeight": 1, "_id": 1 }
        );
    }

    #[test]
    fn absolute_tuples_pick_sentinels_per_field() {
        let upper = absolute_tuple(MOSAIC_KEY, true);
        assert_eq!(upper.values()[0], Bson::Int64(MAX_LONG));
        assert_eq!(upper.values()[1], Bson::ObjectId(max_object_id()));

        let lower = absolute_tuple(MOSAIC_KEY, false);
        assert_eq!(lower.values()[0], Bson::Int64(MIN_LONG));
        assert_eq!(lower.values()[1], Bson::ObjectId(min_object_id()));

        assert!(AbsoluteAnchor::Latest.is_upper_bound());
    }

    #[test]
    fn lookup_path_descends_dotted_fields() {
        let document = doc! { "meta": { "height": 5_i64, "index": 1_i32 } };
        assert_eq!(lookup_path(&document, "meta.height"), Some(&Bson::Int64(5)));
        assert_eq!(lookup_path(&document, "meta.index"), Some(&Bson::Int32(1)));
        assert_eq!(lookup_path(&document, "meta.hash"), None);
        assert_eq!(lookup_path(&document, "block.height"), None);
    }

    #[test]
    fn tuple_reads_follow_the_sort_key() {
        let document = doc! { "meta": { "height": 5_i64, "index": 1_i32 } };
        let tuple = tuple_from_document(&document, TX_KEY).unwrap();
        assert_eq!(tuple.values(), &[Bson::Int64(5), Bson::Int32(1)]);
    }

    #[test]
    fn tuple_read_fails_on_missing_field() {
        let document = doc! { "meta": { "height": 5_i64 } };
        let err = tuple_from_document(&document, TX_KEY).unwrap_err();
        assert!(matches!(err, CursorError::Store(StoreError::Malformed("meta.index"))));
    }
}
