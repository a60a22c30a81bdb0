//! Result sanitizers.
//!
//! Two fixed post-processors, selected per entity: strip the internal
//! document id outright, or relocate it to the public `meta.id` field.
//! A sanitized document never carries `_id`.

use mongodb::bson::{doc, Document};

/// Delete the internal document id.
pub fn strip_id(document: &mut Document) {
    document.remove("_id");
}

/// Delete the internal document id from every document in a page.
pub fn strip_ids(documents: &mut [Document]) {
    for document in documents {
        strip_id(document);
    }
}

/// Copy the internal document id to `meta.id`, then delete it.
pub fn promote_id_to_meta(document: &mut Document) {
    let Some(id) = document.remove("_id") else {
        return;
    };
    match document.get_document_mut("meta") {
        Ok(meta) => {
            meta.insert("id", id);
        }
        Err(_) => {
            document.insert("meta", doc! { "id": id });
        }
    }
}

/// Promote the internal id on every document in a page.
pub fn promote_ids_to_meta(documents: &mut [Document]) {
    for document in documents {
        promote_id_to_meta(document);
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;

    use super::*;

    #[test]
    fn strip_id_removes_internal_id_only() {
        let mut document = doc! { "_id": ObjectId::new(), "block": { "height": 7_i64 } };
        strip_id(&mut document);
        assert!(!document.contains_key("_id"));
        assert!(document.contains_key("block"));
    }

    #[test]
    fn promote_moves_id_into_existing_meta() {
        let id = ObjectId::new();
        let mut document = doc! { "_id": id, "meta": { "height": 5_i64 }, "transaction": {} };
        promote_id_to_meta(&mut document);

        assert!(!document.contains_key("_id"));
        let meta = document.get_document("meta").unwrap();
        assert_eq!(meta.get_object_id("id").unwrap(), id);
        assert_eq!(meta.get_i64("height").unwrap(), 5);
    }

    #[test]
    fn promote_creates_meta_when_missing() {
        let id = ObjectId::new();
        let mut document = doc! { "_id": id, "namespace": {} };
        promote_id_to_meta(&mut document);

        let meta = document.get_document("meta").unwrap();
        assert_eq!(meta.get_object_id("id").unwrap(), id);
    }

    #[test]
    fn promote_without_id_is_a_no_op() {
        let mut document = doc! { "meta": { "height": 1_i64 } };
        promote_id_to_meta(&mut document);
        assert!(!document.get_document("meta").unwrap().contains_key("id"));
    }

    #[test]
    fn array_forms_touch_every_document() {
        let mut documents = vec![
            doc! { "_id": ObjectId::new() },
            doc! { "_id": ObjectId::new() },
        ];
        strip_ids(&mut documents);
        assert!(documents.iter().all(|d| !d.contains_key("_id")));
    }
}
