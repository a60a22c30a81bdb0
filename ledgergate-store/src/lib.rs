//! # Document Store Adapter
//!
//! Thin wrapper over the MongoDB driver exposing exactly the read
//! operations the cursor engine needs: single-document lookup, bounded
//! find-project-sort-limit, aggregation pipelines, and document counts.
//! The adapter owns the connection pool; callers borrow a connection per
//! query and never hold state between requests.
//!
//! Store-level failures propagate unchanged as [`StoreError`]; the
//! adapter neither masks nor retries.
//!
//! ## Operational prerequisite
//!
//! Every primary sort field consumed by the cursor engine must be
//! indexed by the write path, or paging degrades to collection scans:
//! `block.height`, `(meta.height, meta.index)` on the three transaction
//! collections, `mosaic.startHeight`, `namespace.startHeight`, and
//! `meta.addresses` / `multisig.accountAddress` for the multisig join.

mod sanitize;
mod sentinel;
mod store;

pub use sanitize::*;
pub use sentinel::*;
pub use store::*;
