//! # Cursor Engine
//!
//! Bidirectional, anchor-exclusive paging over the chain-state
//! collections. Every entity exposes exactly two operations:
//!
//! - `from(anchor, n)` — up to `n` documents strictly preceding the
//!   anchor in the entity's composite sort order, newest first.
//! - `since(anchor, n)` — up to `n` documents strictly following the
//!   anchor, also returned newest first.
//!
//! An anchor is an absolute keyword (`latest`/`earliest`, or their
//! quantity analogues `most`/`least`), a natural key (height, hash,
//! mosaic or namespace id, address, public key), or an internal
//! document id. Anchors resolve to a tuple aligned with the sort key;
//! the range condition is the lexicographic OR-of-ANDs walk over that
//! tuple, so pages straddle ties in the primary field without
//! duplicates and never contain the anchor itself.
//!
//! The engine is stateless: each call borrows a store connection,
//! executes one bounded query, post-processes the page, and returns.

mod accounts;
mod blocks;
mod engine;
mod error;
mod mosaics;
mod namespaces;
mod transactions;
mod types;

pub use accounts::*;
pub use blocks::*;
pub use engine::{range_condition, sort_document};
pub use error::*;
pub use mosaics::*;
pub use namespaces::*;
pub use transactions::*;
pub use types::*;
