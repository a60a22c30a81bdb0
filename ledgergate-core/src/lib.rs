// LedgerGate Core Library
//
// Shared foundation for the gateway crates: configuration loading, the
// typed natural keys clients may supply in URLs (heights, hashes, mosaic
// and namespace ids, addresses, public keys), and the network descriptor
// used to derive addresses from public keys.
//
// Everything in this crate is plain data; no I/O beyond configuration
// file access happens here.

mod config; // Configuration structures, loading, and validation
mod keys;   // Typed natural keys and their parsers
mod network; // Network descriptor and address derivation

pub use config::*;
pub use keys::*;
pub use network::*;
