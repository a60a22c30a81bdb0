//! # Network Descriptor
//!
//! The gateway serves exactly one network at a time, selected by
//! `network.name` in the configuration. The descriptor carries the
//! address version byte and performs public-key to address derivation,
//! which lets account routes accept a public key wherever an address is
//! expected.

use ripemd::Ripemd160;
use sha3::{Digest, Sha3_256};

use crate::keys::{Address, NamespaceId, PublicKey};

/// Namespace id aliasing the network currency mosaic.
pub const CURRENCY_NAMESPACE_ID: NamespaceId = NamespaceId(0x85BB_EA6C_C462_B244);

/// Namespace id aliasing the network harvesting mosaic.
pub const HARVEST_NAMESPACE_ID: NamespaceId = NamespaceId(0x9412_99B2_B7E1_291C);

/// The networks a gateway instance can front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Mijin,
    MijinTest,
    Public,
    PublicTest,
}

impl NetworkKind {
    /// Resolve a configured network name. Unknown names are a startup
    /// error, not a fallback.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mijin" => Some(NetworkKind::Mijin),
            "mijinTest" => Some(NetworkKind::MijinTest),
            "public" => Some(NetworkKind::Public),
            "publicTest" => Some(NetworkKind::PublicTest),
            _ => None,
        }
    }

    /// Leading version byte of every address on this network.
    pub fn version_byte(self) -> u8 {
        match self {
            NetworkKind::Mijin => 0x60,
            NetworkKind::MijinTest => 0x90,
            NetworkKind::Public => 0x68,
            NetworkKind::PublicTest => 0x98,
        }
    }

    /// Derive the 25-byte address owned by `public_key` on this network.
    ///
    /// Layout: version byte, then ripemd160(sha3-256(key)), then the
    /// first four bytes of sha3-256 over the preceding 21 bytes.
    pub fn public_key_to_address(self, public_key: &PublicKey) -> Address {
        let key_hash = Sha3_256::digest(public_key.0);
        let ripe = Ripemd160::digest(key_hash);

        let mut address = [0u8; 25];
        address[0] = self.version_byte();
        address[1..21].copy_from_slice(&ripe);

        let checksum = Sha3_256::digest(&address[..21]);
        address[21..25].copy_from_slice(&checksum[..4]);
        Address(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_resolve() {
        assert_eq!(NetworkKind::from_name("mijin"), Some(NetworkKind::Mijin));
        assert_eq!(NetworkKind::from_name("mijinTest"), Some(NetworkKind::MijinTest));
        assert_eq!(NetworkKind::from_name("public"), Some(NetworkKind::Public));
        assert_eq!(NetworkKind::from_name("publicTest"), Some(NetworkKind::PublicTest));
        assert_eq!(NetworkKind::from_name("devnet"), None);
    }

    #[test]
    fn derived_address_carries_version_byte() {
        let key = PublicKey([0x11; 32]);
        let address = NetworkKind::PublicTest.public_key_to_address(&key);
        assert_eq!(address.0[0], 0x98);
    }

    #[test]
    fn derivation_is_deterministic_and_network_sensitive() {
        let key = PublicKey([0x42; 32]);
        let a = NetworkKind::Public.public_key_to_address(&key);
        let b = NetworkKind::Public.public_key_to_address(&key);
        let c = NetworkKind::Mijin.public_key_to_address(&key);
        assert_eq!(a, b);
        assert_ne!(a, c);
        // same key hash, different version byte and checksum
        assert_eq!(a.0[1..21], c.0[1..21]);
    }

    #[test]
    fn checksum_matches_leading_bytes() {
        use sha3::{Digest, Sha3_256};

        let key = PublicKey([0x07; 32]);
        let address = NetworkKind::Public.public_key_to_address(&key);
        let checksum = Sha3_256::digest(&address.0[..21]);
        assert_eq!(address.0[21..25], checksum[..4]);
    }
}
