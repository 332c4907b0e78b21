//! Bech32 address codec and address-class predicates.
//!
//! Addresses on the wire are bech32 strings over a 32-byte public key. The
//! human-readable part is a network property, configured once at startup.
//! Smart-contract accounts are recognizable from the pubkey alone: the chain
//! reserves a zero prefix for them.

use bech32::{FromBase32, ToBase32, Variant};
use thiserror::Error;

/// Length of a raw account public key, in bytes.
pub const PUBKEY_LENGTH: usize = 32;

/// Number of leading zero bytes that mark a smart-contract public key.
pub const CONTRACT_PUBKEY_ZERO_PREFIX_LENGTH: usize = 8;

/// Errors raised by the address codec.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The string is not valid bech32.
    #[error("Cannot decode address: {0}")]
    DecodeFailed(String),

    /// The human-readable part does not match the configured network.
    #[error("Unexpected address prefix: expected {expected}, found {found}")]
    UnexpectedHrp {
        /// HRP the converter was configured with.
        expected: String,
        /// HRP found on the decoded address.
        found: String,
    },

    /// The decoded payload is not a 32-byte public key.
    #[error("Unexpected public key length: {0}")]
    UnexpectedLength(usize),
}

/// Converts between bech32 addresses and raw public keys.
///
/// One converter is built per deployment, with the network's human-readable
/// part, and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct AddressConverter {
    hrp: String,
}

impl AddressConverter {
    pub fn new(hrp: &str) -> Self {
        Self {
            hrp: hrp.to_string(),
        }
    }

    /// Decode a bech32 address into its 32-byte public key.
    pub fn decode(&self, address: &str) -> Result<Vec<u8>, AddressError> {
        let (hrp, data, _variant) =
            bech32::decode(address).map_err(|e| AddressError::DecodeFailed(e.to_string()))?;

        if hrp != self.hrp {
            return Err(AddressError::UnexpectedHrp {
                expected: self.hrp.clone(),
                found: hrp,
            });
        }

        let pubkey = Vec::<u8>::from_base32(&data)
            .map_err(|e| AddressError::DecodeFailed(e.to_string()))?;

        if pubkey.len() != PUBKEY_LENGTH {
            return Err(AddressError::UnexpectedLength(pubkey.len()));
        }

        Ok(pubkey)
    }

    /// Encode a 32-byte public key into a bech32 address.
    pub fn encode(&self, pubkey: &[u8]) -> Result<String, AddressError> {
        if pubkey.len() != PUBKEY_LENGTH {
            return Err(AddressError::UnexpectedLength(pubkey.len()));
        }

        bech32::encode(&self.hrp, pubkey.to_base32(), Variant::Bech32)
            .map_err(|e| AddressError::DecodeFailed(e.to_string()))
    }
}

/// Whether a public key belongs to a smart-contract account.
///
/// The chain reserves pubkeys with a zero prefix for contracts; deployment
/// derives them from the deployer's address and nonce.
pub fn is_smart_contract_pubkey(pubkey: &[u8]) -> bool {
    pubkey.len() == PUBKEY_LENGTH
        && pubkey[..CONTRACT_PUBKEY_ZERO_PREFIX_LENGTH]
            .iter()
            .all(|byte| *byte == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{TEST_ADDRESS_ALICE, TEST_HRP};

    #[test]
    fn encode_decode_roundtrip() {
        let converter = AddressConverter::new(TEST_HRP);

        let mut pubkey = [0u8; PUBKEY_LENGTH];
        for (i, byte) in pubkey.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let address = converter.encode(&pubkey).unwrap();
        assert!(address.starts_with(TEST_HRP));
        assert_eq!(converter.decode(&address).unwrap(), pubkey.to_vec());
    }

    #[test]
    fn decode_then_encode_preserves_known_address() {
        let converter = AddressConverter::new(TEST_HRP);
        let pubkey = converter.decode(TEST_ADDRESS_ALICE).unwrap();
        assert_eq!(pubkey.len(), PUBKEY_LENGTH);
        assert_eq!(converter.encode(&pubkey).unwrap(), TEST_ADDRESS_ALICE);
    }

    #[test]
    fn decode_rejects_foreign_hrp() {
        let converter = AddressConverter::new("moa");
        let result = converter.decode(TEST_ADDRESS_ALICE);
        assert!(matches!(result, Err(AddressError::UnexpectedHrp { .. })));
    }

    #[test]
    fn decode_rejects_garbage() {
        let converter = AddressConverter::new(TEST_HRP);
        assert!(converter.decode("not a bech32 address").is_err());
    }

    #[test]
    fn contract_pubkeys_have_zero_prefix() {
        let mut pubkey = [0u8; PUBKEY_LENGTH];
        pubkey[PUBKEY_LENGTH - 1] = 0x2a;
        assert!(is_smart_contract_pubkey(&pubkey));

        pubkey[0] = 1;
        assert!(!is_smart_contract_pubkey(&pubkey));

        // Une clé tronquée n'est jamais un contrat
        assert!(!is_smart_contract_pubkey(&pubkey[..16]));
    }
}
