//! Entry sizing dialects for key and signature vectors.
//!
//! The 2-bit entry size code of a key or signature vector header is
//! resolved to a byte width through one of two coexisting dialects. The
//! dialects are not wire-compatible with each other; a build picks one
//! by instantiating the encoder and decoder with the matching table
//! ([`CryptoScheme`] is the default).

/// Resolves the entry size codes of key and signature vector headers to
/// per-item byte widths.
///
/// Implementations are zero-sized tables; the codec types are generic
/// over this trait so that the dialect is fixed at construction.
pub trait EntrySizing {
    /// The byte width of one public key for the given size code,
    /// or `None` when the code is not valid for public keys.
    fn public_key_size(&self, code: u8) -> Option<usize>;

    /// The byte width of one signature item for the given size code,
    /// or `None` when the code is not valid for signatures.
    fn signature_size(&self, code: u8) -> Option<usize>;
}

/// Byte width of an Ed25519 public key.
pub const PUBKEY_SIZE_ED25519: usize = 32;
/// Byte width of an SLH-DSA-128f public key.
pub const PUBKEY_SIZE_SLH_128F: usize = 32;
/// Byte width of an SLH-DSA-192f public key.
pub const PUBKEY_SIZE_SLH_192F: usize = 48;
/// Byte width of an SLH-DSA-256f public key.
pub const PUBKEY_SIZE_SLH_256F: usize = 64;

/// Byte width of an Ed25519 signature.
pub const SIGNATURE_SIZE_ED25519: usize = 64;
/// Byte width of the signature hash item used by the SLH-DSA variants.
pub const SIGNATURE_HASH_SIZE_PQC: usize = 32;

/// The cryptographic scheme dialect: the size code names a signature
/// scheme (0 = Ed25519, 1-3 = SLH-DSA variants). Signature vectors for
/// the SLH-DSA schemes carry fixed-size signature hashes rather than
/// full signatures.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CryptoScheme;

impl EntrySizing for CryptoScheme {
    fn public_key_size(&self, code: u8) -> Option<usize> {
        match code {
            0 => Some(PUBKEY_SIZE_ED25519),
            1 => Some(PUBKEY_SIZE_SLH_128F),
            2 => Some(PUBKEY_SIZE_SLH_192F),
            3 => Some(PUBKEY_SIZE_SLH_256F),
            _ => None,
        }
    }

    fn signature_size(&self, code: u8) -> Option<usize> {
        match code {
            0 => Some(SIGNATURE_SIZE_ED25519),
            1 | 2 | 3 => Some(SIGNATURE_HASH_SIZE_PQC),
            _ => None,
        }
    }
}

/// The generic size class dialect: the size code names a raw item width
/// shared by keys and signatures, plus one oversized signature class for
/// full SLH-DSA signatures. Size code 3 is not valid for public keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass;

impl EntrySizing for SizeClass {
    fn public_key_size(&self, code: u8) -> Option<usize> {
        match code {
            0 => Some(32),
            1 => Some(64),
            2 => Some(128),
            _ => None,
        }
    }

    fn signature_size(&self, code: u8) -> Option<usize> {
        match code {
            0 => Some(32),
            1 => Some(64),
            2 => Some(128),
            3 => Some(29792),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_scheme_sizes() {
        let sizing = CryptoScheme;
        assert_eq!(sizing.public_key_size(0), Some(32));
        assert_eq!(sizing.public_key_size(1), Some(32));
        assert_eq!(sizing.public_key_size(2), Some(48));
        assert_eq!(sizing.public_key_size(3), Some(64));
        assert_eq!(sizing.public_key_size(4), None);

        assert_eq!(sizing.signature_size(0), Some(64));
        assert_eq!(sizing.signature_size(1), Some(32));
        assert_eq!(sizing.signature_size(2), Some(32));
        assert_eq!(sizing.signature_size(3), Some(32));
        assert_eq!(sizing.signature_size(4), None);
    }

    #[test]
    fn size_class_sizes() {
        let sizing = SizeClass;
        assert_eq!(sizing.public_key_size(0), Some(32));
        assert_eq!(sizing.public_key_size(1), Some(64));
        assert_eq!(sizing.public_key_size(2), Some(128));
        // code 3 is reserved for public keys in this dialect
        assert_eq!(sizing.public_key_size(3), None);

        assert_eq!(sizing.signature_size(2), Some(128));
        assert_eq!(sizing.signature_size(3), Some(29792));
    }
}
