//! The signature scheme selector carried on every fragment.

use bincode::{Decode, Encode};

/// Signing algorithm family protecting a message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode)]
pub enum SignatureScheme {
    /// ECDSA over P-256 with a SHA-256 pre-hash; the signature always fits
    /// in a single fragment.
    #[default]
    Ecdsa,
    /// Falcon-512 lattice signatures over the raw to-be-signed bytes; the
    /// signature spans several fragments.
    Falcon,
}

impl SignatureScheme {
    /// Parse a configuration label, case-insensitively.
    ///
    /// Unknown labels fall back to [`SignatureScheme::Ecdsa`], the scheme a
    /// config file without a `signatureScheme` entry gets.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        if label.eq_ignore_ascii_case("falcon") {
            Self::Falcon
        } else {
            Self::Ecdsa
        }
    }

    /// Stable numeric code used in metrics output.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Ecdsa => 0,
            Self::Falcon => 1,
        }
    }

    /// Human-readable scheme name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ecdsa => "ECDSA",
            Self::Falcon => "Falcon",
        }
    }
}

impl std::fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
