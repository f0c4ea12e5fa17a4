//! Fixed-capacity byte buffers with an enforced valid length.
//!
//! The wire record embeds signature material in fixed-size arrays so every
//! fragment occupies a predictable datagram footprint. Only the first `len`
//! bytes are meaningful; the zero-filled tail is transported but never
//! interpreted. [`BoundedBytes`] makes that an invariant of the type rather
//! than a convention: the valid range is the only range callers can observe.

use bincode::de::{BorrowDecoder, Decoder};
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{BorrowDecode, Decode, Encode};

/// Capacity of the signature chunk carried by a single fragment, in bytes.
pub const MAX_SIGNATURE_FRAGMENT_SIZE: usize = 512;

/// Capacity of the certificate signature buffer (a DER-encoded ECDSA P-256
/// signature is at most 72 bytes).
pub const MAX_CERTIFICATE_SIGNATURE_SIZE: usize = 72;

/// One fragment's share of a message signature.
pub type SignatureChunk = BoundedBytes<MAX_SIGNATURE_FRAGMENT_SIZE>;

/// The issuer signature over the embedded certificate.
pub type CertificateSignature = BoundedBytes<MAX_CERTIFICATE_SIGNATURE_SIZE>;

/// Fixed-capacity byte buffer that tracks how many leading bytes are valid.
///
/// # Examples
///
/// ```
/// use pqv2v::fragment::SignatureChunk;
/// let chunk = SignatureChunk::copy_from(&[1, 2, 3]);
/// assert_eq!(chunk.as_slice(), &[1, 2, 3]);
/// assert_eq!(chunk.len(), 3);
/// ```
#[derive(Clone, Copy)]
pub struct BoundedBytes<const CAP: usize> {
    bytes: [u8; CAP],
    len: u16,
}

impl<const CAP: usize> BoundedBytes<CAP> {
    /// Buffer capacity in bytes.
    pub const CAPACITY: usize = CAP;

    /// An empty buffer with a zero-filled backing array.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: [0; CAP],
            len: 0,
        }
    }

    /// Copy `source` into a fresh buffer.
    ///
    /// # Panics
    ///
    /// Panics when `source` exceeds the capacity. Producing an oversized
    /// chunk is a contract violation on the producing side, not a condition
    /// the wire layer recovers from.
    #[must_use]
    pub fn copy_from(source: &[u8]) -> Self {
        assert!(
            source.len() <= CAP,
            "chunk of {} bytes exceeds capacity {CAP}",
            source.len(),
        );
        let mut bytes = [0; CAP];
        bytes[..source.len()].copy_from_slice(source);
        #[expect(clippy::cast_possible_truncation, reason = "CAP fits in u16")]
        let len = source.len() as u16;
        Self { bytes, len }
    }

    /// Borrow the valid prefix. The zero-filled tail is never exposed.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] { &self.bytes[..usize::from(self.len)] }

    /// Number of valid bytes.
    #[must_use]
    pub fn len(&self) -> usize { usize::from(self.len) }

    /// Whether the buffer holds no valid bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len == 0 }
}

impl<const CAP: usize> Default for BoundedBytes<CAP> {
    fn default() -> Self { Self::empty() }
}

impl<const CAP: usize> std::fmt::Debug for BoundedBytes<CAP> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBytes")
            .field("len", &self.len)
            .field("bytes", &self.as_slice())
            .finish()
    }
}

/// Equality is defined over the valid prefix only; the transported padding
/// carries no meaning.
impl<const CAP: usize> PartialEq for BoundedBytes<CAP> {
    fn eq(&self, other: &Self) -> bool { self.as_slice() == other.as_slice() }
}

impl<const CAP: usize> Eq for BoundedBytes<CAP> {}

impl<const CAP: usize> Encode for BoundedBytes<CAP> {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.bytes.encode(encoder)?;
        self.len.encode(encoder)
    }
}

impl<Context, const CAP: usize> Decode<Context> for BoundedBytes<CAP> {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let bytes = <[u8; CAP]>::decode(decoder)?;
        let len = u16::decode(decoder)?;
        if usize::from(len) > CAP {
            return Err(DecodeError::Other("bounded buffer length exceeds capacity"));
        }
        Ok(Self { bytes, len })
    }
}

impl<'de, Context, const CAP: usize> BorrowDecode<'de, Context> for BoundedBytes<CAP> {
    fn borrow_decode<D: BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        <Self as Decode<Context>>::decode(decoder)
    }
}
