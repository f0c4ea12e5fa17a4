//! Per-vehicle key material lookup.
//!
//! Four logical stores live under one base directory, mirroring the layout
//! consumed by the run scripts:
//!
//! ```text
//! keys/<id>/p256.key          message-signing EC private key (PEM)
//! cert_keys/<id>/p256.key     certificate-issuing EC private key (PEM)
//! falcon_keys/<id>/falcon.key Falcon-512 private key (hex)
//! falcon_keys/<id>/falcon.pub Falcon-512 public key (hex)
//! ```
//!
//! Key material that is absent, malformed, or the wrong length is a fatal
//! setup error: callers propagate it to the run driver rather than limping
//! along with a partial identity.

use std::fs;
use std::path::{Path, PathBuf};

use p256::SecretKey;
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use pqcrypto_falcon::falcon512;
use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _};
use thiserror::Error;

use crate::fragment::VehicleId;

/// Errors raised while loading key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The PEM contents were not a usable EC private key.
    #[error("failed to parse EC private key {path}")]
    Pem { path: PathBuf },
    /// The hex contents could not be decoded.
    #[error("failed to decode hex key {path}: {source}")]
    Hex {
        path: PathBuf,
        #[source]
        source: hex::FromHexError,
    },
    /// The decoded key had an unexpected byte length.
    #[error("key {path} is {actual} bytes, expected {expected}")]
    WrongLength {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    /// The key bytes were rejected by the signature scheme.
    #[error("key {path} is not valid key material for its scheme")]
    Malformed { path: PathBuf },
}

/// Filesystem-backed key lookup, keyed by vehicle id.
#[derive(Clone, Debug)]
pub struct KeyStore {
    base: PathBuf,
}

impl KeyStore {
    /// Create a store rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self { Self { base: base.into() } }

    /// The message-signing key for `vehicle`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the key file is missing or unparseable.
    pub fn vehicle_signing_key(&self, vehicle: VehicleId) -> Result<SigningKey, KeyError> {
        self.load_ec_key(&self.ec_key_path("keys", vehicle))
    }

    /// The certificate-issuing key for `vehicle`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the key file is missing or unparseable.
    pub fn certificate_signing_key(&self, vehicle: VehicleId) -> Result<SigningKey, KeyError> {
        self.load_ec_key(&self.ec_key_path("cert_keys", vehicle))
    }

    /// The verification half of the message-signing key.
    ///
    /// The simulator derives public keys from the same key files both sides
    /// share; a deployed stack would distribute certificates instead.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the key file is missing or unparseable.
    pub fn vehicle_verifying_key(&self, vehicle: VehicleId) -> Result<VerifyingKey, KeyError> {
        Ok(VerifyingKey::from(&self.vehicle_signing_key(vehicle)?))
    }

    /// The verification half of the certificate-issuing key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the key file is missing or unparseable.
    pub fn certificate_verifying_key(&self, vehicle: VehicleId) -> Result<VerifyingKey, KeyError> {
        Ok(VerifyingKey::from(&self.certificate_signing_key(vehicle)?))
    }

    /// The Falcon-512 private key for `vehicle` (transmit side only).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the file is missing, not hex, or not
    /// exactly the scheme's secret-key length.
    pub fn falcon_secret_key(&self, vehicle: VehicleId) -> Result<falcon512::SecretKey, KeyError> {
        let path = self.falcon_path(vehicle, "falcon.key");
        let bytes = self.load_hex_key(&path, falcon512::secret_key_bytes())?;
        falcon512::SecretKey::from_bytes(&bytes).map_err(|_| KeyError::Malformed { path })
    }

    /// The Falcon-512 public key for `vehicle` (verifier side).
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the file is missing, not hex, or not
    /// exactly the scheme's public-key length.
    pub fn falcon_public_key(&self, vehicle: VehicleId) -> Result<falcon512::PublicKey, KeyError> {
        let path = self.falcon_path(vehicle, "falcon.pub");
        let bytes = self.load_hex_key(&path, falcon512::public_key_bytes())?;
        falcon512::PublicKey::from_bytes(&bytes).map_err(|_| KeyError::Malformed { path })
    }

    /// Base directory this store resolves key paths against.
    #[must_use]
    pub fn base(&self) -> &Path { &self.base }

    fn ec_key_path(&self, store: &str, vehicle: VehicleId) -> PathBuf {
        self.base.join(store).join(vehicle.to_string()).join("p256.key")
    }

    fn falcon_path(&self, vehicle: VehicleId, file: &str) -> PathBuf {
        self.base.join("falcon_keys").join(vehicle.to_string()).join(file)
    }

    fn load_ec_key(&self, path: &Path) -> Result<SigningKey, KeyError> {
        let pem = fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // OpenSSL-era tooling emits SEC1 "EC PRIVATE KEY" PEM; newer tooling
        // emits PKCS#8. Accept either.
        let secret = match SecretKey::from_pkcs8_pem(&pem) {
            Ok(secret) => secret,
            Err(_) => SecretKey::from_sec1_pem(&pem).map_err(|_| KeyError::Pem {
                path: path.to_path_buf(),
            })?,
        };
        Ok(SigningKey::from(secret))
    }

    fn load_hex_key(&self, path: &Path, expected: usize) -> Result<Vec<u8>, KeyError> {
        let contents = fs::read_to_string(path).map_err(|source| KeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bytes = hex::decode(contents.trim()).map_err(|source| KeyError::Hex {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.len() != expected {
            return Err(KeyError::WrongLength {
                path: path.to_path_buf(),
                expected,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}
