//! Shared helpers for integration tests: ephemeral key trees and traces.
#![allow(dead_code)] // not every test binary uses every helper

use std::fs;
use std::path::{Path, PathBuf};

use p256::SecretKey;
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use pqcrypto_falcon::falcon512;
use pqcrypto_traits::sign::{PublicKey as _, SecretKey as _};
use pqv2v::fragment::VehicleId;
use pqv2v::keys::KeyStore;
use pqv2v::signing::{SignatureScheme, Signer, SignerOptions};
use pqv2v::trace::{Trace, TracePoint};
use pqv2v::vehicle::Vehicle;

/// Self-cleaning per-test directory under the system temp dir.
pub struct TestDir {
    pub path: PathBuf,
}

impl TestDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("pqv2v-{label}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create test dir");
        Self { path }
    }

    pub fn keystore(&self) -> KeyStore { KeyStore::new(&self.path) }
}

impl Drop for TestDir {
    fn drop(&mut self) { let _ = fs::remove_dir_all(&self.path); }
}

/// Generate the full key tree for one vehicle: both EC keys, and the Falcon
/// pair when requested.
pub fn provision_keys(base: &Path, id: VehicleId, with_falcon: bool) {
    write_ec_key(&base.join("keys").join(id.to_string()));
    write_ec_key(&base.join("cert_keys").join(id.to_string()));

    if with_falcon {
        let dir = base.join("falcon_keys").join(id.to_string());
        fs::create_dir_all(&dir).expect("create falcon key dir");
        let (public, secret) = falcon512::keypair();
        fs::write(dir.join("falcon.key"), hex::encode(secret.as_bytes()))
            .expect("write falcon secret key");
        fs::write(dir.join("falcon.pub"), hex::encode(public.as_bytes()))
            .expect("write falcon public key");
    }
}

fn write_ec_key(dir: &Path) {
    fs::create_dir_all(dir).expect("create key dir");
    let secret = SecretKey::random(&mut rand::thread_rng());
    let pem = secret.to_pkcs8_pem(LineEnding::LF).expect("encode key as PKCS#8 PEM");
    fs::write(dir.join("p256.key"), pem.as_bytes()).expect("write key file");
}

/// Write a straight-line northbound trace with `rows` samples.
pub fn write_trace(base: &Path, id: VehicleId, rows: usize) {
    let dir = base.join("trace_files");
    fs::create_dir_all(&dir).expect("create trace dir");
    let contents: String = (0..rows)
        .map(|row| format!("{},-77.6800,152.0\n", 43.0800 + row as f64 * 0.0001))
        .collect();
    fs::write(dir.join(format!("{id}.csv")), contents).expect("write trace file");
}

/// A synthetic in-memory trace, avoiding the filesystem entirely.
pub fn synthetic_trace(id: VehicleId, rows: usize) -> Trace {
    let rows = (0..rows)
        .map(|row| TracePoint {
            latitude: 43.08 + row as f32 * 0.0001,
            longitude: -77.68,
            elevation: 152.0,
        })
        .collect();
    Trace::from_rows(id, rows)
}

pub fn options(scheme: SignatureScheme) -> SignerOptions {
    SignerOptions {
        scheme,
        ..SignerOptions::default()
    }
}

/// Provision keys and build a ready-to-sign vehicle in one step.
pub fn vehicle(dir: &TestDir, id: VehicleId, scheme: SignatureScheme, rows: usize) -> Vehicle {
    provision_keys(&dir.path, id, scheme == SignatureScheme::Falcon);
    let signer = Signer::load(id, &dir.keystore(), options(scheme)).expect("load signer");
    Vehicle::from_parts(signer, synthetic_trace(id, rows))
}
