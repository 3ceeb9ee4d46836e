//! Deterministic content fingerprints used as index record ids.
//!
//! Records are upserted by fingerprint, so re-running ingestion overwrites
//! instead of duplicating. Fingerprints are pure functions of their input:
//! no salt, no timestamps.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::IngestError;

/// Block size for streaming whole files through the hash.
const FILE_BLOCK_SIZE: usize = 4096;

/// Hash algorithm backing the fingerprint. Parsed from configuration at
/// startup; an unrecognized name is rejected before any source is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(IngestError::Config(format!(
                "unsupported hash algorithm: {other}"
            ))),
        }
    }
}

enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Hasher::Md5(Md5::new()),
            HashAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(h) => format!("{:x}", h.finalize()),
            Hasher::Sha1(h) => format!("{:x}", h.finalize()),
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Sha512(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Fingerprint a multi-field key: each field's string form is hashed in the
/// given order as UTF-8. Lowercase hex digest.
pub fn fingerprint_fields(algorithm: HashAlgorithm, fields: &[&str]) -> String {
    let mut hasher = Hasher::new(algorithm);
    for field in fields {
        hasher.update(field.as_bytes());
    }
    hasher.finalize_hex()
}

/// Fingerprint a whole file by streaming it through the hash in fixed-size
/// blocks. Two byte-identical files yield the same digest regardless of name.
pub fn fingerprint_file(
    algorithm: HashAlgorithm,
    path: impl AsRef<Path>,
) -> Result<String, IngestError> {
    let mut file = File::open(path.as_ref())?;
    let mut hasher = Hasher::new(algorithm);
    let mut block = [0u8; FILE_BLOCK_SIZE];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            break;
        }
        hasher.update(&block[..read]);
    }
    Ok(hasher.finalize_hex())
}
