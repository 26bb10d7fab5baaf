use crate::error::DerivationError;
use argon2::{Algorithm, Argon2, Params, Version};
use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

pub type DerivedKey = Zeroizing<Vec<u8>>;

pub const MIN_MEMORY_MIB: u32 = 8;
pub const MIN_OUTPUT_BYTES: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 600_000;

const MIN_SALT_LEN: usize = 8;

/// Which primitive turns `(master, salt)` into key material.
///
/// Persist this next to the other cost parameters: the two algorithms give
/// different keys for identical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KdfAlgorithm {
    #[default]
    Argon2id,
    /// Deprecated. PBKDF2-HMAC-SHA256 with a fixed iteration count.
    Pbkdf2Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub time_cost: u32,
    pub memory_mib: u32,
    pub parallelism: u32,
    pub output_bytes: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id,
            time_cost: 3,
            memory_mib: 128,
            parallelism: 1,
            output_bytes: 32,
        }
    }
}

impl KdfParams {
    pub fn memory_kib(&self) -> Result<u32, DerivationError> {
        self.memory_mib.checked_mul(1024).ok_or_else(|| {
            DerivationError::InvalidParams(format!(
                "memory cost {} MiB does not fit in KiB",
                self.memory_mib
            ))
        })
    }

    pub fn validate(&self) -> Result<(), DerivationError> {
        if self.time_cost < 1 {
            return Err(DerivationError::InvalidParams(
                "time cost must be >= 1".to_string(),
            ));
        }
        if self.memory_mib < MIN_MEMORY_MIB {
            return Err(DerivationError::InvalidParams(format!(
                "memory cost {} MiB is below the {MIN_MEMORY_MIB} MiB floor",
                self.memory_mib
            )));
        }
        self.memory_kib()?;
        if self.parallelism < 1 {
            return Err(DerivationError::InvalidParams(
                "parallelism must be >= 1".to_string(),
            ));
        }
        if self.output_bytes < MIN_OUTPUT_BYTES {
            return Err(DerivationError::InvalidParams(format!(
                "output length {} is below {MIN_OUTPUT_BYTES} bytes",
                self.output_bytes
            )));
        }
        Ok(())
    }
}

/// Derives key material on the blocking pool so the caller's executor stays
/// responsive. Inputs are copied into zeroizing buffers for the worker.
pub async fn derive(
    master: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<DerivedKey, DerivationError> {
    params.validate()?;

    let master = Zeroizing::new(master.to_vec());
    let salt = Zeroizing::new(salt.to_vec());
    let params = *params;

    tokio::task::spawn_blocking(move || derive_blocking(&master, &salt, &params))
        .await
        .map_err(|e| DerivationError::Unavailable(format!("derivation task failed: {e}")))?
}

pub fn derive_blocking(
    master: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<DerivedKey, DerivationError> {
    params.validate()?;

    tracing::debug!(
        algorithm = ?params.algorithm,
        time_cost = params.time_cost,
        memory_mib = params.memory_mib,
        parallelism = params.parallelism,
        output_bytes = params.output_bytes,
        "deriving key"
    );

    match params.algorithm {
        KdfAlgorithm::Argon2id => derive_argon2id(master, salt, params),
        KdfAlgorithm::Pbkdf2Sha256 => {
            tracing::warn!("using deprecated PBKDF2-SHA256 key derivation");
            Ok(derive_pbkdf2(master, salt, params.output_bytes))
        }
    }
}

fn derive_argon2id(
    master: &[u8],
    salt_input: &[u8],
    config: &KdfParams,
) -> Result<DerivedKey, DerivationError> {
    let params = Params::new(
        config.memory_kib()?,
        config.time_cost,
        config.parallelism,
        Some(config.output_bytes),
    )
    .map_err(|e| DerivationError::InvalidParams(format!("argon2 rejected parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    // Argon2 refuses salts under 8 bytes; those are stretched through BLAKE2b.
    let salt: Zeroizing<Vec<u8>> = if salt_input.len() >= MIN_SALT_LEN {
        Zeroizing::new(salt_input.to_vec())
    } else {
        let mut hasher = Blake2b512::new();
        hasher.update(salt_input);
        Zeroizing::new(hasher.finalize().to_vec())
    };

    let mut output = Zeroizing::new(vec![0u8; config.output_bytes]);
    argon2
        .hash_password_into(master, &salt, &mut output)
        .map_err(|e| DerivationError::Unavailable(format!("argon2id derivation failed: {e}")))?;

    Ok(output)
}

fn derive_pbkdf2(master: &[u8], salt: &[u8], output_bytes: usize) -> DerivedKey {
    let mut output = Zeroizing::new(vec![0u8; output_bytes]);
    pbkdf2::pbkdf2_hmac::<Sha256>(master, salt, PBKDF2_ITERATIONS, &mut output);
    output
}
