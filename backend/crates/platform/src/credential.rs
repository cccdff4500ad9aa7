//! Password Credential Codec
//!
//! Derives and verifies password credentials with Argon2id (memory-hard,
//! recommended by OWASP) and a self-describing encoded format:
//!
//! ```text
//! $argon2id$v=19$m=102400,t=2,p=8$<base64 salt>$<base64 hash>
//! ```
//!
//! The cost parameters travel inside the credential, so verification always
//! re-derives with the parameters the credential was created with. A legacy
//! fixed-layout format (plain base64 of salt‖hash, implicit default
//! parameters) is still accepted so previously stored credentials keep
//! verifying.
//!
//! ## Contract
//! - `hash` never persists the plaintext and salts every call freshly
//! - `verify` never panics or errors on malformed input; anything that does
//!   not decode cleanly is simply a non-match

use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use thiserror::Error;

use crate::crypto::constant_time_eq;

/// Marker prefix of the self-describing format
const STANDARD_TAG: &str = "$argon2id$";

// ============================================================================
// Parameters
// ============================================================================

/// Cost parameters and layout for credential derivation
///
/// Passed into [`PasswordCredentialCodec`] at construction instead of living
/// in ambient statics, so tests can run with cheap costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Time cost (iterations)
    pub iterations: u32,
    /// Parallelism (lanes)
    pub parallelism: u32,
    /// Salt length in bytes
    pub salt_len: usize,
    /// Derived hash length in bytes
    pub hash_len: usize,
}

impl Default for CredentialParams {
    /// Production defaults: m=102400 KiB (100 MiB), t=2, p=8,
    /// 16-byte salt, 32-byte hash.
    ///
    /// These must not change casually: the legacy credential format has no
    /// embedded parameters and re-derives with whatever is configured here.
    fn default() -> Self {
        Self {
            memory_kib: 102_400,
            iterations: 2,
            parallelism: 8,
            salt_len: 16,
            hash_len: 32,
        }
    }
}

impl CredentialParams {
    /// Cheap parameters for tests and local development.
    ///
    /// Far too weak for production use.
    pub fn low_cost() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            ..Self::default()
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by credential derivation
///
/// Only `hash` returns these; a failure here means an invalid parameter
/// combination, i.e. a configuration defect. `verify` contains all decoding
/// and derivation failures and resolves them to `false`.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The derivation library rejected the parameter combination
    #[error("Credential derivation failed: {0}")]
    DerivationFailed(String),
}

// ============================================================================
// Parsed credential (decode dispatch)
// ============================================================================

/// Result of decoding a stored credential string
///
/// The two storage formats map to the two derivation paths of
/// [`PasswordCredentialCodec::verify`]; anything else is `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedCredential {
    /// Self-describing format with embedded cost parameters
    Standard {
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        salt: Vec<u8>,
        hash: Vec<u8>,
    },
    /// Fixed-layout salt‖hash, parameters implied by configuration
    Legacy { salt: Vec<u8>, hash: Vec<u8> },
    /// Neither format decoded cleanly
    Unrecognized,
}

impl ParsedCredential {
    /// Decode a stored credential, choosing the parse path by the prefix tag
    fn parse(credential: &str, layout: &CredentialParams) -> Self {
        if credential.starts_with(STANDARD_TAG) {
            Self::parse_standard(credential).unwrap_or(Self::Unrecognized)
        } else {
            Self::parse_legacy(credential, layout).unwrap_or(Self::Unrecognized)
        }
    }

    /// Parse `$argon2id$v=19$m=..,t=..,p=..$salt$hash`
    fn parse_standard(credential: &str) -> Option<Self> {
        // The leading '$' produces an empty first field, giving exactly six
        let fields: Vec<&str> = credential.split('$').collect();
        if fields.len() != 6 || !fields[0].is_empty() || fields[1] != "argon2id" {
            return None;
        }

        // Version field is carried but not enforced; every writer of this
        // format has only ever produced v=19.
        if !fields[2].starts_with("v=") {
            return None;
        }

        let (memory_kib, iterations, parallelism) = Self::parse_cost_params(fields[3])?;

        let salt = decode_base64_lenient(fields[4])?;
        let hash = decode_base64_lenient(fields[5])?;
        if salt.is_empty() || hash.is_empty() {
            return None;
        }

        Some(Self::Standard {
            memory_kib,
            iterations,
            parallelism,
            salt,
            hash,
        })
    }

    /// Parse the `m=..,t=..,p=..` cost parameter field
    fn parse_cost_params(field: &str) -> Option<(u32, u32, u32)> {
        let parts: Vec<&str> = field.split(',').collect();
        if parts.len() != 3 {
            return None;
        }

        let memory_kib = parts[0].strip_prefix("m=")?.parse().ok()?;
        let iterations = parts[1].strip_prefix("t=")?.parse().ok()?;
        let parallelism = parts[2].strip_prefix("p=")?.parse().ok()?;

        Some((memory_kib, iterations, parallelism))
    }

    /// Parse the legacy layout: plain base64 of salt‖hash with fixed sizes
    fn parse_legacy(credential: &str, layout: &CredentialParams) -> Option<Self> {
        let decoded = decode_base64_lenient(credential)?;
        if decoded.len() != layout.salt_len + layout.hash_len {
            return None;
        }

        let (salt, hash) = decoded.split_at(layout.salt_len);
        Some(Self::Legacy {
            salt: salt.to_vec(),
            hash: hash.to_vec(),
        })
    }
}

/// Decode base64 tolerating the URL-safe alphabet and missing padding
///
/// Stored credentials come from multiple writers; some emitted `-`/`_` and
/// stripped padding. Normalize to the standard alphabet and restore padding
/// before decoding.
fn decode_base64_lenient(s: &str) -> Option<Vec<u8>> {
    let mut normalized = s.replace('-', "+").replace('_', "/");

    match normalized.len() % 4 {
        0 => {}
        2 => normalized.push_str("=="),
        3 => normalized.push('='),
        _ => return None,
    }

    general_purpose::STANDARD.decode(&normalized).ok()
}

// ============================================================================
// Codec
// ============================================================================

/// Turns a plaintext password into a storable credential and confirms a
/// plaintext against a stored credential, without ever persisting the
/// plaintext.
///
/// Derivation is CPU- and memory-bound (the default parameters use a
/// ~100 MiB working set); callers on async executors should wrap calls in a
/// blocking task.
#[derive(Debug, Clone, Default)]
pub struct PasswordCredentialCodec {
    params: CredentialParams,
}

impl PasswordCredentialCodec {
    pub fn new(params: CredentialParams) -> Self {
        Self { params }
    }

    /// The configured derivation parameters
    pub fn params(&self) -> &CredentialParams {
        &self.params
    }

    /// Hash a password into the self-describing encoded format
    ///
    /// Generates a fresh random salt every call, so two hashes of the same
    /// password never compare equal as strings.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt = vec![0u8; self.params.salt_len];
        OsRng.fill_bytes(&mut salt);

        let derived = derive(
            password.as_bytes(),
            &salt,
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            self.params.hash_len,
        )
        .map_err(|e| CredentialError::DerivationFailed(e.to_string()))?;

        Ok(format!(
            "$argon2id$v=19$m={},t={},p={}${}${}",
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            general_purpose::STANDARD.encode(&salt),
            general_purpose::STANDARD.encode(&derived),
        ))
    }

    /// Verify a password against a stored credential
    ///
    /// Never fails: malformed or unrecognized credentials, bad base64,
    /// non-numeric parameters and length mismatches all return `false`.
    pub fn verify(&self, password: &str, credential: &str) -> bool {
        let (memory_kib, iterations, parallelism, salt, expected) =
            match ParsedCredential::parse(credential, &self.params) {
                ParsedCredential::Standard {
                    memory_kib,
                    iterations,
                    parallelism,
                    salt,
                    hash,
                } => (memory_kib, iterations, parallelism, salt, hash),
                // Legacy credentials carry no parameters; re-derive with the
                // configured defaults, exactly as they were written.
                ParsedCredential::Legacy { salt, hash } => (
                    self.params.memory_kib,
                    self.params.iterations,
                    self.params.parallelism,
                    salt,
                    hash,
                ),
                ParsedCredential::Unrecognized => return false,
            };

        let derived = match derive(
            password.as_bytes(),
            &salt,
            memory_kib,
            iterations,
            parallelism,
            expected.len(),
        ) {
            Ok(bytes) => bytes,
            // Parameters extracted from the credential can be arbitrary;
            // a rejected combination is a non-match, not a fault.
            Err(_) => return false,
        };

        constant_time_eq(&derived, &expected)
    }
}

/// Run the Argon2id derivation with explicit parameters
fn derive(
    password: &[u8],
    salt: &[u8],
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    output_len: usize,
) -> Result<Vec<u8>, argon2::Error> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let params = Params::new(memory_kib, iterations, parallelism, Some(output_len))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = vec![0u8; output_len];
    argon2.hash_password_into(password, salt, &mut output)?;
    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================
