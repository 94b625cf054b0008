//! Cache Fingerprints
//!
//! SHA-256 keys for both caches. Every field is length-prefixed before
//! hashing, so no two distinct inputs share an encoding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex characters kept from a template digest
const TEMPLATE_HASH_LEN: usize = 16;

/// Inputs that identify one per-prompt analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintInput<'a> {
    pub prompt: &'a str,
    pub date: &'a str,
    pub project: Option<&'a str>,
    pub model: &'a str,
    pub schema_id: &'a str,
    pub template_hash: &'a str,
}

/// Key of a per-prompt cache entry, plus the fields `get` validates against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFingerprint {
    pub key: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub model: String,
    pub schema_id: String,
}

impl PromptFingerprint {
    /// Compute the fingerprint of one prompt analysis.
    pub fn compute(input: FingerprintInput<'_>) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, input.prompt.as_bytes());
        update_field(&mut hasher, input.date.as_bytes());
        match input.project {
            Some(project) => {
                hasher.update([1u8]);
                update_field(&mut hasher, project.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        update_field(&mut hasher, input.model.as_bytes());
        update_field(&mut hasher, input.schema_id.as_bytes());
        update_field(&mut hasher, input.template_hash.as_bytes());

        Self {
            key: format!("{:x}", hasher.finalize()),
            date: input.date.to_string(),
            project: input.project.map(str::to_string),
            model: input.model.to_string(),
            schema_id: input.schema_id.to_string(),
        }
    }
}

/// Key of a whole-batch cache entry.
///
/// The prompt list is sorted first, so the same set of prompts in any order
/// maps to the same key.
pub fn batch_fingerprint(prompts: &[String], model: &str, template_hash: &str) -> String {
    let mut sorted: Vec<&str> = prompts.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update((sorted.len() as u64).to_le_bytes());
    for prompt in sorted {
        update_field(&mut hasher, prompt.as_bytes());
    }
    update_field(&mut hasher, model.as_bytes());
    update_field(&mut hasher, template_hash.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Short digest of an instruction template.
pub fn template_hash(template: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(template.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..TEMPLATE_HASH_LEN].to_string()
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
