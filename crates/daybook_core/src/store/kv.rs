//! Namespaced JSON key-value store with optional at-rest obfuscation.
//!
//! # Responsibility
//! - Serialize values to canonical JSON text and write them under the
//!   application namespace prefix.
//! - Keep the read path lenient: this store must tolerate data written by
//!   earlier, less disciplined app versions.
//!
//! # Invariants
//! - Write failures propagate; read-side decode problems degrade (logged)
//!   instead of crashing a caller.
//! - Encrypted values carry the `enc1:` marker; the marker is the single
//!   recognition point for ciphertext on reads.
//! - `clear` and `keys` never touch data outside the namespace prefix.

use super::{StorageMedium, StoreError, StoreResult};
use crate::crypto::CryptoCodec;
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Application-wide key prefix isolating this core's data from any
/// co-resident rows in the same medium.
pub const NAMESPACE_PREFIX: &str = "daybook:";

/// Envelope marker prefixed to every encrypted value.
pub const ENCRYPTED_MARKER: &str = "enc1:";

const SIZE_PREVIEW_CHARS: usize = 80;

/// Per-key slice of the storage size report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySizeEntry {
    /// Key with the namespace prefix stripped.
    pub key: String,
    /// Stored value size in bytes (as persisted, ciphertext included).
    pub bytes: usize,
    /// Short display form: decrypted where possible, raw text otherwise.
    pub preview: String,
}

/// Diagnostic storage breakdown; not used by business logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSizeReport {
    pub total_bytes: usize,
    /// Entries sorted descending by size.
    pub entries: Vec<KeySizeEntry>,
}

/// JSON key-value store over a pluggable raw-text medium.
pub struct KeyValueStore<M: StorageMedium> {
    medium: M,
    codec: CryptoCodec,
}

impl<M: StorageMedium> KeyValueStore<M> {
    pub fn new(medium: M) -> Self {
        Self::with_codec(medium, CryptoCodec::new())
    }

    /// Store with an explicit codec; hosts that provision their own secret
    /// use this constructor.
    pub fn with_codec(medium: M, codec: CryptoCodec) -> Self {
        Self { medium, codec }
    }

    fn namespaced(key: &str) -> String {
        format!("{NAMESPACE_PREFIX}{key}")
    }

    /// The underlying medium, for diagnostics and test instrumentation.
    pub fn medium_ref(&self) -> &M {
        &self.medium
    }

    /// Serializes `value` to JSON and writes it, optionally obfuscated.
    ///
    /// # Errors
    /// - [`StoreError::Write`] when the medium rejects the write.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, encrypt: bool) -> StoreResult<()> {
        let json = serde_json::to_string(value).map_err(|err| StoreError::Write {
            key: key.to_string(),
            source: super::MediumError::Backend(format!("serialization failed: {err}")),
        })?;

        let stored = if encrypt {
            format!("{ENCRYPTED_MARKER}{}", self.codec.encrypt(&json))
        } else {
            json
        };

        self.medium
            .write(&Self::namespaced(key), &stored)
            .map_err(|source| {
                error!("event=kv_set module=store status=error key={key} error={source}");
                StoreError::Write {
                    key: key.to_string(),
                    source,
                }
            })
    }

    /// Writes raw text verbatim under the namespaced key. Repair uses this
    /// to rewrite payloads without a serialize round.
    pub fn set_raw(&self, key: &str, text: &str) -> StoreResult<()> {
        self.medium
            .write(&Self::namespaced(key), text)
            .map_err(|source| StoreError::Write {
                key: key.to_string(),
                source,
            })
    }

    /// Reads the stored text verbatim, marker and all.
    pub fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        self.medium
            .read(&Self::namespaced(key))
            .map_err(|source| StoreError::Read {
                key: key.to_string(),
                source,
            })
    }

    /// Reads a value as a JSON tree, applying the compatibility policy:
    ///
    /// - absent key → `None`;
    /// - `enc1:`-marked text → decrypt first; a decrypt failure is logged
    ///   and reads as `None`, never an error;
    /// - unparseable text → the raw text as a JSON string, best effort.
    ///
    /// # Errors
    /// - [`StoreError::Read`] only when the medium itself fails.
    pub fn get_value(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw = match self.get_raw(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        if let Some(blob) = raw.strip_prefix(ENCRYPTED_MARKER) {
            return match self.codec.decrypt(blob) {
                Ok(plain) => Ok(Some(Self::parse_lenient(key, &plain))),
                Err(err) => {
                    // A corrupt blob must not crash a read path.
                    error!(
                        "event=kv_get module=store status=error key={key} error_code=decrypt_failed error={err}"
                    );
                    Ok(None)
                }
            };
        }

        Ok(Some(Self::parse_lenient(key, &raw)))
    }

    /// Typed read built on [`KeyValueStore::get_value`]. A shape mismatch is
    /// logged and reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let value = match self.get_value(key)? {
            Some(value) => value,
            None => return Ok(None),
        };

        match serde_json::from_value(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(err) => {
                error!(
                    "event=kv_get module=store status=error key={key} error_code=shape_mismatch error={err}"
                );
                Ok(None)
            }
        }
    }

    fn parse_lenient(key: &str, text: &str) -> Value {
        serde_json::from_str(text).unwrap_or_else(|_| {
            warn!("event=kv_get module=store status=degraded key={key} fallback=raw_string");
            Value::String(text.to_string())
        })
    }

    /// Deletes the key; absent keys are a no-op.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.medium
            .delete(&Self::namespaced(key))
            .map_err(|source| StoreError::Write {
                key: key.to_string(),
                source,
            })
    }

    /// Deletes every key under this namespace, leaving co-resident data
    /// untouched.
    pub fn clear(&self) -> StoreResult<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }

    /// All namespace keys with the prefix stripped.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let all = self.medium.keys().map_err(|source| StoreError::Read {
            key: NAMESPACE_PREFIX.to_string(),
            source,
        })?;

        Ok(all
            .into_iter()
            .filter_map(|key| key.strip_prefix(NAMESPACE_PREFIX).map(str::to_string))
            .collect())
    }

    /// Total and per-key storage footprint, sorted descending by size.
    /// Diagnostic only; previews decrypt where possible.
    pub fn storage_size(&self) -> StoreResult<StorageSizeReport> {
        let mut entries = Vec::new();
        let mut total_bytes = 0usize;

        for key in self.keys()? {
            let raw = match self.get_raw(&key)? {
                Some(raw) => raw,
                None => continue,
            };
            let bytes = raw.len();
            total_bytes += bytes;
            entries.push(KeySizeEntry {
                preview: self.display_preview(&raw),
                key,
                bytes,
            });
        }

        entries.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.key.cmp(&b.key)));
        Ok(StorageSizeReport {
            total_bytes,
            entries,
        })
    }

    fn display_preview(&self, raw: &str) -> String {
        let display = match raw.strip_prefix(ENCRYPTED_MARKER) {
            Some(blob) => match self.codec.decrypt(blob) {
                Ok(plain) => plain,
                Err(_) => raw.to_string(),
            },
            None => raw.to_string(),
        };

        let mut preview: String = display.chars().take(SIZE_PREVIEW_CHARS).collect();
        if display.chars().count() > SIZE_PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }

    /// Runs format repair across every known collection key. Called once at
    /// startup, before any service reads.
    pub fn repair_collections(&self) -> StoreResult<()> {
        super::repair::repair_collections(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, ENCRYPTED_MARKER, NAMESPACE_PREFIX};
    use crate::store::medium::{MemoryMedium, StorageMedium};
    use serde_json::{json, Value};

    fn store() -> KeyValueStore<MemoryMedium> {
        KeyValueStore::new(MemoryMedium::new())
    }

    #[test]
    fn set_then_get_round_trips_json() {
        let kv = store();
        kv.set("greeting", &json!({"text": "hello"}), false).unwrap();

        let value = kv.get_value("greeting").unwrap().unwrap();
        assert_eq!(value, json!({"text": "hello"}));
    }

    #[test]
    fn get_missing_key_is_none() {
        let kv = store();
        assert_eq!(kv.get_value("absent").unwrap(), None);
    }

    #[test]
    fn keys_are_written_under_the_namespace_prefix() {
        let medium = MemoryMedium::new();
        medium.write("foreign", "untouched").unwrap();

        let kv = KeyValueStore::new(medium);
        kv.set("mine", &json!(1), false).unwrap();

        let keys = kv.keys().unwrap();
        assert_eq!(keys, vec!["mine"]);

        kv.clear().unwrap();
        assert!(kv.keys().unwrap().is_empty());
        // The un-prefixed row is invisible through the store and survives
        // the namespace clear.
        assert_eq!(kv.get_raw("foreign").unwrap(), None);
        assert_eq!(
            kv.medium_ref().read("foreign").unwrap().as_deref(),
            Some("untouched")
        );
    }

    #[test]
    fn encrypted_values_carry_marker_and_read_back() {
        let kv = store();
        kv.set("secret", &json!({"diary": "private"}), true).unwrap();

        let raw = kv.get_raw("secret").unwrap().unwrap();
        assert!(raw.starts_with(ENCRYPTED_MARKER));
        assert!(!raw.contains("private"));

        let value = kv.get_value("secret").unwrap().unwrap();
        assert_eq!(value, json!({"diary": "private"}));
    }

    #[test]
    fn corrupt_ciphertext_reads_as_none_not_error() {
        let kv = store();
        kv.set_raw("secret", &format!("{ENCRYPTED_MARKER}???not-base64"))
            .unwrap();
        assert_eq!(kv.get_value("secret").unwrap(), None);
    }

    #[test]
    fn unparseable_text_falls_back_to_raw_string() {
        let kv = store();
        kv.set_raw("legacy", "plain text, not json").unwrap();

        let value = kv.get_value("legacy").unwrap().unwrap();
        assert_eq!(value, Value::String("plain text, not json".into()));
    }

    #[test]
    fn typed_get_degrades_on_shape_mismatch() {
        let kv = store();
        kv.set("number", &json!(17), false).unwrap();

        let typed: Option<Vec<String>> = kv.get("number").unwrap();
        assert_eq!(typed, None);
    }

    #[test]
    fn remove_is_a_noop_for_absent_keys() {
        let kv = store();
        kv.remove("never-written").unwrap();
    }

    #[test]
    fn storage_size_sorts_descending_and_decrypts_previews() {
        let kv = store();
        kv.set("small", &json!(1), false).unwrap();
        kv.set("large", &json!({"body": "x".repeat(200)}), false)
            .unwrap();
        kv.set("hidden", &json!({"note": "visible in preview"}), true)
            .unwrap();

        let report = kv.storage_size().unwrap();
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].key, "large");
        assert!(report.total_bytes >= report.entries[0].bytes);

        let hidden = report
            .entries
            .iter()
            .find(|entry| entry.key == "hidden")
            .unwrap();
        assert!(hidden.preview.contains("visible in preview"));
    }

    #[test]
    fn namespace_prefix_is_stable() {
        // Persisted-data contract; changing it orphans every stored key.
        assert_eq!(NAMESPACE_PREFIX, "daybook:");
    }
}
