//! One-shot format repair for collection payloads.
//!
//! # Responsibility
//! - Normalize a collection key to the canonical array-of-records shape.
//! - Tolerate the two historical write bugs: bare objects persisted where
//!   an array belonged, and double-serialized JSON ("a JSON string whose
//!   content is itself JSON").
//!
//! # Invariants
//! - Repair is idempotent: a second run over repaired data is a no-op.
//! - Every applied transformation is logged for audit.
//! - Repair targets plaintext collection keys only; encrypted scalar keys
//!   are never wired through it.

use super::{KeyValueStore, StorageMedium, StoreResult};
use log::{info, warn};
use serde_json::Value;

/// Which normalization a repair run applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Key absent; nothing to do.
    Missing,
    /// Payload already canonical.
    AlreadyArray,
    /// Inner array unwrapped from a double-serialized string.
    UnwrappedInnerArray,
    /// Inner object from a double-serialized string, wrapped as `[obj]`.
    WrappedInnerObject,
    /// Bare top-level object wrapped as `[obj]`.
    WrappedBareObject,
    /// Unparseable or scalar payload reset to `[]`.
    ResetToEmpty,
}

/// Normalizes the payload under `key` to a JSON array.
///
/// Decision ladder, first match wins:
/// 1. absent key → no-op;
/// 2. array → no-op;
/// 3. string containing JSON → unwrap inner array, or wrap inner object;
/// 4. bare object → wrap;
/// 5. anything else → reset to `[]`.
///
/// # Errors
/// - [`super::StoreError::Read`]/[`super::StoreError::Write`] when the
///   medium fails; shape problems are what this function exists to fix and
///   never error.
pub fn repair<M: StorageMedium>(kv: &KeyValueStore<M>, key: &str) -> StoreResult<RepairOutcome> {
    let raw = match kv.get_raw(key)? {
        Some(raw) => raw,
        None => {
            info!("event=format_repair module=store status=ok key={key} action=missing");
            return Ok(RepairOutcome::Missing);
        }
    };

    let outcome = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(_)) => RepairOutcome::AlreadyArray,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Array(items)) => {
                kv.set(key, &items, false)?;
                RepairOutcome::UnwrappedInnerArray
            }
            Ok(Value::Object(map)) => {
                kv.set(key, &vec![Value::Object(map)], false)?;
                RepairOutcome::WrappedInnerObject
            }
            // The string holds no usable JSON; the outer value is still a
            // string, so the ladder bottoms out at reset.
            _ => {
                kv.set(key, &Vec::<Value>::new(), false)?;
                RepairOutcome::ResetToEmpty
            }
        },
        Ok(Value::Object(map)) => {
            kv.set(key, &vec![Value::Object(map)], false)?;
            RepairOutcome::WrappedBareObject
        }
        _ => {
            kv.set(key, &Vec::<Value>::new(), false)?;
            RepairOutcome::ResetToEmpty
        }
    };

    match outcome {
        RepairOutcome::AlreadyArray => {
            info!("event=format_repair module=store status=ok key={key} action=already_array");
        }
        RepairOutcome::UnwrappedInnerArray => {
            warn!(
                "event=format_repair module=store status=repaired key={key} action=unwrap_inner_array"
            );
        }
        RepairOutcome::WrappedInnerObject => {
            warn!(
                "event=format_repair module=store status=repaired key={key} action=wrap_inner_object"
            );
        }
        RepairOutcome::WrappedBareObject => {
            warn!(
                "event=format_repair module=store status=repaired key={key} action=wrap_bare_object"
            );
        }
        RepairOutcome::ResetToEmpty => {
            warn!("event=format_repair module=store status=repaired key={key} action=reset_empty");
        }
        RepairOutcome::Missing => {}
    }

    Ok(outcome)
}

/// Repairs every known collection key. Startup hook.
pub fn repair_collections<M: StorageMedium>(kv: &KeyValueStore<M>) -> StoreResult<()> {
    for key in super::keys::ALL_COLLECTIONS {
        repair(kv, key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{repair, RepairOutcome};
    use crate::store::kv::KeyValueStore;
    use crate::store::medium::MemoryMedium;
    use serde_json::json;

    fn store() -> KeyValueStore<MemoryMedium> {
        KeyValueStore::new(MemoryMedium::new())
    }

    #[test]
    fn absent_key_is_a_noop() {
        let kv = store();
        assert_eq!(repair(&kv, "nothing").unwrap(), RepairOutcome::Missing);
        assert_eq!(kv.get_raw("nothing").unwrap(), None);
    }

    #[test]
    fn canonical_array_is_untouched() {
        let kv = store();
        kv.set_raw("k", r#"[{"a":1}]"#).unwrap();
        assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::AlreadyArray);
        assert_eq!(kv.get_raw("k").unwrap().as_deref(), Some(r#"[{"a":1}]"#));
    }

    #[test]
    fn double_serialized_array_is_unwrapped() {
        let kv = store();
        // JSON.stringify(JSON.stringify([{a:1}]))
        let doubled = serde_json::to_string(&r#"[{"a":1}]"#.to_string()).unwrap();
        kv.set_raw("k", &doubled).unwrap();

        assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::UnwrappedInnerArray);
        assert_eq!(kv.get_value("k").unwrap().unwrap(), json!([{"a": 1}]));
    }

    #[test]
    fn double_serialized_object_becomes_singleton_array() {
        let kv = store();
        let doubled = serde_json::to_string(&r#"{"a":1}"#.to_string()).unwrap();
        kv.set_raw("k", &doubled).unwrap();

        assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::WrappedInnerObject);
        assert_eq!(kv.get_value("k").unwrap().unwrap(), json!([{"a": 1}]));
    }

    #[test]
    fn bare_object_becomes_singleton_array() {
        let kv = store();
        kv.set_raw("k", r#"{"a":1}"#).unwrap();

        assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::WrappedBareObject);
        assert_eq!(kv.get_value("k").unwrap().unwrap(), json!([{"a": 1}]));
    }

    #[test]
    fn garbage_and_scalars_reset_to_empty_array() {
        let kv = store();
        for payload in ["not json at all", "17", "true", "\"just text\""] {
            kv.set_raw("k", payload).unwrap();
            assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::ResetToEmpty);
            assert_eq!(kv.get_value("k").unwrap().unwrap(), json!([]));
        }
    }

    #[test]
    fn repair_is_idempotent() {
        let kv = store();
        let doubled = serde_json::to_string(&r#"[{"a":1},{"b":2}]"#.to_string()).unwrap();
        kv.set_raw("k", &doubled).unwrap();

        repair(&kv, "k").unwrap();
        let after_first = kv.get_raw("k").unwrap();

        assert_eq!(repair(&kv, "k").unwrap(), RepairOutcome::AlreadyArray);
        assert_eq!(kv.get_raw("k").unwrap(), after_first);
    }
}
