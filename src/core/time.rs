//! Shared timestamp/event helpers for command envelopes and comment keys.

use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

/// Unix-epoch milliseconds, the natural comment key.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    i64::try_from(millis).unwrap_or(i64::MAX)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Standard command response envelope shape used across CLI surfaces.
/// Payload keys never replace the envelope's own fields.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": ENVELOPE_VERSION,
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            if !base_obj.contains_key(k) {
                base_obj.insert(k.clone(), v.clone());
            }
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::ActivePackage;
    use crate::core::store::Package;

    #[test]
    fn comment_keys_follow_the_clock() {
        let secs: i64 = now_epoch_z().trim_end_matches('Z').parse().unwrap();
        let millis = now_millis();
        assert!(millis / 1000 >= secs);
        assert!(millis / 1000 - secs <= 1);
    }

    #[test]
    fn event_ids_are_distinct_ulids() {
        let id = new_event_id();
        assert!(ulid::Ulid::from_string(&id).is_ok());
        assert_ne!(id, new_event_id());
    }

    #[test]
    fn resolve_envelope_carries_active_package() {
        let active = ActivePackage {
            store_id: "site1".to_string(),
            package: Package {
                id: "p1".to_string(),
                root_url: Some("https://a.com".to_string()),
                ..Default::default()
            },
            cached: true,
        };
        let envelope = command_envelope(
            "resolve",
            "ok",
            serde_json::json!({ "url": "https://a.com/x", "active": active }),
        );
        assert_eq!(envelope["envelope_version"], ENVELOPE_VERSION);
        assert_eq!(envelope["active"]["store_id"], "site1");
        assert_eq!(envelope["active"]["package"]["rootURL"], "https://a.com");
        assert!(envelope["active"].get("cached").is_none());
    }

    #[test]
    fn payload_cannot_override_envelope_fields() {
        let envelope = command_envelope(
            "package.delete",
            "not_found",
            serde_json::json!({ "status": "ok", "cmd": "other", "store_id": "site1" }),
        );
        assert_eq!(envelope["status"], "not_found");
        assert_eq!(envelope["cmd"], "package.delete");
        assert_eq!(envelope["store_id"], "site1");
    }

    #[test]
    fn none_resolution_serializes_as_null() {
        let active: Option<ActivePackage> = None;
        let envelope = command_envelope("resolve", "none", serde_json::json!({ "active": active }));
        assert!(envelope["active"].is_null());
    }
}
