//! `uuid` generation helpers.
//!
//! `file_uuid` and `Event.uuid` are drawn independently, as two separate
//! `uuid_v4` calls taken at nearly the same timestamp, rather than unifying
//! the generation site, so a `StoreEvent`'s `uuid` and its
//! `event_params.file_uuid` are never required to match.

use uuid::Uuid;

/// Builds a reference of the form `"<seconds>_<uuidv4>"`.
pub fn make_ref(now_unix_secs: i64) -> String {
    format!("{now_unix_secs}_{}", Uuid::new_v4())
}
