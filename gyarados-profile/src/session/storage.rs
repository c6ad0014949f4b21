//! Session persistence through a [`SettingsBackend`].
//!
//! The snapshot is stored as a JSON string under [`SESSION_KEY`] in the
//! profile's settings scope, the same encoding the browser has always used.

use serde_json::Value;

use super::{SESSION_KEY, SessionSnapshot};
use crate::error::Result;
use crate::settings::SettingsBackend;

/// Save `snapshot` into `scope`.
pub fn save_session(
    settings: &dyn SettingsBackend,
    scope: &str,
    snapshot: &SessionSnapshot,
) -> Result<()> {
    let blob = serde_json::to_string(snapshot)?;
    settings.set(scope, SESSION_KEY, Value::String(blob))
}

/// Load the snapshot stored in `scope`.
///
/// Returns `None` if no session was saved or the stored value is blank.
/// Returns an error if the value exists but cannot be parsed.
pub fn load_session(settings: &dyn SettingsBackend, scope: &str) -> Result<Option<SessionSnapshot>> {
    match settings.get(scope, SESSION_KEY)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(blob)) if blob.trim().is_empty() => Ok(None),
        Some(Value::String(blob)) => Ok(Some(serde_json::from_str(&blob)?)),
        // Tolerate hosts that stored the snapshot as a structured value.
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

/// Remove the saved session from `scope`.
pub fn clear_session(settings: &dyn SettingsBackend, scope: &str) -> Result<()> {
    settings.remove(scope, SESSION_KEY)
}
