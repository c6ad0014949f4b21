//! Profile-name and profile-path validation.
//!
//! Profile names become directory names under `profiles/`, so every name is
//! checked lexically before it is joined onto a path, and existing profile
//! directories are checked again after symlinks are resolved.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Name of the profile that always exists and cannot be deleted.
pub const DEFAULT_PROFILE: &str = "default";

fn invalid(name: &str, reason: &str) -> StoreError {
    StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Check that `name` can be used as a single directory component.
///
/// Rejects empty names, path separators, NUL bytes, `.`/`..` and anything
/// else that does not parse as exactly one normal path component.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(name, "name is empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid(name, "name contains a path separator"));
    }
    if name.contains('\0') {
        return Err(invalid(name, "name contains a NUL byte"));
    }
    if name == "." || name == ".." {
        return Err(invalid(name, "name is a relative directory reference"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid(name, "name is not a single path component")),
    }
}

/// Directory of profile `name` under `profiles_dir`, after validating the name.
///
/// The directory does not have to exist.
pub fn profile_dir(profiles_dir: &Path, name: &str) -> Result<PathBuf> {
    validate_profile_name(name)?;
    Ok(profiles_dir.join(name))
}

/// Resolve `path` (which must exist) through `canonicalize` and check that it
/// still lies inside `profiles_dir`.
///
/// Catches profile directories that are symlinks pointing elsewhere. Returns
/// the canonical path.
pub fn ensure_contained(profiles_dir: &Path, path: &Path) -> Result<PathBuf> {
    let canonical = fs::canonicalize(path).map_err(|e| StoreError::io(path, e))?;
    // If the base doesn't exist yet, compare against the un-resolved path.
    let canonical_base =
        fs::canonicalize(profiles_dir).unwrap_or_else(|_| profiles_dir.to_path_buf());

    if canonical == canonical_base || !canonical.starts_with(&canonical_base) {
        return Err(StoreError::Policy(format!(
            "'{}' resolves to '{}', outside the profiles directory '{}'",
            path.display(),
            canonical.display(),
            canonical_base.display()
        )));
    }
    Ok(canonical)
}
