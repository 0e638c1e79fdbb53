//! Section metadata registry — display names and behavior flags per key.
//!
//! The registry is the single source of truth for a section's display name
//! and for whether it may be deleted or renamed. Built-in keys are seeded
//! with defaults; custom keys are registered when the user adds a section.
//! Registration state is per-document: it travels inside the `Sections`
//! model, never as process-global state.
#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::EditError;
use crate::sections::model::{is_builtin, BUILT_IN_KEYS};

/// Display/behavior metadata for one section key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionMeta {
    pub name: String,
    pub deletable: bool,
    pub renamable: bool,
}

impl SectionMeta {
    fn defaulted(name: impl Into<String>) -> Self {
        SectionMeta {
            name: name.into(),
            deletable: true,
            renamable: true,
        }
    }
}

/// Default display name for a built-in key.
pub fn default_display_name(key: &str) -> String {
    match key {
        "experience" => "Experience".to_string(),
        "education" => "Education".to_string(),
        "skills" => "Skills".to_string(),
        "projects" => "Projects".to_string(),
        "certifications" => "Certifications".to_string(),
        other => other.to_string(),
    }
}

/// Derives a section key from a display name: lowercase, whitespace runs
/// collapsed to a single hyphen, everything but `[a-z0-9-]` dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress leading hyphens
    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_was_hyphen {
                slug.push('-');
                last_was_hyphen = true;
            }
        } else if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// The keyed metadata map. Wraps a sorted map so serialization is
/// deterministic and round trips preserve every entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct SectionRegistry(BTreeMap<String, SectionMeta>);

impl SectionRegistry {
    /// A registry seeded with defaults for all built-in keys.
    pub fn with_builtins() -> Self {
        let mut map = BTreeMap::new();
        for key in BUILT_IN_KEYS {
            map.insert(key.to_string(), SectionMeta::defaulted(default_display_name(key)));
        }
        SectionRegistry(map)
    }

    pub fn get(&self, key: &str) -> Option<&SectionMeta> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Display name for a key, falling back to the built-in default when the
    /// entry is absent.
    pub fn display_name(&self, key: &str) -> String {
        self.0
            .get(key)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| default_display_name(key))
    }

    /// Registers a custom section key. Fails with `DuplicateKey` when the
    /// key collides with a built-in or an existing entry.
    pub(in crate::sections) fn register_custom(
        &mut self,
        key: &str,
        name: &str,
    ) -> Result<&SectionMeta, EditError> {
        if is_builtin(key) || self.0.contains_key(key) {
            return Err(EditError::DuplicateKey(key.to_string()));
        }
        self.0.insert(key.to_string(), SectionMeta::defaulted(name));
        Ok(self.0.get(key).expect("just inserted"))
    }

    /// Re-seeds the default entry for a built-in key. Used when an item is
    /// added to a built-in section whose metadata was previously removed.
    pub(in crate::sections) fn reseed_builtin(&mut self, key: &str) {
        debug_assert!(is_builtin(key));
        self.0
            .entry(key.to_string())
            .or_insert_with(|| SectionMeta::defaulted(default_display_name(key)));
    }

    /// Removes a key's entry. Fails with `NotFound` when absent and with
    /// `NotDeletable` when the entry forbids deletion.
    pub(in crate::sections) fn unregister(&mut self, key: &str) -> Result<SectionMeta, EditError> {
        let meta = self
            .0
            .get(key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))?;
        if !meta.deletable {
            return Err(EditError::NotDeletable(key.to_string()));
        }
        Ok(self.0.remove(key).expect("checked above"))
    }

    /// Renames a key's display name, honoring the `renamable` flag.
    pub(in crate::sections) fn rename(&mut self, key: &str, name: &str) -> Result<(), EditError> {
        let meta = self
            .0
            .get_mut(key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))?;
        if !meta.renamable {
            return Err(EditError::Validation(format!(
                "section '{key}' is not renamable"
            )));
        }
        meta.name = name.to_string();
        Ok(())
    }
}
