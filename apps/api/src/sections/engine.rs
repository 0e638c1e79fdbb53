//! Merge/update engine — the single writer for the section model.
//!
//! Applies one logical edit at a time as a pure transform: the caller's
//! model is never touched on failure. `apply_all` extends the same guarantee
//! to a whole batch (all-or-nothing), which is the discipline used for
//! reconciliation commits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EditError;
use crate::sections::meta::slugify;
use crate::sections::model::{
    is_builtin, BulletPoint, CustomSection, Item, ItemData, Sections,
};

/// The editable content of one resume document: the section model plus the
/// explicit section order stored alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResumeContent {
    pub sections: Sections,
    #[serde(default)]
    pub section_order: Vec<String>,
}

/// Partial update for one item. Every `Some` field replaces the existing
/// value wholesale; `bullet_points` in particular is a whole-list replace,
/// not a per-bullet patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ItemPatch {
    #[serde(default)]
    pub data: Option<ItemData>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bullet_points: Option<Vec<BulletPoint>>,
}

/// One logical edit to a resume's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddItem {
        section: String,
        item: Item,
    },
    UpdateItem {
        section: String,
        item_id: Uuid,
        patch: ItemPatch,
    },
    RemoveItem {
        section: String,
        item_id: Uuid,
    },
    AddCustomSection {
        name: String,
    },
    /// Removes a section: a custom section loses its metadata entry and its
    /// body atomically; a built-in section loses its metadata entry and its
    /// items. Honors the `deletable` flag either way.
    RemoveSection {
        key: String,
    },
    RenameSection {
        key: String,
        name: String,
    },
    AddBullet {
        section: String,
        item_id: Uuid,
        text: String,
    },
    RemoveBullet {
        section: String,
        item_id: Uuid,
        bullet_id: Uuid,
    },
    ReorderSections {
        order: Vec<String>,
    },
}

/// Applies a single edit, returning the new content or the first error.
/// The input is untouched either way.
pub fn apply(content: &ResumeContent, edit: &Edit) -> Result<ResumeContent, EditError> {
    let mut next = content.clone();
    apply_mut(&mut next, edit)?;
    Ok(next)
}

/// Applies a batch atomically: either every edit applies, in order, or the
/// first failure is returned and the caller's content is unchanged.
pub fn apply_all(content: &ResumeContent, edits: &[Edit]) -> Result<ResumeContent, EditError> {
    let mut next = content.clone();
    for edit in edits {
        apply_mut(&mut next, edit)?;
    }
    Ok(next)
}

fn apply_mut(content: &mut ResumeContent, edit: &Edit) -> Result<(), EditError> {
    match edit {
        Edit::AddItem { section, item } => add_item(&mut content.sections, section, item.clone()),
        Edit::UpdateItem {
            section,
            item_id,
            patch,
        } => update_item(&mut content.sections, section, *item_id, patch),
        Edit::RemoveItem { section, item_id } => {
            remove_item(&mut content.sections, section, *item_id)
        }
        Edit::AddCustomSection { name } => add_custom_section(&mut content.sections, name),
        Edit::RemoveSection { key } => remove_section(content, key),
        Edit::RenameSection { key, name } => rename_section(&mut content.sections, key, name),
        Edit::AddBullet {
            section,
            item_id,
            text,
        } => {
            let item = find_item_mut(&mut content.sections, section, *item_id)?;
            item.bullet_points.push(BulletPoint::new(text.clone()));
            Ok(())
        }
        Edit::RemoveBullet {
            section,
            item_id,
            bullet_id,
        } => {
            let item = find_item_mut(&mut content.sections, section, *item_id)?;
            let pos = item
                .bullet_points
                .iter()
                .position(|b| b.id == *bullet_id)
                .ok_or_else(|| EditError::NotFound(format!("bullet {bullet_id}")))?;
            item.bullet_points.remove(pos);
            Ok(())
        }
        Edit::ReorderSections { order } => reorder_sections(content, order),
    }
}

fn add_item(sections: &mut Sections, section: &str, item: Item) -> Result<(), EditError> {
    if !sections.has_section(section) {
        return Err(EditError::UnknownSection(section.to_string()));
    }
    check_kind(section, &item.data)?;
    check_bullet_ids(&item.bullet_points)?;

    let items = sections
        .items_mut(section)
        .expect("has_section checked above");
    if items.iter().any(|existing| existing.id == item.id) {
        return Err(EditError::Validation(format!(
            "item id {} already exists in section '{section}'",
            item.id
        )));
    }
    items.push(item);

    // An item landing in a built-in section whose metadata entry was removed
    // restores the default entry, so every populated key stays displayable.
    if is_builtin(section) {
        sections.registry_mut().reseed_builtin(section);
    }
    Ok(())
}

fn update_item(
    sections: &mut Sections,
    section: &str,
    item_id: Uuid,
    patch: &ItemPatch,
) -> Result<(), EditError> {
    if let Some(data) = &patch.data {
        check_kind(section, data)?;
    }
    if let Some(bullets) = &patch.bullet_points {
        check_bullet_ids(bullets)?;
    }

    let item = find_item_mut(sections, section, item_id)?;
    if let Some(data) = &patch.data {
        item.data = data.clone();
    }
    if let Some(description) = &patch.description {
        item.description = Some(description.clone());
    }
    if let Some(bullets) = &patch.bullet_points {
        item.bullet_points = bullets.clone();
    }
    Ok(())
}

fn remove_item(sections: &mut Sections, section: &str, item_id: Uuid) -> Result<(), EditError> {
    let items = sections
        .items_mut(section)
        .ok_or_else(|| EditError::UnknownSection(section.to_string()))?;
    let pos = items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or(EditError::ItemNotFound {
            section: section.to_string(),
            item_id,
        })?;
    items.remove(pos);
    Ok(())
}

fn add_custom_section(sections: &mut Sections, name: &str) -> Result<(), EditError> {
    let key = slugify(name);
    if key.is_empty() {
        return Err(EditError::Validation(format!(
            "section name '{name}' produces an empty key"
        )));
    }
    // No collision suffixing: a second section slugging to the same key is
    // rejected outright.
    if sections.custom(&key).is_some() {
        return Err(EditError::DuplicateKey(key));
    }
    sections.registry_mut().register_custom(&key, name)?;
    sections.insert_custom(
        key,
        CustomSection {
            id: Uuid::new_v4(),
            title: name.to_string(),
            content: String::new(),
            items: Vec::new(),
        },
    );
    Ok(())
}

fn remove_section(content: &mut ResumeContent, key: &str) -> Result<(), EditError> {
    content.sections.registry_mut().unregister(key)?;
    if is_builtin(key) {
        content
            .sections
            .items_mut(key)
            .expect("built-in sections always resolve")
            .clear();
    } else {
        content
            .sections
            .remove_custom(key)
            .ok_or_else(|| EditError::NotFound(key.to_string()))?;
    }
    content.section_order.retain(|k| k != key);
    Ok(())
}

fn rename_section(sections: &mut Sections, key: &str, name: &str) -> Result<(), EditError> {
    sections.registry_mut().rename(key, name)?;
    if let Some(custom) = sections.custom_mut(key) {
        custom.title = name.to_string();
    }
    Ok(())
}

fn reorder_sections(content: &mut ResumeContent, order: &[String]) -> Result<(), EditError> {
    let mut seen = HashSet::new();
    for key in order {
        if !seen.insert(key.as_str()) {
            return Err(EditError::InvalidOrder(format!(
                "key '{key}' appears more than once"
            )));
        }
        if !content.sections.has_section(key) {
            return Err(EditError::InvalidOrder(format!(
                "key '{key}' is not a section of this resume"
            )));
        }
    }
    // Partial orders are allowed; unlisted sections fall back to the default
    // order at binding time.
    content.section_order = order.to_vec();
    Ok(())
}

fn find_item_mut<'a>(
    sections: &'a mut Sections,
    section: &str,
    item_id: Uuid,
) -> Result<&'a mut Item, EditError> {
    let items = sections
        .items_mut(section)
        .ok_or_else(|| EditError::UnknownSection(section.to_string()))?;
    items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or(EditError::ItemNotFound {
            section: section.to_string(),
            item_id,
        })
}

fn check_kind(section: &str, data: &ItemData) -> Result<(), EditError> {
    let expected = ItemData::expected_kind(section);
    if data.kind_str() != expected {
        return Err(EditError::Validation(format!(
            "item kind '{}' does not fit section '{section}' (expected '{expected}')",
            data.kind_str()
        )));
    }
    Ok(())
}

fn check_bullet_ids(bullets: &[BulletPoint]) -> Result<(), EditError> {
    let mut seen = HashSet::new();
    for bullet in bullets {
        if !seen.insert(bullet.id) {
            return Err(EditError::Validation(format!(
                "duplicate bullet id {}",
                bullet.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::model::{ExperienceData, SkillData};

    fn make_experience_item(role: &str) -> Item {
        Item::new(ItemData::Experience(ExperienceData {
            role: role.to_string(),
            company: "Acme".to_string(),
            location: None,
            start_date: Some("2020".to_string()),
            end_date: None,
        }))
    }

    fn make_content_with_one_job() -> (ResumeContent, Uuid) {
        let content = ResumeContent::default();
        let item = make_experience_item("Engineer");
        let item_id = item.id;
        let content = apply(
            &content,
            &Edit::AddItem {
                section: "experience".to_string(),
                item,
            },
        )
        .unwrap();
        (content, item_id)
    }

    #[test]
    fn test_add_item_appends_in_order() {
        let content = ResumeContent::default();
        let content = apply(
            &content,
            &Edit::AddItem {
                section: "experience".to_string(),
                item: make_experience_item("First"),
            },
        )
        .unwrap();
        let content = apply(
            &content,
            &Edit::AddItem {
                section: "experience".to_string(),
                item: make_experience_item("Second"),
            },
        )
        .unwrap();

        let items = content.sections.items("experience").unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0].data, ItemData::Experience(e) if e.role == "First"));
        assert!(matches!(&items[1].data, ItemData::Experience(e) if e.role == "Second"));
    }

    #[test]
    fn test_add_item_unknown_section_fails_without_mutation() {
        let content = ResumeContent::default();
        let before = content.clone();
        let err = apply(
            &content,
            &Edit::AddItem {
                section: "no-such-section".to_string(),
                item: make_experience_item("X"),
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::UnknownSection("no-such-section".to_string()));
        assert_eq!(content, before);
    }

    #[test]
    fn test_add_item_rejects_kind_mismatch() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::AddItem {
                section: "skills".to_string(),
                item: make_experience_item("X"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Validation(_)));
    }

    #[test]
    fn test_update_item_merges_patch_and_preserves_id() {
        let (content, item_id) = make_content_with_one_job();
        let updated = apply(
            &content,
            &Edit::UpdateItem {
                section: "experience".to_string(),
                item_id,
                patch: ItemPatch {
                    description: Some("Payments team".to_string()),
                    ..Default::default()
                },
            },
        )
        .unwrap();

        let item = &updated.sections.items("experience").unwrap()[0];
        assert_eq!(item.id, item_id);
        assert_eq!(item.description.as_deref(), Some("Payments team"));
        // Untouched fields survive the patch.
        assert!(matches!(&item.data, ItemData::Experience(e) if e.role == "Engineer"));
    }

    #[test]
    fn test_update_item_replaces_bullets_wholesale() {
        let (content, item_id) = make_content_with_one_job();
        let content = apply(
            &content,
            &Edit::AddBullet {
                section: "experience".to_string(),
                item_id,
                text: "old bullet".to_string(),
            },
        )
        .unwrap();

        let replacement = vec![BulletPoint::new("only bullet")];
        let updated = apply(
            &content,
            &Edit::UpdateItem {
                section: "experience".to_string(),
                item_id,
                patch: ItemPatch {
                    bullet_points: Some(replacement.clone()),
                    ..Default::default()
                },
            },
        )
        .unwrap();

        let item = &updated.sections.items("experience").unwrap()[0];
        assert_eq!(item.bullet_points, replacement);
    }

    #[test]
    fn test_update_missing_item_is_item_not_found() {
        let (content, _) = make_content_with_one_job();
        let ghost = Uuid::new_v4();
        let err = apply(
            &content,
            &Edit::UpdateItem {
                section: "experience".to_string(),
                item_id: ghost,
                patch: ItemPatch::default(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            EditError::ItemNotFound {
                section: "experience".to_string(),
                item_id: ghost
            }
        );
    }

    #[test]
    fn test_remove_item_twice_is_idempotent_not_found() {
        let (content, item_id) = make_content_with_one_job();
        let edit = Edit::RemoveItem {
            section: "experience".to_string(),
            item_id,
        };

        let after_first = apply(&content, &edit).unwrap();
        assert!(after_first.sections.items("experience").unwrap().is_empty());

        let err = apply(&after_first, &edit).unwrap_err();
        assert!(matches!(err, EditError::ItemNotFound { .. }));
        // Second call changed nothing: the model after one removal equals
        // the model after attempting both.
        let after_second = apply(&after_first, &edit);
        assert!(after_second.is_err());
    }

    #[test]
    fn test_add_custom_section_derives_slug_key() {
        let content = ResumeContent::default();
        let content = apply(
            &content,
            &Edit::AddCustomSection {
                name: "My New Section".to_string(),
            },
        )
        .unwrap();

        let custom = content.sections.custom("my-new-section").expect("created");
        assert_eq!(custom.title, "My New Section");
        assert!(custom.items.is_empty());
        let meta = content.sections.registry().get("my-new-section").unwrap();
        assert!(meta.deletable);
        assert!(meta.renamable);
    }

    #[test]
    fn test_add_custom_section_same_name_twice_is_duplicate_key() {
        let content = ResumeContent::default();
        let edit = Edit::AddCustomSection {
            name: "My New Section".to_string(),
        };
        let content = apply(&content, &edit).unwrap();
        let err = apply(&content, &edit).unwrap_err();
        assert_eq!(err, EditError::DuplicateKey("my-new-section".to_string()));
    }

    #[test]
    fn test_add_custom_section_rejects_builtin_collision() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::AddCustomSection {
                name: "Skills".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::DuplicateKey("skills".to_string()));
    }

    #[test]
    fn test_remove_custom_section_drops_meta_body_and_order_entry() {
        let content = ResumeContent::default();
        let content = apply(
            &content,
            &Edit::AddCustomSection {
                name: "Talks".to_string(),
            },
        )
        .unwrap();
        let content = apply(
            &content,
            &Edit::ReorderSections {
                order: vec!["talks".to_string(), "experience".to_string()],
            },
        )
        .unwrap();

        let content = apply(
            &content,
            &Edit::RemoveSection {
                key: "talks".to_string(),
            },
        )
        .unwrap();

        assert!(content.sections.custom("talks").is_none());
        assert!(content.sections.registry().get("talks").is_none());
        assert_eq!(content.section_order, vec!["experience".to_string()]);
    }

    #[test]
    fn test_remove_section_not_deletable_is_reported_not_silent() {
        // A document whose skills section is locked against deletion.
        let json = serde_json::json!({
            "sections": {
                "section_meta": {
                    "skills": { "name": "Skills", "deletable": false, "renamable": true }
                },
                "skills": [ { "kind": "skill", "name": "Rust" } ]
            },
            "section_order": []
        });
        let content: ResumeContent = serde_json::from_value(json).unwrap();
        let before = content.clone();

        let err = apply(
            &content,
            &Edit::RemoveSection {
                key: "skills".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::NotDeletable("skills".to_string()));
        assert_eq!(content, before);
    }

    #[test]
    fn test_remove_missing_section_is_not_found() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::RemoveSection {
                key: "ghost".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err, EditError::NotFound("ghost".to_string()));
    }

    #[test]
    fn test_rename_section_updates_meta_and_custom_title() {
        let content = ResumeContent::default();
        let content = apply(
            &content,
            &Edit::AddCustomSection {
                name: "Talks".to_string(),
            },
        )
        .unwrap();
        let content = apply(
            &content,
            &Edit::RenameSection {
                key: "talks".to_string(),
                name: "Conference Talks".to_string(),
            },
        )
        .unwrap();

        assert_eq!(
            content.sections.registry().display_name("talks"),
            "Conference Talks"
        );
        assert_eq!(content.sections.custom("talks").unwrap().title, "Conference Talks");
    }

    #[test]
    fn test_add_and_remove_bullet() {
        let (content, item_id) = make_content_with_one_job();
        let content = apply(
            &content,
            &Edit::AddBullet {
                section: "experience".to_string(),
                item_id,
                text: "Did a thing 3x faster".to_string(),
            },
        )
        .unwrap();

        let bullet_id = content.sections.items("experience").unwrap()[0].bullet_points[0].id;
        let content = apply(
            &content,
            &Edit::RemoveBullet {
                section: "experience".to_string(),
                item_id,
                bullet_id,
            },
        )
        .unwrap();
        assert!(content.sections.items("experience").unwrap()[0]
            .bullet_points
            .is_empty());
    }

    #[test]
    fn test_bullet_edit_on_missing_item_is_item_not_found() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::AddBullet {
                section: "experience".to_string(),
                item_id: Uuid::new_v4(),
                text: "x".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::ItemNotFound { .. }));
    }

    #[test]
    fn test_reorder_sections_replaces_order() {
        let content = ResumeContent::default();
        let order = vec![
            "skills".to_string(),
            "experience".to_string(),
            "education".to_string(),
        ];
        let content = apply(
            &content,
            &Edit::ReorderSections {
                order: order.clone(),
            },
        )
        .unwrap();
        assert_eq!(content.section_order, order);
    }

    #[test]
    fn test_reorder_rejects_unknown_key() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::ReorderSections {
                order: vec!["experience".to_string(), "ghost".to_string()],
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::InvalidOrder(_)));
    }

    #[test]
    fn test_reorder_rejects_duplicate_key() {
        let content = ResumeContent::default();
        let err = apply(
            &content,
            &Edit::ReorderSections {
                order: vec!["experience".to_string(), "experience".to_string()],
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditError::InvalidOrder(_)));
    }

    #[test]
    fn test_apply_all_is_atomic() {
        let content = ResumeContent::default();
        let before = content.clone();
        let edits = vec![
            Edit::AddItem {
                section: "experience".to_string(),
                item: make_experience_item("Kept?"),
            },
            Edit::AddItem {
                section: "ghost".to_string(),
                item: make_experience_item("Never"),
            },
        ];

        let err = apply_all(&content, &edits).unwrap_err();
        assert_eq!(err, EditError::UnknownSection("ghost".to_string()));
        // The first (valid) edit must not have leaked into the input.
        assert_eq!(content, before);
        assert!(content.sections.items("experience").unwrap().is_empty());
    }

    #[test]
    fn test_apply_all_applies_in_submission_order() {
        let content = ResumeContent::default();
        let item = make_experience_item("Engineer");
        let item_id = item.id;
        let edits = vec![
            Edit::AddItem {
                section: "experience".to_string(),
                item,
            },
            Edit::AddBullet {
                section: "experience".to_string(),
                item_id,
                text: "first".to_string(),
            },
            Edit::AddBullet {
                section: "experience".to_string(),
                item_id,
                text: "second".to_string(),
            },
        ];

        let content = apply_all(&content, &edits).unwrap();
        let bullets = &content.sections.items("experience").unwrap()[0].bullet_points;
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0].text, "first");
        assert_eq!(bullets[1].text, "second");
    }

    #[test]
    fn test_every_applied_edit_keeps_invariants() {
        let content = ResumeContent::default();
        let mut content = apply(
            &content,
            &Edit::AddCustomSection {
                name: "Open Source".to_string(),
            },
        )
        .unwrap();
        for edit in [
            Edit::AddItem {
                section: "skills".to_string(),
                item: Item::new(ItemData::Skill(SkillData {
                    name: "Rust".to_string(),
                    level: None,
                })),
            },
            Edit::ReorderSections {
                order: vec!["open-source".to_string(), "skills".to_string()],
            },
        ] {
            content = apply(&content, &edit).unwrap();
            content.sections.validate().unwrap();
        }
    }

    #[test]
    fn test_edit_wire_format_round_trip() {
        let edit = Edit::AddCustomSection {
            name: "Talks".to_string(),
        };
        let value = serde_json::to_value(&edit).unwrap();
        assert_eq!(value["op"], "add_custom_section");
        let back: Edit = serde_json::from_value(value).unwrap();
        assert_eq!(edit, back);
    }
}
