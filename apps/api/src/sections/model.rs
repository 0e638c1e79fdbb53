//! The section model — the canonical representation of a resume's content.
//!
//! A resume is an ordered, keyed collection of sections. The five built-in
//! sections (`experience`, `education`, `skills`, `projects`,
//! `certifications`) are stored as typed item lists; user-defined custom
//! sections live in a keyed map. Display metadata for every key is held in
//! the [`SectionRegistry`](crate::sections::meta::SectionRegistry).
//!
//! All mutation goes through the merge engine (`sections::engine`); the rest
//! of the crate only gets read access. Mutating accessors are therefore
//! `pub(in crate::sections)`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EditError;
use crate::sections::meta::SectionRegistry;

/// The reserved built-in section keys, in their default display order.
pub const BUILT_IN_KEYS: [&str; 5] = [
    "experience",
    "education",
    "skills",
    "projects",
    "certifications",
];

pub fn is_builtin(key: &str) -> bool {
    BUILT_IN_KEYS.contains(&key)
}

/// One line of free text attached to an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulletPoint {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
}

impl BulletPoint {
    pub fn new(text: impl Into<String>) -> Self {
        BulletPoint {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExperienceData {
    pub role: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EducationData {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SkillData {
    pub name: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectData {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CertificationData {
    pub name: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

/// Item payload for entries inside user-defined custom sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CustomData {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

/// Per-section-type item payload. One variant per built-in section plus
/// `Custom` for items inside user-defined sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemData {
    Experience(ExperienceData),
    Education(EducationData),
    Skill(SkillData),
    Project(ProjectData),
    Certification(CertificationData),
    Custom(CustomData),
}

impl ItemData {
    pub fn kind_str(&self) -> &'static str {
        match self {
            ItemData::Experience(_) => "experience",
            ItemData::Education(_) => "education",
            ItemData::Skill(_) => "skill",
            ItemData::Project(_) => "project",
            ItemData::Certification(_) => "certification",
            ItemData::Custom(_) => "custom",
        }
    }

    /// The item payload variant a given section key accepts.
    pub fn expected_kind(section_key: &str) -> &'static str {
        match section_key {
            "experience" => "experience",
            "education" => "education",
            "skills" => "skill",
            "projects" => "project",
            "certifications" => "certification",
            _ => "custom",
        }
    }
}

/// One entry within a section: a job, a degree, a project, and so on.
/// `id` is assigned at creation (minted during deserialization when the
/// client omits it) and never reused after deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(flatten)]
    pub data: ItemData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub bullet_points: Vec<BulletPoint>,
}

impl Item {
    pub fn new(data: ItemData) -> Self {
        Item {
            id: Uuid::new_v4(),
            data,
            description: None,
            bullet_points: Vec::new(),
        }
    }
}

/// A user-defined section: a title, optional free-text content, and an
/// ordered list of items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomSection {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// The full section model for one resume.
///
/// Serialization is deterministic (`BTreeMap` keys are sorted), so a
/// save/load round trip is structurally equal to the original: same ids,
/// same order, same metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sections {
    #[serde(default)]
    section_meta: SectionRegistry,
    #[serde(default)]
    experience: Vec<Item>,
    #[serde(default)]
    education: Vec<Item>,
    #[serde(default)]
    skills: Vec<Item>,
    #[serde(default)]
    projects: Vec<Item>,
    #[serde(default)]
    certifications: Vec<Item>,
    #[serde(default)]
    custom_sections: BTreeMap<String, CustomSection>,
}

impl Default for Sections {
    fn default() -> Self {
        Self::new()
    }
}

impl Sections {
    /// An empty model with display metadata seeded for all built-in keys.
    pub fn new() -> Self {
        Sections {
            section_meta: SectionRegistry::with_builtins(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            projects: Vec::new(),
            certifications: Vec::new(),
            custom_sections: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.section_meta
    }

    /// Items of a section, built-in or custom. `None` if the key resolves to
    /// no section in this model.
    pub fn items(&self, key: &str) -> Option<&[Item]> {
        match key {
            "experience" => Some(&self.experience),
            "education" => Some(&self.education),
            "skills" => Some(&self.skills),
            "projects" => Some(&self.projects),
            "certifications" => Some(&self.certifications),
            _ => self.custom_sections.get(key).map(|s| s.items.as_slice()),
        }
    }

    pub fn custom(&self, key: &str) -> Option<&CustomSection> {
        self.custom_sections.get(key)
    }

    pub fn custom_sections(&self) -> &BTreeMap<String, CustomSection> {
        &self.custom_sections
    }

    /// True if the key addresses a section this model can hold items for:
    /// any built-in key, or an existing custom section.
    pub fn has_section(&self, key: &str) -> bool {
        is_builtin(key) || self.custom_sections.contains_key(key)
    }

    pub(in crate::sections) fn registry_mut(&mut self) -> &mut SectionRegistry {
        &mut self.section_meta
    }

    pub(in crate::sections) fn items_mut(&mut self, key: &str) -> Option<&mut Vec<Item>> {
        match key {
            "experience" => Some(&mut self.experience),
            "education" => Some(&mut self.education),
            "skills" => Some(&mut self.skills),
            "projects" => Some(&mut self.projects),
            "certifications" => Some(&mut self.certifications),
            _ => self.custom_sections.get_mut(key).map(|s| &mut s.items),
        }
    }

    pub(in crate::sections) fn custom_mut(&mut self, key: &str) -> Option<&mut CustomSection> {
        self.custom_sections.get_mut(key)
    }

    pub(in crate::sections) fn insert_custom(&mut self, key: String, section: CustomSection) {
        self.custom_sections.insert(key, section);
    }

    pub(in crate::sections) fn remove_custom(&mut self, key: &str) -> Option<CustomSection> {
        self.custom_sections.remove(key)
    }

    /// Checks the structural invariants: custom keys never shadow built-ins,
    /// every custom key carries display metadata, and ids are unique within
    /// their enclosing collection.
    pub fn validate(&self) -> Result<(), EditError> {
        for key in self.custom_sections.keys() {
            if is_builtin(key) {
                return Err(EditError::Validation(format!(
                    "custom section key '{key}' collides with a built-in section"
                )));
            }
            if self.section_meta.get(key).is_none() {
                return Err(EditError::Validation(format!(
                    "custom section '{key}' has no metadata entry"
                )));
            }
        }

        for key in BUILT_IN_KEYS
            .iter()
            .copied()
            .chain(self.custom_sections.keys().map(String::as_str))
        {
            let items = self.items(key).unwrap_or_default();
            let mut item_ids = HashSet::new();
            for item in items {
                if !item_ids.insert(item.id) {
                    return Err(EditError::Validation(format!(
                        "duplicate item id {} in section '{key}'",
                        item.id
                    )));
                }
                let mut bullet_ids = HashSet::new();
                for bullet in &item.bullet_points {
                    if !bullet_ids.insert(bullet.id) {
                        return Err(EditError::Validation(format!(
                            "duplicate bullet id {} on item {}",
                            bullet.id, item.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_experience_item() -> Item {
        let mut item = Item::new(ItemData::Experience(ExperienceData {
            role: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: Some("Berlin".to_string()),
            start_date: Some("Jan 2021".to_string()),
            end_date: None,
        }));
        item.description = Some("Core services team".to_string());
        item.bullet_points = vec![
            BulletPoint::new("Shipped the billing pipeline"),
            BulletPoint::new("Cut p99 latency by 40%"),
        ];
        item
    }

    #[test]
    fn test_new_model_seeds_builtin_meta() {
        let sections = Sections::new();
        for key in BUILT_IN_KEYS {
            let meta = sections.registry().get(key).expect("meta for built-in");
            assert!(meta.deletable);
            assert!(meta.renamable);
        }
    }

    #[test]
    fn test_items_resolves_builtin_and_custom() {
        let mut sections = Sections::new();
        sections.experience.push(make_experience_item());
        sections.insert_custom(
            "volunteering".to_string(),
            CustomSection {
                id: Uuid::new_v4(),
                title: "Volunteering".to_string(),
                content: String::new(),
                items: vec![Item::new(ItemData::Custom(CustomData {
                    title: "Food bank".to_string(),
                    subtitle: None,
                    period: None,
                }))],
            },
        );

        assert_eq!(sections.items("experience").unwrap().len(), 1);
        assert_eq!(sections.items("volunteering").unwrap().len(), 1);
        assert!(sections.items("no-such-section").is_none());
    }

    #[test]
    fn test_save_load_round_trip_is_structurally_equal() {
        let mut sections = Sections::new();
        sections.experience.push(make_experience_item());
        sections.skills.push(Item::new(ItemData::Skill(SkillData {
            name: "Rust".to_string(),
            level: Some("Expert".to_string()),
        })));
        sections.insert_custom(
            "talks".to_string(),
            CustomSection {
                id: Uuid::new_v4(),
                title: "Talks".to_string(),
                content: "Selected conference talks".to_string(),
                items: vec![],
            },
        );

        let json = serde_json::to_string(&sections).unwrap();
        let loaded: Sections = serde_json::from_str(&json).unwrap();
        assert_eq!(sections, loaded);
    }

    #[test]
    fn test_item_data_tag_round_trip() {
        let item = make_experience_item();
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["kind"], "experience");
        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(item, back);
    }

    #[test]
    fn test_validate_rejects_duplicate_item_ids() {
        let mut sections = Sections::new();
        let item = make_experience_item();
        sections.experience.push(item.clone());
        sections.experience.push(item);
        assert!(matches!(
            sections.validate(),
            Err(EditError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_builtin_collision() {
        let mut sections = Sections::new();
        sections.insert_custom(
            "skills".to_string(),
            CustomSection {
                id: Uuid::new_v4(),
                title: "Skills".to_string(),
                content: String::new(),
                items: vec![],
            },
        );
        assert!(sections.validate().is_err());
    }

    #[test]
    fn test_expected_kind_per_section() {
        assert_eq!(ItemData::expected_kind("experience"), "experience");
        assert_eq!(ItemData::expected_kind("skills"), "skill");
        assert_eq!(ItemData::expected_kind("certifications"), "certification");
        assert_eq!(ItemData::expected_kind("volunteering"), "custom");
    }
}
