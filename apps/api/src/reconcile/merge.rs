//! Projects the `selected=true` subtrees of a [`ParsedResume`] onto the
//! section model as a batch of engine edits plus a personal-info patch.
//!
//! Item and bullet ids are minted here — parsed provisional ids are
//! review-screen artifacts and never reach the persisted model.

use serde::{Deserialize, Serialize};

use crate::models::resume::PersonalInfo;
use crate::reconcile::models::{
    ParsedCertification, ParsedEducation, ParsedExperience, ParsedProject, ParsedResume,
};
use crate::sections::engine::Edit;
use crate::sections::model::{
    BulletPoint, CertificationData, EducationData, ExperienceData, Item, ItemData, ProjectData,
    SkillData,
};

/// Selected personal-info fields, ready to overlay onto the stored header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonalInfoPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub summary: Option<String>,
}

impl PersonalInfoPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.linkedin.is_none()
            && self.github.is_none()
            && self.summary.is_none()
    }

    /// Overlays every present field onto the stored header.
    pub fn apply_to(&self, info: &mut PersonalInfo) {
        if let Some(v) = &self.full_name {
            info.full_name = v.clone();
        }
        if let Some(v) = &self.email {
            info.email = Some(v.clone());
        }
        if let Some(v) = &self.phone {
            info.phone = Some(v.clone());
        }
        if let Some(v) = &self.location {
            info.location = Some(v.clone());
        }
        if let Some(v) = &self.linkedin {
            info.linkedin = Some(v.clone());
        }
        if let Some(v) = &self.github {
            info.github = Some(v.clone());
        }
        if let Some(v) = &self.summary {
            info.summary = Some(v.clone());
        }
    }
}

/// The outcome of reconciliation: a header patch and a batch of edits to be
/// committed atomically through the engine.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub personal_info: PersonalInfoPatch,
    pub edits: Vec<Edit>,
}

/// Maps the selected subtrees of `parsed` to edits. Confidence scores are
/// not consulted: a low-confidence field the user selected is committed.
pub fn reconcile(parsed: &ParsedResume) -> Reconciled {
    let mut edits = Vec::new();

    for field in parsed.experience.iter().filter(|f| f.selected) {
        edits.push(add_item_edit("experience", experience_item(&field.value)));
    }
    for field in parsed.education.iter().filter(|f| f.selected) {
        edits.push(add_item_edit("education", education_item(&field.value)));
    }
    for field in parsed.skills.iter().filter(|f| f.selected) {
        edits.push(add_item_edit(
            "skills",
            Item::new(ItemData::Skill(SkillData {
                name: field.value.clone(),
                level: None,
            })),
        ));
    }
    for field in parsed.projects.iter().filter(|f| f.selected) {
        edits.push(add_item_edit("projects", project_item(&field.value)));
    }
    for field in parsed.certifications.iter().filter(|f| f.selected) {
        edits.push(add_item_edit(
            "certifications",
            certification_item(&field.value),
        ));
    }

    Reconciled {
        personal_info: personal_patch(parsed),
        edits,
    }
}

fn add_item_edit(section: &str, item: Item) -> Edit {
    Edit::AddItem {
        section: section.to_string(),
        item,
    }
}

fn personal_patch(parsed: &ParsedResume) -> PersonalInfoPatch {
    let p = &parsed.personal_info;
    let pick = |field: &Option<crate::reconcile::models::ParsedField<String>>| {
        field
            .as_ref()
            .filter(|f| f.selected)
            .map(|f| f.value.clone())
    };

    PersonalInfoPatch {
        full_name: pick(&p.full_name),
        email: pick(&p.email),
        phone: pick(&p.phone),
        location: pick(&p.location),
        linkedin: pick(&p.linkedin),
        github: pick(&p.github),
        summary: pick(&p.summary),
    }
}

fn experience_item(parsed: &ParsedExperience) -> Item {
    let mut item = Item::new(ItemData::Experience(ExperienceData {
        role: parsed.role.clone(),
        company: parsed.company.clone(),
        location: None,
        start_date: parsed.start_date.clone(),
        end_date: parsed.end_date.clone(),
    }));
    item.bullet_points = parsed
        .bullets
        .iter()
        .map(|text| BulletPoint::new(text.clone()))
        .collect();
    item
}

fn education_item(parsed: &ParsedEducation) -> Item {
    Item::new(ItemData::Education(EducationData {
        institution: parsed.institution.clone(),
        degree: parsed.degree.clone(),
        field: None,
        start_date: parsed.start_date.clone(),
        end_date: parsed.end_date.clone(),
    }))
}

fn project_item(parsed: &ParsedProject) -> Item {
    let mut item = Item::new(ItemData::Project(ProjectData {
        name: parsed.name.clone(),
        url: parsed.url.clone(),
        tech_stack: Vec::new(),
    }));
    item.description = parsed.description.clone();
    item.bullet_points = parsed
        .bullets
        .iter()
        .map(|text| BulletPoint::new(text.clone()))
        .collect();
    item
}

fn certification_item(parsed: &ParsedCertification) -> Item {
    Item::new(ItemData::Certification(CertificationData {
        name: parsed.name.clone(),
        issuer: parsed.issuer.clone(),
        date: parsed.date.clone(),
        credential_id: None,
    }))
}
