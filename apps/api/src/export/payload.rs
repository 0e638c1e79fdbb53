//! The owned, serializable snapshot of a bound render sequence.
//!
//! Preview works directly off the borrowed [`RenderSequence`]; the export
//! adapters materialize it once so the snapshot can cross an HTTP boundary
//! (PDF engine) or be traversed during document building (DOCX) after the
//! source model goes out of scope.

use serde::{Deserialize, Serialize};

use crate::models::resume::PersonalInfo;
use crate::sections::binding::{BlockContent, RenderSequence};
use crate::sections::model::{Item, ItemData};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportContent {
    Items { items: Vec<Item> },
    SkillLine { text: String },
    Custom { content: String, items: Vec<Item> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSection {
    pub key: String,
    pub title: String,
    pub content: ExportContent,
}

/// Everything an export adapter needs to render one resume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportPayload {
    pub title: String,
    pub personal_info: PersonalInfo,
    pub sections: Vec<ExportSection>,
}

impl ExportPayload {
    /// Materializes the filtered blocks of a bound sequence.
    pub fn from_sequence(
        title: &str,
        personal_info: &PersonalInfo,
        sequence: &RenderSequence<'_>,
    ) -> Self {
        let sections = sequence
            .blocks()
            .map(|block| ExportSection {
                key: block.key.to_string(),
                title: block.title.clone(),
                content: match block.content {
                    BlockContent::Items(items) => ExportContent::Items {
                        items: items.to_vec(),
                    },
                    BlockContent::SkillLine(text) => ExportContent::SkillLine { text },
                    BlockContent::Custom(custom) => ExportContent::Custom {
                        content: custom.content.clone(),
                        items: custom.items.clone(),
                    },
                },
            })
            .collect();

        ExportPayload {
            title: title.to_string(),
            personal_info: personal_info.clone(),
            sections,
        }
    }
}

/// Display heading for one item: `Role, Company` / `Degree, Institution` /
/// project, certification, or custom title.
pub fn item_heading(item: &Item) -> String {
    match &item.data {
        ItemData::Experience(e) if !e.company.is_empty() => format!("{}, {}", e.role, e.company),
        ItemData::Experience(e) => e.role.clone(),
        ItemData::Education(e) if !e.degree.is_empty() => {
            format!("{}, {}", e.degree, e.institution)
        }
        ItemData::Education(e) => e.institution.clone(),
        ItemData::Skill(s) => s.name.clone(),
        ItemData::Project(p) => p.name.clone(),
        ItemData::Certification(c) => match &c.issuer {
            Some(issuer) => format!("{} — {}", c.name, issuer),
            None => c.name.clone(),
        },
        ItemData::Custom(c) => match &c.subtitle {
            Some(subtitle) => format!("{}, {}", c.title, subtitle),
            None => c.title.clone(),
        },
    }
}

/// Secondary display line: the period, plus location/url where the item
/// type carries one.
pub fn item_subline(item: &Item) -> Option<String> {
    let period = |start: &Option<String>, end: &Option<String>| match (start, end) {
        (Some(s), Some(e)) => Some(format!("{s} – {e}")),
        (Some(s), None) => Some(format!("{s} – Present")),
        (None, Some(e)) => Some(e.clone()),
        (None, None) => None,
    };

    match &item.data {
        ItemData::Experience(e) => {
            let mut parts: Vec<String> = period(&e.start_date, &e.end_date).into_iter().collect();
            if let Some(location) = &e.location {
                parts.push(location.clone());
            }
            (!parts.is_empty()).then(|| parts.join(" · "))
        }
        ItemData::Education(e) => period(&e.start_date, &e.end_date),
        ItemData::Project(p) => p.url.clone(),
        ItemData::Certification(c) => c.date.clone(),
        ItemData::Custom(c) => c.period.clone(),
        ItemData::Skill(_) => None,
    }
}
