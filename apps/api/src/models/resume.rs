use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::sections::ResumeContent;

/// Contact and header fields of a resume, stored alongside the sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonalInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Public read-only share state of a resume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareLink {
    pub id: Uuid,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShareLink {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

/// A resume document as persisted. JSONB payloads stay untyped here and are
/// decoded at the handler boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub template_id: Option<Uuid>,
    pub personal_info: Value,
    pub sections: Value,
    pub section_order: Value,
    pub share_id: Option<Uuid>,
    pub share_active: bool,
    pub share_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The typed view of a resume document returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeDoc {
    pub id: Uuid,
    pub title: String,
    pub template_id: Option<Uuid>,
    pub personal_info: PersonalInfo,
    #[serde(flatten)]
    pub content: ResumeContent,
    pub share_link: Option<ShareLink>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    /// Decodes the JSONB payloads into the typed document.
    pub fn into_doc(self) -> anyhow::Result<ResumeDoc> {
        let personal_info: PersonalInfo = serde_json::from_value(self.personal_info)
            .context("resume personal_info payload is malformed")?;
        let sections = serde_json::from_value(self.sections)
            .context("resume sections payload is malformed")?;
        let section_order: Vec<String> = serde_json::from_value(self.section_order)
            .context("resume section_order payload is malformed")?;
        let share_link = self.share_id.map(|id| ShareLink {
            id,
            active: self.share_active,
            expires_at: self.share_expires_at,
        });

        Ok(ResumeDoc {
            id: self.id,
            title: self.title,
            template_id: self.template_id,
            personal_info,
            content: ResumeContent {
                sections,
                section_order,
            },
            share_link,
            updated_at: self.updated_at,
        })
    }
}

/// One entry of the template catalog. The binding layer only reads `id` and
/// `section_order`; the thumbnail is passthrough for pickers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub section_order: Value,
    pub thumbnail_url: Option<String>,
}

/// A user's base profile: the same content shape as a resume document,
/// keyed by user instead of resume id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub personal_info: Value,
    pub sections: Value,
    pub section_order: Value,
    pub updated_at: DateTime<Utc>,
}
