use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::payload::ExportPayload;
use crate::models::resume::{PersonalInfo, ResumeDoc, ResumeRow, ShareLink};
use crate::reconcile::{reconcile, ParsedResume};
use crate::sections::binding::RenderSequence;
use crate::sections::engine::{apply_all, Edit, ResumeContent};
use crate::sections::meta::slugify;
use crate::sections::Sections;
use crate::state::AppState;

use super::store;

const SHARE_CACHE_TTL_SECS: i64 = 300;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// The user's base profile: same content shape as a resume document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileDoc {
    pub personal_info: PersonalInfo,
    pub sections: Sections,
    pub section_order: Vec<String>,
}

impl Default for ProfileDoc {
    fn default() -> Self {
        ProfileDoc {
            personal_info: PersonalInfo::default(),
            sections: Sections::new(),
            section_order: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub sections: Option<Sections>,
    #[serde(default)]
    pub section_order: Option<Vec<String>>,
}

/// GET /api/v1/user/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileDoc>, AppError> {
    let profile = load_profile(&state, params.user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/user/profile
///
/// Accepts a full or partial document; provided parts replace the stored
/// ones wholesale (document-replace semantics).
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<ProfileDoc>, AppError> {
    let mut profile = load_profile(&state, params.user_id).await?;
    if let Some(personal_info) = req.personal_info {
        profile.personal_info = personal_info;
    }
    if let Some(sections) = req.sections {
        sections.validate()?;
        profile.sections = sections;
    }
    if let Some(section_order) = req.section_order {
        profile.section_order = section_order;
    }

    let row = store::upsert_profile(
        &state.db,
        params.user_id,
        &to_value(&profile.personal_info)?,
        &to_value(&profile.sections)?,
        &to_value(&profile.section_order)?,
    )
    .await?;

    Ok(Json(ProfileDoc {
        personal_info: serde_json::from_value(row.personal_info)
            .map_err(|e| AppError::Internal(e.into()))?,
        sections: serde_json::from_value(row.sections).map_err(|e| AppError::Internal(e.into()))?,
        section_order: serde_json::from_value(row.section_order)
            .map_err(|e| AppError::Internal(e.into()))?,
    }))
}

async fn load_profile(state: &AppState, user_id: Uuid) -> Result<ProfileDoc, AppError> {
    match store::fetch_profile(&state.db, user_id).await? {
        Some(row) => Ok(ProfileDoc {
            personal_info: serde_json::from_value(row.personal_info)
                .map_err(|e| AppError::Internal(e.into()))?,
            sections: serde_json::from_value(row.sections)
                .map_err(|e| AppError::Internal(e.into()))?,
            section_order: serde_json::from_value(row.section_order)
                .map_err(|e| AppError::Internal(e.into()))?,
        }),
        None => Ok(ProfileDoc::default()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume documents
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub title: String,
    pub template_id: Option<Uuid>,
    pub updated_at: chrono::DateTime<Utc>,
    pub share_active: bool,
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeDoc>), AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if let Some(template_id) = req.template_id {
        if store::fetch_template(&state.db, template_id).await?.is_none() {
            return Err(AppError::NotFound(format!("template {template_id}")));
        }
    }

    let content = ResumeContent::default();
    let row = store::insert_resume(
        &state.db,
        req.user_id,
        title,
        req.template_id,
        &to_value(&PersonalInfo::default())?,
        &to_value(&content.sections)?,
        &to_value(&content.section_order)?,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(into_doc(row)?)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let rows = store::list_resumes(&state.db, params.user_id).await?;
    let summaries = rows
        .into_iter()
        .map(|row| ResumeSummary {
            id: row.id,
            title: row.title,
            template_id: row.template_id,
            updated_at: row.updated_at,
            share_active: row.share_active,
        })
        .collect();
    Ok(Json(summaries))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeDoc>, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    Ok(Json(into_doc(row)?))
}

#[derive(Deserialize)]
pub struct UpdateResumeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeDoc>, AppError> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
    }
    if let Some(template_id) = req.template_id {
        if store::fetch_template(&state.db, template_id).await?.is_none() {
            return Err(AppError::NotFound(format!("template {template_id}")));
        }
    }

    let row = store::update_meta(
        &state.db,
        params.user_id,
        id,
        req.title.as_deref().map(str::trim),
        req.template_id,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("resume {id}")))?;
    Ok(Json(into_doc(row)?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    if !store::soft_delete(&state.db, params.user_id, id).await? {
        return Err(AppError::NotFound(format!("resume {id}")));
    }
    if let Some(share_id) = row.share_id {
        invalidate_share_cache(&state, share_id).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Edits
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EditBatchRequest {
    pub edits: Vec<Edit>,
}

#[derive(Serialize)]
pub struct EditBatchResponse {
    pub resume: ResumeDoc,
    /// Keys derived for custom sections created by this batch, in order.
    pub created_sections: Vec<String>,
}

/// POST /api/v1/resumes/:id/edits
///
/// Applies the batch atomically: one invalid edit rejects the whole batch
/// and the stored document is untouched.
pub async fn handle_apply_edits(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<EditBatchRequest>,
) -> Result<Json<EditBatchResponse>, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    let doc = into_doc(row)?;

    let next = apply_all(&doc.content, &req.edits)?;
    let created_sections = req
        .edits
        .iter()
        .filter_map(|edit| match edit {
            Edit::AddCustomSection { name } => Some(slugify(name)),
            _ => None,
        })
        .collect();

    let resume = persist_content(&state, params.user_id, id, &doc.personal_info, &next).await?;
    Ok(Json(EditBatchResponse {
        resume,
        created_sections,
    }))
}

#[derive(Deserialize)]
pub struct SectionOrderRequest {
    pub order: Vec<String>,
}

/// PUT /api/v1/resumes/:id/section-order
pub async fn handle_put_section_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<SectionOrderRequest>,
) -> Result<Json<ResumeDoc>, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    let doc = into_doc(row)?;

    let next = crate::sections::apply(&doc.content, &Edit::ReorderSections { order: req.order })?;
    let resume = persist_content(&state, params.user_id, id, &doc.personal_info, &next).await?;
    Ok(Json(resume))
}

// ────────────────────────────────────────────────────────────────────────────
// Import (reconciled parsed data)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ImportRequest {
    pub parsed: ParsedResume,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub resume: ResumeDoc,
    pub imported_items: usize,
}

/// POST /api/v1/resumes/:id/import
///
/// Commits the selected subtrees of a parsed resume. The whole commit is
/// one document write: either every selected field lands or none does.
pub async fn handle_import_parsed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    let doc = into_doc(row)?;

    let reconciled = reconcile(&req.parsed);
    let imported_items = reconciled.edits.len();

    let next = apply_all(&doc.content, &reconciled.edits)?;
    let mut personal_info = doc.personal_info.clone();
    reconciled.personal_info.apply_to(&mut personal_info);
    info!(
        resume_id = %id,
        imported_items,
        header_updated = !reconciled.personal_info.is_empty(),
        "committing reconciled parse"
    );

    let resume = persist_content(&state, params.user_id, id, &personal_info, &next).await?;
    Ok(Json(ImportResponse {
        resume,
        imported_items,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Preview
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/:id/preview
///
/// The bound, filtered render sequence as JSON — the same snapshot the
/// export adapters consume.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ExportPayload>, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    let doc = into_doc(row)?;
    let fallback = template_fallback_order(&state, doc.template_id).await;

    let sequence = RenderSequence::bind(&doc.content.sections, &doc.content.section_order, &fallback);
    Ok(Json(ExportPayload::from_sequence(
        &doc.title,
        &doc.personal_info,
        &sequence,
    )))
}

// ────────────────────────────────────────────────────────────────────────────
// Share links
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ShareRequest {
    #[serde(default)]
    pub expires_in_days: Option<i64>,
}

/// POST /api/v1/resumes/:id/share
pub async fn handle_create_share(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<ShareLink>, AppError> {
    if let Some(days) = req.expires_in_days {
        if !(1..=365).contains(&days) {
            return Err(AppError::Validation(
                "expires_in_days must be between 1 and 365".to_string(),
            ));
        }
    }
    let row = load_resume(&state, params.user_id, id).await?;
    if let Some(old_share) = row.share_id {
        invalidate_share_cache(&state, old_share).await;
    }

    let share_id = Uuid::new_v4();
    let expires_at = req.expires_in_days.map(|days| Utc::now() + Duration::days(days));
    let row = store::set_share(&state.db, params.user_id, id, Some(share_id), true, expires_at)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("resume {id}")))?;

    Ok(Json(ShareLink {
        id: share_id,
        active: row.share_active,
        expires_at: row.share_expires_at,
    }))
}

/// DELETE /api/v1/resumes/:id/share
pub async fn handle_revoke_share(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let row = load_resume(&state, params.user_id, id).await?;
    let share_id = row
        .share_id
        .ok_or_else(|| AppError::NotFound(format!("share link for resume {id}")))?;

    store::set_share(
        &state.db,
        params.user_id,
        id,
        Some(share_id),
        false,
        row.share_expires_at,
    )
    .await?;
    invalidate_share_cache(&state, share_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize, Deserialize)]
pub struct PublicResumeResponse {
    pub title: String,
    pub data: PersonalInfo,
    pub sections: Sections,
    pub section_order: Vec<String>,
}

/// GET /api/v1/public/resumes/:share_id
///
/// Read-only public preview. Responses are cached in Redis with a TTL
/// bounded by the link expiry; cache failures degrade to a database read
/// with a logged diagnostic.
pub async fn handle_public_resume(
    State(state): State<AppState>,
    Path(share_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let cache_key = share_cache_key(share_id);
    if let Some(cached) = cache_get(&state, &cache_key).await {
        if let Ok(body) = serde_json::from_str::<Value>(&cached) {
            return Ok(Json(body));
        }
    }

    let row = store::fetch_by_share(&state.db, share_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shared resume {share_id}")))?;
    let doc = into_doc(row)?;

    let share = doc
        .share_link
        .clone()
        .ok_or_else(|| AppError::NotFound(format!("shared resume {share_id}")))?;
    let now = Utc::now();
    if !share.is_live(now) {
        return Err(AppError::NotFound(format!("shared resume {share_id}")));
    }

    let fallback = template_fallback_order(&state, doc.template_id).await;
    let sequence =
        RenderSequence::bind(&doc.content.sections, &doc.content.section_order, &fallback);
    let response = PublicResumeResponse {
        title: doc.title.clone(),
        data: doc.personal_info.clone(),
        sections: doc.content.sections.clone(),
        section_order: sequence.effective_order().to_vec(),
    };

    let body = serde_json::to_value(&response).map_err(|e| AppError::Internal(e.into()))?;
    let ttl = share
        .expires_at
        .map(|expiry| (expiry - now).num_seconds().clamp(1, SHARE_CACHE_TTL_SECS))
        .unwrap_or(SHARE_CACHE_TTL_SECS);
    cache_put(&state, &cache_key, &body.to_string(), ttl as u64).await;

    Ok(Json(body))
}

// ────────────────────────────────────────────────────────────────────────────
// Template catalog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TemplateInfo {
    pub id: Uuid,
    pub name: String,
    pub section_order: Vec<String>,
    pub thumbnail_url: Option<String>,
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateInfo>>, AppError> {
    let rows = store::list_templates(&state.db).await?;
    let templates = rows
        .into_iter()
        .map(|row| TemplateInfo {
            id: row.id,
            name: row.name,
            section_order: decode_order(&row.section_order),
            thumbnail_url: row.thumbnail_url,
        })
        .collect();
    Ok(Json(templates))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared helpers
// ────────────────────────────────────────────────────────────────────────────

pub(crate) async fn load_resume(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<ResumeRow, AppError> {
    store::fetch_resume(&state.db, user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("resume {id}")))
}

pub(crate) fn into_doc(row: ResumeRow) -> Result<ResumeDoc, AppError> {
    row.into_doc().map_err(AppError::Internal)
}

/// The template's declared fallback order, or empty when the resume has no
/// template or the catalog entry is malformed.
pub(crate) async fn template_fallback_order(
    state: &AppState,
    template_id: Option<Uuid>,
) -> Vec<String> {
    let Some(template_id) = template_id else {
        return Vec::new();
    };
    match store::fetch_template(&state.db, template_id).await {
        Ok(Some(template)) => decode_order(&template.section_order),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("template {template_id} lookup failed, using default order: {e}");
            Vec::new()
        }
    }
}

fn decode_order(value: &Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

async fn persist_content(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    personal_info: &PersonalInfo,
    content: &ResumeContent,
) -> Result<ResumeDoc, AppError> {
    let row = store::update_content(
        &state.db,
        user_id,
        id,
        &to_value(personal_info)?,
        &to_value(&content.sections)?,
        &to_value(&content.section_order)?,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("resume {id}")))?;
    into_doc(row)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn share_cache_key(share_id: Uuid) -> String {
    format!("public_resume:{share_id}")
}

async fn cache_get(state: &AppState, key: &str) -> Option<String> {
    let mut conn = match state.redis.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("redis unavailable, skipping share cache read: {e}");
            return None;
        }
    };
    match conn.get::<_, Option<String>>(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("share cache read failed: {e}");
            None
        }
    }
}

async fn cache_put(state: &AppState, key: &str, body: &str, ttl_secs: u64) {
    let mut conn = match state.redis.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("redis unavailable, skipping share cache write: {e}");
            return;
        }
    };
    if let Err(e) = conn.set_ex::<_, _, ()>(key, body, ttl_secs).await {
        warn!("share cache write failed: {e}");
    }
}

async fn invalidate_share_cache(state: &AppState, share_id: Uuid) {
    let mut conn = match state.redis.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!("redis unavailable, skipping share cache invalidation: {e}");
            return;
        }
    };
    if let Err(e) = conn.del::<_, ()>(share_cache_key(share_id)).await {
        warn!("share cache invalidation failed: {e}");
    }
}
