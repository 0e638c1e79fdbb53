use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::parser::extract::{extract_text, SourceFormat};
use crate::parser::fields::parse_resume_text;
use crate::reconcile::ParsedResume;
use crate::resumes::handlers::UserIdQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ParseResponse {
    pub upload_id: Uuid,
    pub file_name: String,
    pub parsed: ParsedResume,
}

/// POST /api/v1/parse
///
/// Accepts a multipart upload (`file` field), extracts its text, and
/// returns the confidence-scored parse for user review. Nothing is written
/// to any resume document here — commit happens via the import endpoint.
pub async fn handle_parse_upload(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            upload = Some((file_name, data));
            break;
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "upload exceeds the {} byte limit",
            state.config.max_upload_bytes
        )));
    }
    let format = SourceFormat::from_file_name(&file_name).ok_or_else(|| {
        AppError::Validation("only .pdf and .docx uploads are supported".to_string())
    })?;

    let upload_id = Uuid::new_v4();
    archive_upload(&state, params.user_id, upload_id, &file_name, &data).await;

    let text = {
        let data = data.clone();
        tokio::task::spawn_blocking(move || extract_text(format, &data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))?
            .map_err(|e| AppError::UnprocessableEntity(format!("could not extract text: {e}")))?
    };

    let parsed = parse_resume_text(&text);
    info!(
        %upload_id,
        experience = parsed.experience.len(),
        education = parsed.education.len(),
        skills = parsed.skills.len(),
        "parsed uploaded resume"
    );

    Ok(Json(ParseResponse {
        upload_id,
        file_name,
        parsed,
    }))
}

/// Archives the original file to S3. Best-effort: a storage failure is
/// logged and parsing continues.
async fn archive_upload(
    state: &AppState,
    user_id: Uuid,
    upload_id: Uuid,
    file_name: &str,
    data: &Bytes,
) {
    let key = format!("uploads/{user_id}/{upload_id}/{file_name}");
    let result = state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(data.to_vec()))
        .send()
        .await;
    if let Err(e) = result {
        warn!("failed to archive upload {key}: {e}");
    }
}
