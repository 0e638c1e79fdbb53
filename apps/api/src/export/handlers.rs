use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::docx::render_docx;
use crate::export::payload::ExportPayload;
use crate::export::pdf::PageFormat;
use crate::resumes::handlers::{into_doc, load_resume, template_fallback_order, UserIdQuery};
use crate::sections::binding::RenderSequence;
use crate::state::AppState;

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Deserialize, Default)]
pub struct PdfExportRequest {
    #[serde(default)]
    pub format: PageFormat,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct DocxExportRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

/// POST /api/v1/resumes/:id/export/pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<PdfExportRequest>,
) -> Result<Response, AppError> {
    let payload = bound_payload(&state, params.user_id, id).await?;
    let bytes = state.pdf_renderer.render(&payload, req.format).await?;
    let name = export_file_name(req.filename.as_deref(), &payload.title, "pdf");
    Ok(binary_response(bytes, "application/pdf", &name))
}

/// POST /api/v1/resumes/:id/export/docx
pub async fn handle_export_docx(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<DocxExportRequest>,
) -> Result<Response, AppError> {
    let payload = bound_payload(&state, params.user_id, id).await?;
    let name = export_file_name(req.filename.as_deref(), &payload.title, "docx");

    let bytes = tokio::task::spawn_blocking(move || render_docx(&payload))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("DOCX build task failed: {e}")))?
        .map_err(AppError::Internal)?;

    Ok(binary_response(bytes, DOCX_MIME, &name))
}

/// Loads the resume and materializes its bound render sequence.
async fn bound_payload(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<ExportPayload, AppError> {
    let row = load_resume(state, user_id, id).await?;
    let doc = into_doc(row)?;
    let fallback = template_fallback_order(state, doc.template_id).await;
    let sequence =
        RenderSequence::bind(&doc.content.sections, &doc.content.section_order, &fallback);
    Ok(ExportPayload::from_sequence(
        &doc.title,
        &doc.personal_info,
        &sequence,
    ))
}

fn binary_response(bytes: Bytes, content_type: &str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Builds the download file name from the custom name or the resume title.
fn export_file_name(custom: Option<&str>, title: &str, extension: &str) -> String {
    let base = custom
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(title);
    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    while sanitized.contains("--") {
        sanitized = sanitized.replace("--", "-");
    }
    let sanitized = sanitized.trim_matches('-');
    let base = if sanitized.is_empty() {
        "resume"
    } else {
        sanitized
    };

    let suffix = format!(".{extension}");
    if base.to_ascii_lowercase().ends_with(&suffix) {
        base.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_title() {
        assert_eq!(
            export_file_name(None, "Backend roles 2026", "pdf"),
            "Backend-roles-2026.pdf"
        );
    }

    #[test]
    fn test_custom_file_name_wins_and_keeps_extension() {
        assert_eq!(
            export_file_name(Some("ada-cv.pdf"), "ignored", "pdf"),
            "ada-cv.pdf"
        );
        assert_eq!(export_file_name(Some("ada cv"), "ignored", "docx"), "ada-cv.docx");
    }

    #[test]
    fn test_hostile_names_are_sanitized() {
        assert_eq!(
            export_file_name(Some("../../etc/passwd"), "ignored", "pdf"),
            "etc-passwd.pdf"
        );
        assert_eq!(export_file_name(Some("\"; rm -rf"), "ignored", "pdf"), "rm-rf.pdf");
    }

    #[test]
    fn test_empty_everything_falls_back() {
        assert_eq!(export_file_name(Some("   "), "", "docx"), "resume.docx");
    }
}
