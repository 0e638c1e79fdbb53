pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::export::handlers as export_handlers;
use crate::parser::handlers as parser_handlers;
use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + 16 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/v1/user/profile",
            get(handlers::handle_get_profile).put(handlers::handle_put_profile),
        )
        // Resume documents
        .route(
            "/api/v1/resumes",
            post(handlers::handle_create_resume).get(handlers::handle_list_resumes),
        )
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get_resume)
                .patch(handlers::handle_update_resume)
                .delete(handlers::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/edits",
            post(handlers::handle_apply_edits),
        )
        .route(
            "/api/v1/resumes/:id/section-order",
            put(handlers::handle_put_section_order),
        )
        .route(
            "/api/v1/resumes/:id/import",
            post(handlers::handle_import_parsed),
        )
        .route("/api/v1/resumes/:id/preview", get(handlers::handle_preview))
        // Share links
        .route(
            "/api/v1/resumes/:id/share",
            post(handlers::handle_create_share).delete(handlers::handle_revoke_share),
        )
        .route(
            "/api/v1/public/resumes/:share_id",
            get(handlers::handle_public_resume),
        )
        // Template catalog
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        // Upload parsing
        .route("/api/v1/parse", post(parser_handlers::handle_parse_upload))
        // Export
        .route(
            "/api/v1/resumes/:id/export/pdf",
            post(export_handlers::handle_export_pdf),
        )
        .route(
            "/api/v1/resumes/:id/export/docx",
            post(export_handlers::handle_export_docx),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
