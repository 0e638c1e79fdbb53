//! sqlx persistence for resume documents, user profiles, and the template
//! catalog. Content payloads are JSONB; writes replace the document.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{ProfileRow, ResumeRow, TemplateRow};

pub async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn upsert_profile(
    pool: &PgPool,
    user_id: Uuid,
    personal_info: &Value,
    sections: &Value,
    section_order: &Value,
) -> sqlx::Result<ProfileRow> {
    sqlx::query_as(
        r#"
        INSERT INTO profiles (user_id, personal_info, sections, section_order, updated_at)
        VALUES ($1, $2, $3, $4, now())
        ON CONFLICT (user_id) DO UPDATE
            SET personal_info = EXCLUDED.personal_info,
                sections = EXCLUDED.sections,
                section_order = EXCLUDED.section_order,
                updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(personal_info)
    .bind(sections)
    .bind(section_order)
    .fetch_one(pool)
    .await
}

pub async fn insert_resume(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    template_id: Option<Uuid>,
    personal_info: &Value,
    sections: &Value,
    section_order: &Value,
) -> sqlx::Result<ResumeRow> {
    sqlx::query_as(
        r#"
        INSERT INTO resumes
            (id, user_id, title, template_id, personal_info, sections, section_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .bind(personal_info)
    .bind(sections)
    .bind(section_order)
    .fetch_one(pool)
    .await
}

pub async fn list_resumes(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<ResumeRow>> {
    sqlx::query_as(
        "SELECT * FROM resumes WHERE user_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_resume(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> sqlx::Result<Option<ResumeRow>> {
    sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Replaces the document content. Last write wins; concurrent sessions are
/// not merged.
pub async fn update_content(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    personal_info: &Value,
    sections: &Value,
    section_order: &Value,
) -> sqlx::Result<Option<ResumeRow>> {
    sqlx::query_as(
        r#"
        UPDATE resumes
        SET personal_info = $3, sections = $4, section_order = $5, updated_at = now()
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(personal_info)
    .bind(sections)
    .bind(section_order)
    .fetch_optional(pool)
    .await
}

pub async fn update_meta(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    title: Option<&str>,
    template_id: Option<Uuid>,
) -> sqlx::Result<Option<ResumeRow>> {
    sqlx::query_as(
        r#"
        UPDATE resumes
        SET title = COALESCE($3, title),
            template_id = COALESCE($4, template_id),
            updated_at = now()
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .fetch_optional(pool)
    .await
}

pub async fn soft_delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE resumes SET deleted_at = now() WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_share(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    share_id: Option<Uuid>,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
) -> sqlx::Result<Option<ResumeRow>> {
    sqlx::query_as(
        r#"
        UPDATE resumes
        SET share_id = $3, share_active = $4, share_expires_at = $5, updated_at = now()
        WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(share_id)
    .bind(active)
    .bind(expires_at)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_by_share(pool: &PgPool, share_id: Uuid) -> sqlx::Result<Option<ResumeRow>> {
    sqlx::query_as("SELECT * FROM resumes WHERE share_id = $1 AND deleted_at IS NULL")
        .bind(share_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_templates(pool: &PgPool) -> sqlx::Result<Vec<TemplateRow>> {
    sqlx::query_as("SELECT * FROM templates ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn fetch_template(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<TemplateRow>> {
    sqlx::query_as("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
