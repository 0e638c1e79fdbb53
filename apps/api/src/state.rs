use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::export::pdf::PdfRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis caches public share-link reads with a TTL bounded by the link expiry.
    pub redis: RedisClient,
    /// S3 archives original uploaded resume files.
    pub s3: S3Client,
    pub config: Config,
    /// Pluggable PDF backend. Default: HttpPdfRenderer against RENDER_ENGINE_URL.
    pub pdf_renderer: Arc<dyn PdfRenderer>,
}
