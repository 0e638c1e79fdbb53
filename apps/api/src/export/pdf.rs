//! PDF export adapter.
//!
//! The rasterizer is an external engine reached over HTTP. The trait keeps
//! it swappable (and mockable in tests); the default implementation wraps
//! the whole call in a hard deadline so a wedged engine surfaces as
//! `RenderTimeout` instead of hanging the request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::AppError;
use crate::export::payload::ExportPayload;

/// Page formats accepted by the rasterizer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PageFormat {
    A4,
    #[default]
    Letter,
    Legal,
}

/// The PDF rendering backend. Carried in `AppState` as `Arc<dyn PdfRenderer>`.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, payload: &ExportPayload, format: PageFormat)
        -> Result<Bytes, AppError>;
}

/// Default backend: POSTs the export payload to the render engine.
pub struct HttpPdfRenderer {
    client: reqwest::Client,
    endpoint: String,
    deadline: Duration,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        HttpPdfRenderer {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            deadline: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(
        &self,
        payload: &ExportPayload,
        format: PageFormat,
    ) -> Result<Bytes, AppError> {
        let url = format!("{}/render", self.endpoint.trim_end_matches('/'));
        let body = json!({
            "document": payload,
            "page_format": format,
        });

        with_render_deadline(self.deadline, async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| AppError::Upstream(format!("PDF engine request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::Upstream(format!(
                    "PDF engine returned {status}"
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| AppError::Upstream(format!("PDF engine body read failed: {e}")))
        })
        .await
    }
}

/// Bounds a render future: elapsing the deadline yields `RenderTimeout`, and
/// the in-flight call is dropped — no partial binary is ever returned.
pub(crate) async fn with_render_deadline<F>(deadline: Duration, fut: F) -> Result<Bytes, AppError>
where
    F: Future<Output = Result<Bytes, AppError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::RenderTimeout(deadline.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_format_wire_names() {
        assert_eq!(serde_json::to_string(&PageFormat::A4).unwrap(), "\"A4\"");
        assert_eq!(
            serde_json::to_string(&PageFormat::Letter).unwrap(),
            "\"Letter\""
        );
        let parsed: PageFormat = serde_json::from_str("\"Legal\"").unwrap();
        assert_eq!(parsed, PageFormat::Legal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapsing_is_render_timeout() {
        let result = with_render_deadline(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Bytes::from_static(b"never"))
        })
        .await;

        assert!(matches!(result, Err(AppError::RenderTimeout(1))));
    }

    #[tokio::test]
    async fn test_fast_render_passes_through() {
        let result = with_render_deadline(Duration::from_secs(5), async {
            Ok(Bytes::from_static(b"%PDF-1.7"))
        })
        .await
        .unwrap();
        assert_eq!(&result[..], b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_inner_errors_are_not_remapped() {
        let result = with_render_deadline(Duration::from_secs(5), async {
            Err(AppError::Upstream("engine down".to_string()))
        })
        .await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}
