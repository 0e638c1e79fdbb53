// Resume upload parsing: text extraction from PDF/DOCX, then heuristic
// field extraction with per-field confidence scores.
// Text extraction is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod extract;
pub mod fields;
pub mod handlers;
