// Export adapters. Both consume a materialized snapshot of the render
// sequence: PDF goes through an external rasterizer behind a hard deadline,
// DOCX is built in-process. Neither touches the section model.

pub mod docx;
pub mod handlers;
pub mod payload;
pub mod pdf;

pub use payload::ExportPayload;
pub use pdf::{HttpPdfRenderer, PageFormat, PdfRenderer};
