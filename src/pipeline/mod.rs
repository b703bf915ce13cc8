//! Pipeline stages for menu scanning.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested alone and the external services can be swapped behind a trait.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ preprocess ──▶ store ──▶ llm ──▶ normalize ──▶ aggregate
//! (upload)  (pdfium)   (gray+gamma)   (URL)    (VLM)   (JSON)        (merge)
//! ```
//!
//! 1. [`input`]     : classify the upload (PDF / image) and stage it on disk
//! 2. [`render`]    : rasterise PDF pages to PNG files; `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`preprocess`]: grayscale + gamma, re-encoded as PNG
//! 4. [`store`]     : publish the PNG (object store URL or inline data URI)
//! 5. [`llm`]       : one model call per page, behind [`llm::MenuReader`]
//! 6. [`normalize`] : strip fencing, parse and validate the menu JSON
//! 7. [`aggregate`] : merge pages into one `{ name, categories }`

pub mod aggregate;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod preprocess;
pub mod render;
pub mod store;
