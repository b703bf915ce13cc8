//! Response normalisation: model reply text → typed menu document.
//!
//! Vision models wrap JSON in markdown fences and sometimes return it with
//! its newlines escaped, even when told to answer in plain JSON. Four string
//! rewrites undo that before parsing.
//!
//! ## Rule Order
//!
//! The `json`-tagged fence must go before bare fences, otherwise the bare
//! rule leaves a stray `json` word in front of the document. Escaped
//! newlines must be expanded before the backslash sweep, which would
//! otherwise turn `\n` into a literal `n`.
//!
//! The backslash sweep is lossy: an escaped quote inside a string value
//! loses its escape and the reply fails to parse. That page is then dropped,
//! which the aggregator tolerates. The prompts ask the model to avoid double
//! quotes in names and descriptions for this reason.

use crate::error::{MenuScanError, PageError};
use crate::menu::MenuDocument;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The result of normalising one page reply. Never an error: an unparsable
/// page is data, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Parsed(MenuDocument),
    Unparsed(PageError),
}

impl PageOutcome {
    /// The parsed document, if any.
    pub fn into_document(self) -> Option<MenuDocument> {
        match self {
            PageOutcome::Parsed(doc) => Some(doc),
            PageOutcome::Unparsed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match self {
            PageOutcome::Parsed(_) => None,
            PageOutcome::Unparsed(e) => Some(e),
        }
    }
}

/// Strip markdown fencing and escape debris from a reply.
///
/// Rules (applied in order, each to every occurrence):
/// 1. Remove "```json" followed by a newline
/// 2. Remove remaining "```"
/// 3. Replace the two characters `\` `n` with a newline
/// 4. Remove every remaining backslash
pub fn clean_response(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```", "")
        .replace("\\n", "\n")
        .replace('\\', "")
}

/// Clean and parse one page reply.
///
/// `page` is 1-indexed and only used to label errors.
pub fn normalize_response(page: usize, text: &str) -> PageOutcome {
    parse_cleaned(page, &clean_response(text))
}

/// Parse already-cleaned text into a validated [`MenuDocument`].
///
/// Syntax errors and shape errors are reported separately so a caller can
/// tell a truncated reply from a model that ignored the schema.
pub fn parse_cleaned(page: usize, cleaned: &str) -> PageOutcome {
    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(e) => {
            warn!("Page {}: reply is not valid JSON ({})", page, e);
            return PageOutcome::Unparsed(PageError::InvalidJson {
                page,
                detail: e.to_string(),
            });
        }
    };

    let doc: MenuDocument = match serde_json::from_value(value) {
        Ok(d) => d,
        Err(e) => {
            warn!("Page {}: reply does not match the menu schema ({})", page, e);
            return PageOutcome::Unparsed(PageError::SchemaMismatch {
                page,
                detail: e.to_string(),
            });
        }
    };

    if let Err(detail) = doc.validate() {
        warn!("Page {}: menu failed validation ({})", page, detail);
        return PageOutcome::Unparsed(PageError::SchemaMismatch { page, detail });
    }

    debug!("Page {}: parsed {} menu(s)", page, doc.menus.len());
    PageOutcome::Parsed(doc)
}

/// Write a cleaned reply to `{dir}/{index}.json`, creating `dir` if needed.
///
/// `index` is the 0-based page index. Existing files are overwritten, so
/// concurrent scans share the directory on a last-writer-wins basis.
pub async fn write_artifact(
    dir: &Path,
    index: usize,
    cleaned: &str,
) -> Result<PathBuf, MenuScanError> {
    let path = dir.join(format!("{index}.json"));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| MenuScanError::ArtifactWriteFailed {
            path: path.clone(),
            source,
        })?;
    tokio::fs::write(&path, cleaned)
        .await
        .map_err(|source| MenuScanError::ArtifactWriteFailed {
            path: path.clone(),
            source,
        })?;
    debug!("Wrote response artifact {}", path.display());
    Ok(path)
}
