//! Upload intake: decide what kind of menu file arrived and stage it on disk.
//!
//! pdfium needs a file-system path, and the rasteriser names page images
//! after the source file, so uploads are written to a `menu-*` temp file in
//! the upload directory. The file is removed when [`StagedMenu`] is dropped,
//! even if the scan fails part-way.

use crate::error::MenuScanError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// The two accepted upload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Pdf,
    Image,
}

impl MenuKind {
    /// Classify a MIME type: `application/pdf` or any `image/*`.
    /// Everything else is not accepted.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if essence == "application/pdf" {
            Some(MenuKind::Pdf)
        } else if essence.starts_with("image/") {
            Some(MenuKind::Image)
        } else {
            None
        }
    }

    /// Classify file content by its leading bytes.
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"%PDF") {
            Some(MenuKind::Pdf)
        } else if image::guess_format(head).is_ok() {
            Some(MenuKind::Image)
        } else {
            None
        }
    }

    /// Classify a local file by content.
    pub fn detect(path: &Path) -> Result<Option<Self>, MenuScanError> {
        use std::io::Read;
        let mut head = [0u8; 32];
        let mut f = std::fs::File::open(path).map_err(|source| MenuScanError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let n = f.read(&mut head).map_err(|source| MenuScanError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::sniff(&head[..n]))
    }
}

/// A menu file received over HTTP.
#[derive(Debug, Clone)]
pub struct UploadedMenu {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Client-supplied name; informational only.
    pub file_name: Option<String>,
}

impl UploadedMenu {
    /// The upload's kind, or None if its MIME type is not accepted.
    pub fn kind(&self) -> Option<MenuKind> {
        MenuKind::from_mime(&self.mime_type)
    }

    /// Write the upload to a fresh `menu-*` file in `upload_dir`.
    pub fn stage(&self, upload_dir: &Path) -> Result<StagedMenu, MenuScanError> {
        let kind = self.kind().ok_or(MenuScanError::NoMenuFile)?;
        let io_err = |source: std::io::Error| MenuScanError::StagingFailed {
            path: upload_dir.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(upload_dir).map_err(io_err)?;
        let mut file = tempfile::Builder::new()
            .prefix("menu-")
            .tempfile_in(upload_dir)
            .map_err(io_err)?;
        file.write_all(&self.bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        debug!(
            "Staged {} upload ({} bytes) at {}",
            self.mime_type,
            self.bytes.len(),
            file.path().display()
        );
        Ok(StagedMenu { file, kind })
    }
}

/// An upload written to disk; deleted on drop.
pub struct StagedMenu {
    file: NamedTempFile,
    kind: MenuKind,
}

impl StagedMenu {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn kind(&self) -> MenuKind {
        self.kind
    }

    /// Owned copy of the path, for moving into blocking tasks.
    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}
