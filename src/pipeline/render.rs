//! PDF rasterisation: render every page to a PNG file via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio worker threads keep serving other requests while a menu renders.
//!
//! ## Lifetime
//!
//! Each call renders into its own temporary directory under
//! `RasterOptions::output_dir`; [`RenderedPages`] deletes it on drop, so
//! page images never outlive the scan that needed them.
//!
//! ## Sizing
//!
//! Pages render at a target width of 3000 px with the height capped at
//! 2400 px; pdfium keeps the aspect ratio, so landscape menus hit the width
//! and portrait menus hit the height cap.

use crate::config::RasterOptions;
use crate::error::MenuScanError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Page PNGs of one rasterised PDF, held in a scan-private directory under
/// `RasterOptions::output_dir`. The directory and its pages are removed on
/// drop.
#[derive(Debug)]
pub struct RenderedPages {
    dir: TempDir,
    pages: Vec<PathBuf>,
}

impl RenderedPages {
    /// Page files in page order.
    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Rasterise every page of `pdf_path` into a fresh directory under
/// `options.output_dir`.
///
/// Files are named `{stem}.{page}.png` with 1-indexed pages, and returned
/// in page order.
pub async fn rasterize_pdf(
    pdf_path: &Path,
    options: &RasterOptions,
) -> Result<RenderedPages, MenuScanError> {
    let path = pdf_path.to_path_buf();
    let options = options.clone();

    tokio::task::spawn_blocking(move || rasterize_pdf_blocking(&path, &options))
        .await
        .map_err(|e| MenuScanError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of [`rasterize_pdf`].
pub fn rasterize_pdf_blocking(
    pdf_path: &Path,
    options: &RasterOptions,
) -> Result<RenderedPages, MenuScanError> {
    let pdfium = bind_pdfium(options.pdfium_lib_path.as_deref())?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| MenuScanError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let dir_err = |e: std::io::Error| {
        MenuScanError::Internal(format!("Cannot create {}: {}", options.output_dir.display(), e))
    };
    std::fs::create_dir_all(&options.output_dir).map_err(dir_err)?;
    let dir = tempfile::Builder::new()
        .prefix("scan-")
        .tempdir_in(&options.output_dir)
        .map_err(dir_err)?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(options.width as i32)
        .set_maximum_height(options.height as i32);

    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "menu".to_string());

    let mut outputs = Vec::with_capacity(total_pages);
    for idx in 0..total_pages {
        let page_num = idx + 1;
        let fail = |detail: String| MenuScanError::RasterisationFailed { page: page_num, detail };

        let page = pages.get(idx as u16).map_err(|e| fail(format!("{:?}", e)))?;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| fail(format!("{:?}", e)))?;
        let rendered = bitmap.as_image();

        let out = dir.path().join(format!("{stem}.{page_num}.png"));
        rendered
            .save_with_format(&out, image::ImageFormat::Png)
            .map_err(|e| fail(format!("Writing {}: {}", out.display(), e)))?;

        debug!(
            "Rendered page {} → {}x{} px at {}",
            page_num,
            rendered.width(),
            rendered.height(),
            out.display()
        );
        outputs.push(out);
    }

    Ok(RenderedPages {
        dir,
        pages: outputs,
    })
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the working
/// directory, then the system library.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, MenuScanError> {
    let env_path = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from);

    let bindings = match explicit.map(Path::to_path_buf).or(env_path) {
        Some(path) => Pdfium::bind_to_library(&path).map_err(|e| {
            MenuScanError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
        })?,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| MenuScanError::PdfiumBindingFailed(e.to_string()))?,
    };

    Ok(Pdfium::new(bindings))
}
