//! Scan entry points: one uploaded menu in, one aggregated menu out.
//!
//! [`MenuScanner`] owns the configuration and the two external seams (the
//! model reader and the object store). It is cheap to share behind an `Arc`
//! and safe to use from many requests at once: the only state shared between
//! scans is the object-key counter in [`crate::pipeline::store`].
//!
//! ## Fan-out
//!
//! Pages go through two bounded fan-outs, each with at most
//! `config.concurrency` pages in flight:
//!
//! 1. preprocess + deliver (upload or inline)
//! 2. model call + normalise
//!
//! Both use `buffered`, not `buffer_unordered`, so results come back in page
//! order whatever order the calls finish in. The first hard error ends the
//! scan.

use crate::config::{ImageDelivery, ScanConfig};
use crate::error::MenuScanError;
use crate::menu::MenuDocument;
use crate::output::{PageReport, ScanOutput, ScanStats};
use crate::pipeline::input::{MenuKind, UploadedMenu};
use crate::pipeline::llm::{MenuReader, VisionReader};
use crate::pipeline::normalize;
use crate::pipeline::store::{inline_data_uri, ImageRef, ObjectKeys, ObjectStore};
use crate::pipeline::{aggregate, preprocess, render};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs menu scans with a fixed configuration and set of collaborators.
///
/// # Example
/// ```rust,no_run
/// use menu2json::{MenuKind, MenuScanner, ScanConfig, ImageDelivery};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ScanConfig::builder().delivery(ImageDelivery::Inline).build()?;
/// let scanner = MenuScanner::from_config(config)?;
/// let output = scanner.scan_file("menu.pdf".as_ref(), MenuKind::Pdf).await?;
/// println!("{}", serde_json::to_string_pretty(&output.menu)?);
/// # Ok(())
/// # }
/// ```
pub struct MenuScanner {
    config: ScanConfig,
    reader: Arc<dyn MenuReader>,
    store: Option<Arc<dyn ObjectStore>>,
    progress: ProgressCallback,
}

impl MenuScanner {
    /// Scanner with an explicit model reader and no object store.
    pub fn new(config: ScanConfig, reader: Arc<dyn MenuReader>) -> Self {
        Self {
            config,
            reader,
            store: None,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    /// Scanner whose reader is a [`VisionReader`] resolved from the config
    /// and environment.
    pub fn from_config(config: ScanConfig) -> Result<Self, MenuScanError> {
        let reader = VisionReader::from_config(&config)?;
        Ok(Self::new(config, Arc::new(reader)))
    }

    /// Object store used when `config.delivery` is [`ImageDelivery::ObjectStore`].
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Stage an upload in `config.upload_dir` and scan it.
    ///
    /// The staged file is removed when the scan finishes, whatever the outcome.
    pub async fn scan_upload(&self, upload: UploadedMenu) -> Result<ScanOutput, MenuScanError> {
        let staged = upload.stage(&self.config.upload_dir)?;
        info!(
            "Received {} upload{} ({} bytes)",
            upload.mime_type,
            upload.file_name.as_deref().map(|n| format!(" '{n}'")).unwrap_or_default(),
            upload.bytes.len()
        );
        self.scan_file(staged.path(), staged.kind()).await
    }

    /// Scan a menu file already on disk.
    pub async fn scan_file(
        &self,
        path: &Path,
        kind: MenuKind,
    ) -> Result<ScanOutput, MenuScanError> {
        if self.config.delivery == ImageDelivery::ObjectStore && self.store.is_none() {
            return Err(MenuScanError::StoreNotConfigured);
        }

        let render_start = Instant::now();
        // Rendered pages live until the scan finishes, then are removed.
        let rendered = match kind {
            MenuKind::Pdf => Some(render::rasterize_pdf(path, &self.config.raster).await?),
            MenuKind::Image => None,
        };
        let page_images: Vec<PathBuf> = match rendered {
            Some(ref r) => r.pages().to_vec(),
            None => vec![path.to_path_buf()],
        };
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        info!(
            "{:?} menu has {} page(s), ready in {}ms",
            kind,
            page_images.len(),
            render_duration_ms
        );

        let output = self.run(page_images, render_start, render_duration_ms).await;
        drop(rendered);
        output
    }

    /// Scan already-rasterised page images, in order, as one menu.
    ///
    /// Useful when a menu arrives as several photos rather than one PDF.
    pub async fn scan_pages(
        &self,
        page_images: Vec<PathBuf>,
    ) -> Result<ScanOutput, MenuScanError> {
        if self.config.delivery == ImageDelivery::ObjectStore && self.store.is_none() {
            return Err(MenuScanError::StoreNotConfigured);
        }
        self.run(page_images, Instant::now(), 0).await
    }

    async fn run(
        &self,
        page_images: Vec<PathBuf>,
        total_start: Instant,
        render_duration_ms: u64,
    ) -> Result<ScanOutput, MenuScanError> {
        let total_pages = page_images.len();
        self.progress.on_scan_start(total_pages);

        // ── Step 1: Preprocess + deliver ─────────────────────────────────
        let deliver_start = Instant::now();
        // Collect the futures before streaming them: a `Map` over a borrowing
        // closure is not `Send` for every lifetime, and the server needs it to be.
        let deliveries: Vec<_> = page_images
            .into_iter()
            .enumerate()
            .map(|(idx, image_path)| self.deliver_page(idx + 1, total_pages, image_path))
            .collect();
        let images: Vec<ImageRef> = stream::iter(deliveries)
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;
        let deliver_duration_ms = deliver_start.elapsed().as_millis() as u64;
        info!("Delivered {} page image(s) in {}ms", images.len(), deliver_duration_ms);

        // ── Step 2: Model calls + normalisation ──────────────────────────
        let llm_start = Instant::now();
        let reads: Vec<_> = images
            .into_iter()
            .enumerate()
            .map(|(idx, image)| self.read_page(idx + 1, total_pages, image))
            .collect();
        let results: Vec<(Option<MenuDocument>, PageReport)> = stream::iter(reads)
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

        let (documents, pages): (Vec<_>, Vec<_>) = results.into_iter().unzip();
        let parsed_pages = documents.iter().filter(|d| d.is_some()).count();
        self.progress.on_scan_complete(total_pages, parsed_pages);

        // ── Step 3: Aggregate ────────────────────────────────────────────
        let menu = aggregate::aggregate(&documents)?;

        let stats = ScanStats {
            total_pages,
            parsed_pages,
            unparsed_pages: total_pages - parsed_pages,
            categories: menu.categories.len(),
            render_duration_ms,
            deliver_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Scan complete: '{}', {} categories from {}/{} pages, {}ms total",
            menu.name, stats.categories, parsed_pages, total_pages, stats.total_duration_ms
        );

        Ok(ScanOutput { menu, pages, stats })
    }

    async fn deliver_page(
        &self,
        page: usize,
        total_pages: usize,
        image_path: PathBuf,
    ) -> Result<ImageRef, MenuScanError> {
        let png = preprocess::preprocess_page(image_path, self.config.gamma, page).await?;

        let image = match self.config.delivery {
            ImageDelivery::Inline => ImageRef::Inline(inline_data_uri(&png)),
            ImageDelivery::ObjectStore => {
                let store = self.store.as_ref().ok_or(MenuScanError::StoreNotConfigured)?;
                let key = ObjectKeys::next_key(&self.config.key_prefix);
                ImageRef::Url(store.put_public(&key, png, "image/png").await?)
            }
        };

        self.progress.on_page_delivered(page, total_pages);
        Ok(image)
    }

    async fn read_page(
        &self,
        page: usize,
        total_pages: usize,
        image: ImageRef,
    ) -> Result<(Option<MenuDocument>, PageReport), MenuScanError> {
        let start = Instant::now();
        let reply = self.reader.read_page(page, &image).await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        self.progress.on_page_read(page, total_pages, reply.len());

        let cleaned = normalize::clean_response(&reply);
        if let Some(ref dir) = self.config.artifact_dir {
            normalize::write_artifact(dir, page - 1, &cleaned).await?;
        }

        let outcome = normalize::parse_cleaned(page, &cleaned);
        let error = outcome.error().cloned();
        if let Some(ref e) = error {
            self.progress.on_page_unparsed(page, total_pages, &e.to_string());
        } else {
            debug!("Page {}: parsed", page);
        }

        let report = PageReport {
            page,
            image_url: image.url().map(str::to_string),
            reply_len: reply.len(),
            duration_ms,
            error,
        };
        Ok((outcome.into_document(), report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoReader;

    #[async_trait]
    impl MenuReader for EchoReader {
        async fn read_page(&self, page: usize, _image: &ImageRef) -> Result<String, MenuScanError> {
            Ok(format!(r#"{{"menus":[{{"name":"Page {page}","categories":[]}}]}}"#))
        }
    }

    #[tokio::test]
    async fn object_store_delivery_without_store_fails_fast() {
        let config = ScanConfig::builder().artifact_dir(None).build().unwrap();
        let scanner = MenuScanner::new(config, Arc::new(EchoReader));
        let err = scanner
            .scan_file(Path::new("does-not-matter.png"), MenuKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, MenuScanError::StoreNotConfigured));
    }

    #[tokio::test]
    async fn missing_image_is_a_preprocess_error() {
        let config = ScanConfig::builder()
            .delivery(ImageDelivery::Inline)
            .artifact_dir(None)
            .build()
            .unwrap();
        let scanner = MenuScanner::new(config, Arc::new(EchoReader));
        let err = scanner
            .scan_file(Path::new("/nonexistent/menu.png"), MenuKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, MenuScanError::PreprocessFailed { page: 1, .. }));
    }

    #[test]
    fn scan_futures_are_send() {
        fn assert_send<T: Send>(_: &T) {}
        let scanner = MenuScanner::new(ScanConfig::default(), Arc::new(EchoReader));
        let upload = scanner.scan_upload(UploadedMenu {
            bytes: Vec::new(),
            mime_type: "image/png".into(),
            file_name: None,
        });
        assert_send(&upload);
        assert_send(&scanner.scan_pages(Vec::new()));
    }
}
