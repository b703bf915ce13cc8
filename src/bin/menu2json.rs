//! CLI binary for menu2json.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `scan` runs one scan on a local file and prints the aggregated menu.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use menu2json::server;
use menu2json::{
    ImageDelivery, MenuKind, MenuScanner, ObjectStore, PromptStyle, RasterOptions, ScanConfig,
    ScanProgressCallback, SpacesClient, SpacesConfig,
};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// One stderr line per page event. Pages finish out of order, so every line
/// carries its page number.
struct CliProgressCallback;

impl ScanProgressCallback for CliProgressCallback {
    fn on_scan_start(&self, total_pages: usize) {
        eprintln!("Scanning {total_pages} page(s)…");
    }

    fn on_page_read(&self, page: usize, total_pages: usize, reply_len: usize) {
        eprintln!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page,
            total_pages,
            dim(&format!("{reply_len:>6} chars"))
        );
    }

    fn on_page_unparsed(&self, page: usize, total_pages: usize, error: &str) {
        eprintln!("  {} Page {:>3}/{:<3}  {}", red("✗"), page, total_pages, dim(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the upload service
  menu2json serve --addr 0.0.0.0:3000

  # Scan a local menu without object storage
  menu2json scan --inline-images menu.pdf -o menu.json

  # Upload a menu to a running service
  curl -F menu=@menu.pdf http://127.0.0.1:3000/api/upload-menu

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  SPACES_ACCESS           Object storage access key
  SPACES_SECRET           Object storage secret key
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Log filter (default: menu2json=info,tower_http=info)
"#;

/// Turn photographed or PDF menus into structured JSON using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "menu2json",
    version,
    about = "Turn photographed or PDF menus into structured JSON using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MENU2JSON_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP upload service.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "MENU2JSON_ADDR", default_value = "127.0.0.1:3000")]
        addr: SocketAddr,

        /// Maximum request body size in megabytes.
        #[arg(long, env = "MENU2JSON_BODY_LIMIT_MB", default_value_t = 50)]
        body_limit_mb: usize,

        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Scan one local menu file and print the aggregated JSON.
    Scan {
        /// Menu file: a PDF or an image.
        file: PathBuf,

        /// Write JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full scan output (pages and stats), not just the menu.
        #[arg(long)]
        full: bool,

        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// LLM model ID (e.g. gpt-4o, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "MENU2JSON_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "MENU2JSON_PROVIDER")]
    provider: Option<String>,

    /// Pages in flight per pipeline stage.
    #[arg(short, long, env = "MENU2JSON_CONCURRENCY", default_value_t = 10)]
    concurrency: usize,

    /// Max LLM output tokens per page.
    #[arg(long, env = "MENU2JSON_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MENU2JSON_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries per page on LLM failure.
    #[arg(long, env = "MENU2JSON_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, env = "MENU2JSON_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Built-in prompt: a-la-carte or set-menu.
    #[arg(long, env = "MENU2JSON_PROMPT", value_enum, default_value = "a-la-carte")]
    prompt: PromptArg,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "MENU2JSON_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Gamma applied after grayscale conversion.
    #[arg(long, env = "MENU2JSON_GAMMA", default_value_t = 3.0)]
    gamma: f32,

    /// Directory for staged uploads.
    #[arg(long, env = "MENU2JSON_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory for rasterised PDF pages.
    #[arg(long, env = "MENU2JSON_CONVERTED_DIR", default_value = "converted")]
    converted_dir: PathBuf,

    /// Directory for cleaned model replies (`{index}.json`).
    #[arg(long, env = "MENU2JSON_JSON_DIR", default_value = "json")]
    json_dir: PathBuf,

    /// Do not write cleaned model replies to disk.
    #[arg(long, env = "MENU2JSON_NO_ARTIFACTS")]
    no_artifacts: bool,

    /// Send page images inline as base64 instead of uploading them.
    #[arg(long, env = "MENU2JSON_INLINE_IMAGES")]
    inline_images: bool,

    /// Object storage endpoint host.
    #[arg(long, env = "SPACES_ENDPOINT", default_value = spaces_upload::DEFAULT_ENDPOINT)]
    spaces_endpoint: String,

    /// Object storage region.
    #[arg(long, env = "SPACES_REGION", default_value = spaces_upload::DEFAULT_REGION)]
    spaces_region: String,

    /// Object storage bucket.
    #[arg(long, env = "SPACES_BUCKET", default_value = spaces_upload::DEFAULT_BUCKET)]
    spaces_bucket: String,

    /// Object storage access key.
    #[arg(long, env = "SPACES_ACCESS", hide_env_values = true)]
    spaces_access: Option<String>,

    /// Object storage secret key.
    #[arg(long, env = "SPACES_SECRET", hide_env_values = true)]
    spaces_secret: Option<String>,

    /// Key prefix for uploaded page images.
    #[arg(long, env = "MENU2JSON_KEY_PREFIX", default_value = "promptathon-cal")]
    key_prefix: String,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PromptArg {
    ALaCarte,
    SetMenu,
}

impl From<PromptArg> for PromptStyle {
    fn from(v: PromptArg) -> Self {
        match v {
            PromptArg::ALaCarte => PromptStyle::ALaCarte,
            PromptArg::SetMenu => PromptStyle::SetMenu,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "menu2json=debug,spaces_upload=debug,tower_http=debug"
    } else {
        "menu2json=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            addr,
            body_limit_mb,
            scan,
        } => {
            let scanner = build_scanner(&scan).await?;
            server::start_server(addr, Arc::new(scanner), body_limit_mb * 1024 * 1024)
                .await
                .context("Server failed")?;
        }
        Command::Scan {
            file,
            output,
            full,
            scan,
        } => {
            let kind = MenuKind::detect(&file)
                .context("Failed to read menu file")?
                .with_context(|| {
                    format!("{} is neither a PDF nor a supported image", file.display())
                })?;

            let scanner = build_scanner(&scan)
                .await?
                .with_progress(Arc::new(CliProgressCallback));
            let result = scanner.scan_file(&file, kind).await.context("Scan failed")?;

            let json = if full {
                serde_json::to_string_pretty(&result)
            } else {
                serde_json::to_string_pretty(&result.menu)
            }
            .context("Failed to serialise output")?;

            match output {
                Some(path) => tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => {
                    let mut handle = io::stdout().lock();
                    writeln!(handle, "{json}").context("Failed to write to stdout")?;
                }
            }

            eprintln!(
                "{}/{} pages parsed, {} categories in {}ms",
                result.stats.parsed_pages,
                result.stats.total_pages,
                result.stats.categories,
                result.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args to a configured scanner.
async fn build_scanner(args: &ScanArgs) -> Result<MenuScanner> {
    let config = build_config(args).await?;
    let inline = config.delivery == ImageDelivery::Inline;
    let scanner = MenuScanner::from_config(config).context("Failed to set up the LLM provider")?;

    if inline {
        return Ok(scanner);
    }

    let access = args
        .spaces_access
        .clone()
        .context("SPACES_ACCESS is not set (or pass --inline-images)")?;
    let secret = args
        .spaces_secret
        .clone()
        .context("SPACES_SECRET is not set (or pass --inline-images)")?;
    let spaces = SpacesConfig::new(access, secret)
        .endpoint(args.spaces_endpoint.clone())
        .region(args.spaces_region.clone())
        .bucket(args.spaces_bucket.clone());
    let client = SpacesClient::new(spaces).context("Failed to create object storage client")?;

    Ok(scanner.with_store(Arc::new(client) as Arc<dyn ObjectStore>))
}

/// Map CLI args to `ScanConfig`.
async fn build_config(args: &ScanArgs) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder()
        .concurrency(args.concurrency)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .prompt_style(args.prompt.clone().into())
        .gamma(args.gamma)
        .raster(RasterOptions {
            output_dir: args.converted_dir.clone(),
            ..RasterOptions::default()
        })
        .delivery(if args.inline_images {
            ImageDelivery::Inline
        } else {
            ImageDelivery::ObjectStore
        })
        .key_prefix(args.key_prefix.clone())
        .upload_dir(args.upload_dir.clone())
        .artifact_dir((!args.no_artifacts).then(|| args.json_dir.clone()));

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = args.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
