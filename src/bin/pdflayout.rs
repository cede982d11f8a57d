//! CLI binary for pdf-layout-md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReadOptions`, runs a read, and prints markdown, JSON or chunks.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_layout_md::{
    inspect, read, CharacterSplitter, ChunkOverlap, PageSelection, PageSeparator,
    HeaderSplitter, ProgressCallback, ReadOptions, ReadProgressCallback, ReaderOutput, Splitter,
    VisionCaptioner, WordSplitter,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Starts as a spinner; `on_read_start` switches to a bar once the page
    /// count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ReadProgressCallback for CliProgressCallback {
    fn on_read_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, markdown_len: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{markdown_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);

        // Keep the log line on one terminal row.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_read_complete(&self, total_pages: usize, markdown_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages read  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{markdown_len} chars")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Markdown to stdout, images embedded as base64
  pdflayout document.pdf

  # Write to a file, images replaced by "[Image omitted]"
  pdflayout --no-images document.pdf -o document.md

  # Caption images with a vision model
  pdflayout --caption --model gpt-4.1-nano report.pdf -o report.md

  # Specific pages, HTML comment separators
  pdflayout --pages 2-5 --separator comment paper.pdf

  # Read from a URL
  pdflayout https://arxiv.org/pdf/1706.03762 -o attention.md

  # Chunk the result for retrieval
  pdflayout --split word --chunk-size 200 --chunk-overlap 20 book.pdf > chunks.json

  # Inspect PDF metadata only
  pdflayout --inspect-only document.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (captioning)
  ANTHROPIC_API_KEY       Anthropic API key (captioning)
  GEMINI_API_KEY          Google Gemini API key (captioning)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, e.g. pdf_layout_md=debug
"#;

/// Reconstruct PDF page layout as reading-order Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdflayout",
    version,
    about = "Reconstruct PDF page layout (text, tables, images) as reading-order Markdown",
    long_about = "Extract positioned text, tables and images from PDF documents (local files or \
URLs) and emit them top to bottom as Markdown: prose as paragraphs, tables as pipe tables, \
images embedded, captioned by a vision model, or marked as omitted.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "PDFLAYOUT_OUTPUT")]
    output: Option<PathBuf>,

    /// Do not embed images; emit captions (with --caption) or "[Image omitted]".
    #[arg(long, env = "PDFLAYOUT_NO_IMAGES")]
    no_images: bool,

    /// Caption images with a vision model. Implies --no-images.
    #[arg(long, env = "PDFLAYOUT_CAPTION")]
    caption: bool,

    /// Vision model ID used for captions (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Caption provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file holding a custom caption prompt.
    #[arg(long, env = "PDFLAYOUT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Retries per image on caption failure.
    #[arg(long, env = "PDFLAYOUT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFLAYOUT_PAGES", default_value = "all")]
    pages: String,

    /// Page separator: marker, none, hr, comment, or a custom string.
    #[arg(long, env = "PDFLAYOUT_SEPARATOR", default_value = "marker")]
    separator: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFLAYOUT_PASSWORD")]
    password: Option<String>,

    /// Prepend YAML front-matter with document metadata.
    #[arg(long, env = "PDFLAYOUT_METADATA")]
    metadata: bool,

    /// Output the full reader record as JSON instead of Markdown.
    #[arg(long, env = "PDFLAYOUT_JSON")]
    json: bool,

    /// Split the markdown into chunks and output them as JSON.
    #[arg(long, value_enum)]
    split: Option<SplitArg>,

    /// Chunk size in characters or words (defaults: 1000 / 5).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunk overlap: a count (e.g. 20) or a fraction of the size (e.g. 0.1).
    #[arg(long, default_value = "0")]
    chunk_overlap: String,

    /// Header levels the header splitter cuts at, e.g. 1,2,3.
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    header_levels: Vec<usize>,

    /// Longest edge, in pixels, of rendered page snapshots.
    #[arg(long, env = "PDFLAYOUT_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFLAYOUT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "PDFLAYOUT_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no layout.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFLAYOUT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFLAYOUT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SplitArg {
    Character,
    Word,
    Header,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let machine_output = cli.json || cli.split.is_some();
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || machine_output {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_pdfium(cli.quiet)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let options = ReadOptions {
            password: cli.password.clone(),
            download_timeout_secs: cli.download_timeout,
            ..ReadOptions::default()
        };
        let meta = inspect(&cli.input, &options)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Read ─────────────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ReadProgressCallback>)
    } else {
        None
    };

    let options = build_options(&cli, progress_cb).await?;
    let output = read(&cli.input, &options).await.context("Read failed")?;

    let rendered = match cli.split {
        Some(kind) => {
            let chunks = split(&output, kind, &cli)?;
            serde_json::to_string_pretty(&chunks).context("Failed to serialise chunks")?
        }
        None if cli.json => output.to_json().context("Failed to serialise output")?,
        None => output.text.clone(),
    };

    match cli.output {
        Some(ref path) => {
            write_output(path, &rendered).await?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}/{} pages  {} tables  {} images  {}ms  →  {}",
                    green("✔"),
                    output.stats.processed_pages,
                    output.stats.total_pages,
                    output.stats.tables,
                    output.stats.images,
                    output.stats.total_duration_ms,
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").context("Failed to write to stdout")?;
            }
            if !cli.quiet && !show_progress {
                eprintln!(
                    "Read {}/{} pages in {}ms",
                    output.stats.processed_pages,
                    output.stats.total_pages,
                    output.stats.total_duration_ms
                );
            }
        }
    }

    Ok(())
}

/// Make sure libpdfium is available, downloading it on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ReadOptions`.
async fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReadOptions> {
    let mut builder = ReadOptions::builder()
        .show_images(!(cli.no_images || cli.caption))
        .pages(parse_pages(&cli.pages)?)
        .page_separator(parse_separator(&cli.separator))
        .max_rendered_pixels(cli.max_pixels)
        .include_metadata(cli.metadata)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read caption prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }

    if cli.caption {
        let captioner = match cli.provider.as_deref() {
            Some(provider) => VisionCaptioner::from_provider_name(provider, cli.model.as_deref()),
            None => VisionCaptioner::from_env(cli.model.as_deref()),
        }
        .context("Failed to set up the caption model")?
        .with_retries(cli.max_retries, 500);
        builder = builder.caption_model(Arc::new(captioner));
    }

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn split(
    output: &ReaderOutput,
    kind: SplitArg,
    cli: &Cli,
) -> Result<pdf_layout_md::SplitterOutput> {
    let overlap: ChunkOverlap = cli
        .chunk_overlap
        .parse()
        .context("Invalid --chunk-overlap")?;
    let splitter: Box<dyn Splitter> = match kind {
        SplitArg::Character => Box::new(CharacterSplitter::new(
            cli.chunk_size.unwrap_or(1000),
            overlap,
        )?),
        SplitArg::Word => Box::new(WordSplitter::new(cli.chunk_size.unwrap_or(5), overlap)?),
        SplitArg::Header => Box::new(HeaderSplitter::with_levels(
            cli.header_levels.iter().copied(),
        )?),
    };
    splitter
        .split(output)
        .with_context(|| format!("{} failed", splitter.name()))
}

async fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut contents = contents.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "marker" => PageSeparator::Marker,
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        _ => PageSeparator::Custom(s.to_string()),
    }
}
