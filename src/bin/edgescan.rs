//! CLI binary for pdf-edgescan.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ScanConfig` / `ServerConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_edgescan::{
    inspect, process_file, serve, FilterMethod, ProgressCallback, ScanConfig,
    ScanProgressCallback, ServerConfig,
};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per filtered page.
/// Pages may finish out of order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner only; the length is set by `on_scan_start` once pdfium has
    /// rendered the document.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
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
        .tick_strings(SPINNER_TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Filtering");
        self.bar.reset_eta();
    }

    fn take_elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_scan_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Filtering {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize) {
        let elapsed_ms = self.take_elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_scan_complete(&self, total_pages: usize, output_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages scanned  {}",
            green("✔"),
            bold(&total_pages.to_string()),
            dim(&format!("{output_bytes} bytes")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan with the default Laplacian filter
  edgescan convert document.pdf

  # Sobel edges, custom output path, 4 pages filtered in parallel
  edgescan convert --method sobel --concurrency 4 document.pdf -o edges.pdf

  # Machine-readable stats
  edgescan convert --json document.pdf > stats.json

  # Inspect PDF metadata
  edgescan inspect document.pdf

  # Run the upload service (POST /upload, GET /health)
  edgescan serve --bind 0.0.0.0:5000

  curl -F file=@document.pdf -F edgemode=sobel \
       http://127.0.0.1:5000/upload -o scanned_document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise: next to the binary,
                          working directory, then the system loader path)
  EDGESCAN_METHOD         Default edge method (laplacian, sobel)
  EDGESCAN_DPI            Default rendering DPI
  EDGESCAN_BIND           Listen address for `serve`
  RUST_LOG                Override log filtering (e.g. pdf_edgescan=debug)
"#;

/// Edge-detect every page of a PDF and produce a "scanned" PDF.
#[derive(Parser, Debug)]
#[command(
    name = "edgescan",
    version,
    about = "Turn PDFs into edge-detected \"scanned document\" PDFs",
    long_about = "Rasterise each page of a PDF, apply a Laplacian or Sobel edge filter, \
normalise and invert the result so edges appear dark on white, and reassemble the pages \
into a new PDF. Available as a one-shot command or as an HTTP upload service.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "EDGESCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "EDGESCAN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan one PDF and write the result.
    Convert {
        /// Local PDF file.
        input: PathBuf,

        /// Output PDF path.
        #[arg(short, long, default_value = "scanned_document.pdf")]
        output: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Pages filtered in parallel.
        #[arg(short, long, env = "EDGESCAN_CONCURRENCY", default_value_t = 1)]
        concurrency: usize,

        /// PDF user password for encrypted documents.
        #[arg(long, env = "EDGESCAN_PASSWORD")]
        password: Option<String>,

        /// Print ScanStats as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "EDGESCAN_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Serve the HTTP upload endpoint.
    Serve {
        /// Listen address.
        #[arg(long, env = "EDGESCAN_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "EDGESCAN_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Print PDF metadata without scanning.
    Inspect {
        /// Local PDF file.
        input: PathBuf,

        /// Print metadata as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Edge method: laplacian or sobel.
    #[arg(long, env = "EDGESCAN_METHOD", default_value = "laplacian")]
    method: FilterMethod,

    /// Rendering DPI (72–600).
    #[arg(long, env = "EDGESCAN_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // While the progress bar is drawn, library INFO logs would tear it.
    let show_progress = match &cli.command {
        Command::Convert {
            json, no_progress, ..
        } => !cli.quiet && !*no_progress && !*json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    match cli.command {
        Command::Convert {
            ref input,
            ref output,
            ref scan,
            concurrency,
            ref password,
            json,
            ..
        } => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new_dynamic() as Arc<dyn ScanProgressCallback>)
            } else {
                None
            };

            let mut builder = ScanConfig::builder()
                .method(scan.method)
                .dpi(scan.dpi)
                .concurrency(concurrency);
            if let Some(pwd) = password {
                builder = builder.password(pwd.clone());
            }
            if let Some(ref lib) = cli.pdfium_lib {
                builder = builder.pdfium_lib_path(lib.clone());
            }
            if let Some(cb) = progress_cb {
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid configuration")?;

            let stats = process_file(input, output, &config)
                .await
                .with_context(|| format!("Scan of '{}' failed", input.display()))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} pages  {}  {}ms  →  {}",
                    green("✔"),
                    stats.total_pages,
                    stats.method,
                    stats.total_duration_ms,
                    bold(&output.display().to_string()),
                );
            }
        }

        Command::Serve {
            bind,
            max_upload_mb,
            ref scan,
        } => {
            let mut builder = ScanConfig::builder().method(scan.method).dpi(scan.dpi);
            if let Some(ref lib) = cli.pdfium_lib {
                builder = builder.pdfium_lib_path(lib.clone());
            }
            let config = ServerConfig {
                bind,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
                scan: builder.build().context("Invalid configuration")?,
            };

            serve(config).await.context("Server failed")?;
        }

        Command::Inspect { ref input, json } => {
            let mut builder = ScanConfig::builder();
            if let Some(ref lib) = cli.pdfium_lib {
                builder = builder.pdfium_lib_path(lib.clone());
            }
            let config = builder.build().context("Invalid configuration")?;

            let meta = inspect(input, &config)
                .await
                .context("Failed to inspect PDF")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
                );
            } else {
                println!("File:         {}", input.display());
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
        }
    }

    Ok(())
}
