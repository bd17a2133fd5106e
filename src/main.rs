use clap::{Parser, Subcommand};
use photo_frame::imaging::{CaptionFonts, ImageBackend, RustBackend, inspect_photo};
use photo_frame::process::{self, BatchOptions, FileStore, FsStore};
use photo_frame::{config, output};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Shared rendering overrides, applied on top of the config file.
#[derive(clap::Args, Clone, Default)]
struct RenderArgs {
    /// Output directory (overrides `output_dir`)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JPEG quality 50-100; 100 keeps the source pixel size
    #[arg(long, short)]
    quality: Option<u32>,

    /// Flat average-colour background instead of a blurred backdrop
    #[arg(long)]
    pure_background: bool,

    /// Landscape canvas even for portrait photos
    #[arg(long)]
    landscape: bool,

    /// Explicit canvas size, e.g. 3000x2400
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-frame")]
#[command(about = "Frame photos on a blurred backdrop with an EXIF caption")]
#[command(long_about = "\
Frame photos on a blurred backdrop with an EXIF caption

Each photo is centred on a blurred, dimmed copy of itself (or a flat
average colour), given rounded corners and a soft drop shadow, and
captioned with the camera and exposure read from its EXIF data:

  ┌──────────────────────────────┐
  │   ╭──────────────────────╮   │
  │   │                      │   │
  │   │        photo         │   │
  │   │                      │   │
  │   ╰──────────────────────╯   │
  │  35mm f/2.8 1/250s ISO100    │
  │        Sony ILCE-7M4         │
  └──────────────────────────────┘

Inputs are JPEG, PNG, TIFF or WebP files. Camera RAW files (CR2, NEF,
ARW, DNG, ...) are not supported: convert them first.

Output files are named {stem}_watermark_{unix millis}.jpg.

Sizing (first match wins):
  quality 100        keep the source pixel size
  --size WxH         exact canvas size
  otherwise          4:5 portrait / 5:4 landscape frame, at most 4000px

Run 'photo-frame gen-config' to generate a documented watermark.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./watermark.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render framed JPEGs for files and directories
    ///
    /// Reads JPEG, PNG, TIFF and WebP. Camera RAW files are not supported
    /// and fail with a decode error; convert them to one of these first.
    Render {
        /// Photos or directories of photos (JPEG, PNG, TIFF, WebP; no RAW)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        args: RenderArgs,
    },
    /// Show caption and layout for photos without rendering
    Inspect {
        /// Photos or directories of photos
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        args: RenderArgs,
    },
    /// Print a stock watermark.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Render { inputs, args } => {
            let config = build_config(cli.config.as_deref(), &args)?;
            let paths = process::discover_inputs(&inputs);
            if paths.is_empty() {
                return Err("no photos found".into());
            }

            let backend = RustBackend::new();
            let store = FsStore;
            let fonts = match CaptionFonts::resolve(&config) {
                Ok(fonts) => Some(fonts),
                Err(e) => {
                    warn!(error = %e, "no caption font available, rendering without captions");
                    None
                }
            };

            let mut tasks = process::load_tasks(&backend, &store, &paths);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_progress_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::run_batch(
                &backend,
                &store,
                &mut tasks,
                &config,
                BatchOptions {
                    fonts: fonts.as_ref(),
                    progress: Some(tx),
                    cancel: None,
                },
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            output::print_batch_summary(&result);

            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Inspect {
            inputs,
            json,
            args,
        } => {
            let config = build_config(cli.config.as_deref(), &args)?;
            let backend = RustBackend::new();
            let store = FsStore;
            let mut reports = Vec::new();
            let mut failed = 0;

            for (i, path) in process::discover_inputs(&inputs).iter().enumerate() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let inspection = store
                    .read(path)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| {
                        let metadata = backend.read_metadata(&bytes).ok();
                        inspect_photo(&backend, &bytes, metadata.as_ref(), &config)
                            .map_err(|e| e.to_string())
                    });
                match inspection {
                    Ok(inspection) if json => reports.push(serde_json::json!({
                        "file": path.display().to_string(),
                        "inspection": inspection,
                    })),
                    Ok(inspection) => output::print_inspection(i + 1, &name, &inspection),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{name}: {e}");
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stock defaults, then the config file, then CLI flags; validated last.
fn build_config(
    path: Option<&std::path::Path>,
    args: &RenderArgs,
) -> Result<config::WatermarkConfig, Box<dyn std::error::Error>> {
    let raw = match path {
        Some(p) => Some(config::load_raw_config(p)?.ok_or_else(|| {
            format!("config file not found: {}", p.display())
        })?),
        None => config::load_raw_config(std::path::Path::new(config::CONFIG_FILENAME))?,
    };
    let mut config = config::resolve_config(raw)?;

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(quality) = args.quality {
        config.output_quality = quality;
    }
    if args.pure_background {
        config.pure_background = true;
    }
    if args.landscape {
        config.landscape_output = true;
    }
    if let Some((width, height)) = args.size {
        config.use_custom_output_size = true;
        config.output_width = width;
        config.output_height = height;
    }

    config.validate()?;
    Ok(config)
}

/// Parse `WIDTHxHEIGHT` (also accepts `X` and `×`).
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid size component '{v}'"))
    };
    Ok((parse(w)?, parse(h)?))
}
