use clap::{Parser, Subcommand};
use media_variants::imaging::{self, RustBackend};
use media_variants::{config, output, process};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "media-variants")]
#[command(about = "Derive thumbnails, WebP copies and responsive sizes from uploaded images")]
#[command(long_about = "\
Derive thumbnails, WebP copies and responsive sizes from uploaded images

For every JPEG, PNG, WebP or TIFF input:

  1. the original is re-encoded in its own format and the smaller buffer kept
  2. a WebP thumbnail is made if the image exceeds the thumbnail box
  3. a full-size WebP copy is made
  4. one WebP per breakpoint smaller than the image's width or height

Other formats are passed through without variants.

Settings are read from --config, or from ./media-variants.toml when present.
Run 'media-variants gen-config' to generate a documented config file.

Set RUST_LOG=debug to see why individual variants were dropped.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print format, dimensions, size and eligibility of image files
    Probe {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Optimize images and write their variants plus manifest.json
    Process {
        /// Image files or directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(long, short)]
        output: PathBuf,
        /// Settings file (defaults to ./media-variants.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a stock media-variants.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Probe { files } => {
            let backend = RustBackend::new();
            for path in &files {
                let bytes = std::fs::read(path)?;
                let meta = imaging::probe(&backend, &bytes);
                output::print_probe(&path.display().to_string(), &meta);
            }
        }
        Command::Process {
            inputs,
            output: output_dir,
            config: config_path,
        } => {
            let settings = load_settings(config_path.as_deref())?;
            init_thread_pool(&settings.processing);

            let files = process::collect_inputs(&inputs)?;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result =
                process::process_files(&RustBackend::new(), &files, &settings, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            process::write_outputs(&output_dir, &result.uploads)?;
            println!(
                "{}",
                output::format_summary(result.uploads.len(), result.failures.len(), &output_dir)
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit file must exist; otherwise fall back to the working directory.
fn load_settings(path: Option<&Path>) -> Result<config::UploadSettings, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
