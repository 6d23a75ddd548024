#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagefit::parse;
use pagefit::writer::{DocumentInfo, LopdfWriter};
use pagefit::{ConvertOptions, ImageAsset, ImageId, ImageQueue, MarginPreset, PageSize, Rgb};

#[derive(Parser)]
#[command(name = "pagefit", version, about = "Put images on PDF pages, one per page")]
struct Cli {
    /// only report warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// report per-image layout details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// convert images into a single PDF, one image per page
    Convert {
        /// input image files, dirs or glob patterns (png, jpg, tiff, bmp, gif)
        images: Vec<PathBuf>,

        /// output PDF path, "-" for stdout
        #[arg(short, long, default_value = "converted.pdf")]
        output: PathBuf,

        /// margin around each image
        #[arg(short, long, value_enum, default_value = "no-margin")]
        margin: MarginPreset,

        /// page background colour, as #rrggbb
        #[arg(short, long, default_value = "#ffffff")]
        background: Rgb,

        /// page size
        #[arg(long, value_enum, default_value = "a4")]
        pagesize: PageSize,

        /// PDF title metadata
        #[arg(long)]
        title: Option<String>,

        /// PDF author metadata
        #[arg(long)]
        author: Option<String>,

        /// leave out the image at this 1-based input position (repeatable)
        #[arg(long = "drop", value_name = "POSITION")]
        drop_positions: Vec<u32>,
    },
    /// generate shell completions
    Completions {
        /// shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Convert {
            images,
            output,
            margin,
            background,
            pagesize,
            title,
            author,
            drop_positions,
        } => {
            let paths = parse::expand_image_paths(&images)?;
            let mut queue = ImageQueue::new();
            for path in &paths {
                let asset = ImageAsset::from_path(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                queue.push(asset);
            }
            for position in drop_positions {
                let dropped = queue
                    .remove(ImageId::from(position))
                    .with_context(|| format!("Cannot drop image {}", position))?;
                info!("Dropping {}", dropped.name);
            }

            let options = ConvertOptions {
                margin,
                background,
                page_size: pagesize,
            };
            convert(&queue, &options, DocumentInfo { title, author }, &output)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "pagefit",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn convert(
    queue: &ImageQueue,
    options: &ConvertOptions,
    info: DocumentInfo,
    output: &Path,
) -> Result<()> {
    let images = queue.snapshot();

    info!(
        "Converting {} image(s) -> {} ({}, background {})",
        images.len(),
        output.display(),
        options.margin,
        options.background
    );
    let start = std::time::Instant::now();

    let (pdf, summary) = pagefit::assemble(&images, options, LopdfWriter::new(info))?;

    if output == Path::new("-") {
        let stdout = std::io::stdout();
        let mut out = std::io::BufWriter::new(stdout.lock());
        out.write_all(&pdf)
            .and_then(|()| out.flush())
            .context("Failed to write PDF to stdout")?;
    } else {
        std::fs::write(output, &pdf)
            .with_context(|| format!("Failed to save {}", output.display()))?;
    }

    info!(
        "Done. {} page(s) saved in {:.2}s",
        summary.pages,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
