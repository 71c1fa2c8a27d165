use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atelier::preview::{load_product, render_preview, validate_document};
use atelier::{init_logging_with_level, DesignDocument, EditorConfig, BUILD_DATE, VERSION};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "atelier")]
#[command(about = "Render print-on-demand designs headlessly", version)]
struct Cli {
    /// Editor configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rasterise a design into its texture
    Render {
        #[arg(long)]
        product: PathBuf,
        #[arg(long)]
        design: PathBuf,
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
        /// Also write the baked product atlas here
        #[arg(long)]
        bake: Option<PathBuf>,
    },
    /// Check that a design loads into a layer stack
    Validate {
        #[arg(long)]
        design: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    init_logging_with_level(level)?;
    info!("atelier {} (built {})", VERSION, BUILD_DATE);

    let config = match &cli.config {
        Some(path) => EditorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Render {
            product,
            design,
            out,
            bake,
        } => run_render(&product, &design, &out, bake.as_deref(), config),
        Commands::Validate { design } => run_validate(&design),
    }
}

fn run_render(
    product_path: &Path,
    design_path: &Path,
    out: &Path,
    bake: Option<&Path>,
    config: EditorConfig,
) -> Result<()> {
    let product = load_product(product_path)?;
    let document = DesignDocument::load_from_file(design_path)?;
    let preview = render_preview(product, &document, config, bake.is_some())?;

    let frame = preview
        .frame
        .context("Design has no elements; nothing to render")?;
    frame.save_png(out)?;
    println!("Wrote {} ({}x{})", out.display(), frame.width, frame.height);

    if let (Some(path), Some(atlas)) = (bake, preview.atlas) {
        atlas
            .save(path)
            .with_context(|| format!("Failed to write atlas {}", path.display()))?;
        println!("Wrote {} ({}x{})", path.display(), atlas.width(), atlas.height());
    }
    Ok(())
}

fn run_validate(design_path: &Path) -> Result<()> {
    let document = DesignDocument::load_from_file(design_path)?;
    let counts = validate_document(&document)?;
    let total: usize = counts.values().sum();

    println!("OK: {} ({} elements)", design_path.display(), total);
    for (kind, count) in counts {
        println!("  {}: {}", kind, count);
    }
    Ok(())
}
