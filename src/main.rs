// ABOUTME: Main entry point for the stepdeck program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use stepdeck::reveal::{self, StepMask};
use stepdeck::{Config, ResourceFile, WatchConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an HTML deck from markdown
    Build(BuildArgs),

    /// Render an HTML deck to step images and/or PDF
    Render(RenderArgs),

    /// List the slides of a markdown deck with their step counts
    Steps(StepsArgs),

    /// Print every step of a code reveal
    Preview(PreviewArgs),

    /// Rebuild outputs whenever the markdown deck changes
    Watch(WatchArgs),
}

#[derive(Args)]
struct ResourceArgs {
    /// CSS files to include (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    css: Option<Vec<String>>,

    /// JavaScript files to include (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    js: Option<Vec<String>>,

    /// Mode for CSS/JS: 'embed' to embed content or 'link' to reference
    #[arg(long, default_value = "embed")]
    mode: String,
}

#[derive(Args)]
struct BuildArgs {
    /// Path to the markdown deck
    #[arg(short, long)]
    input: PathBuf,

    /// Path to output HTML file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    resources: ResourceArgs,

    /// Page width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Page height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Fail if an image referenced by the deck is missing or unreadable
    #[arg(long)]
    check_assets: bool,
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the HTML deck
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for step images
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to output PDF file
    #[arg(long)]
    pdf: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Image format: png or jpeg
    #[arg(long)]
    format: Option<String>,

    /// Base name for step images
    #[arg(long)]
    base_name: Option<String>,

    /// Page load timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct StepsArgs {
    /// Path to the markdown deck
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Args)]
struct PreviewArgs {
    /// File containing the code snippet
    #[arg(short, long)]
    input: PathBuf,

    /// Step masks, e.g. "0 _ _ | 0 1 _ | .."
    #[arg(long, conflicts_with_all = ["reveal", "line_by_line"])]
    steps: Option<String>,

    /// Cumulative reveal counts, e.g. "2,1,3"
    #[arg(long, conflicts_with = "line_by_line")]
    reveal: Option<String>,

    /// Reveal one line per step
    #[arg(long)]
    line_by_line: bool,
}

#[derive(Args)]
struct WatchArgs {
    /// Path to the markdown deck
    #[arg(short, long)]
    input: PathBuf,

    /// Path to output HTML file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    resources: ResourceArgs,

    /// Directory for step images, rendered on every change
    #[arg(long)]
    slides_dir: Option<PathBuf>,

    /// Path to a PDF, printed on every change
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Serve the output directory with live reload
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Debounce time in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce: u64,
}

impl ResourceArgs {
    fn embed(&self) -> anyhow::Result<bool> {
        match self.mode.as_str() {
            "embed" => Ok(true),
            "link" => Ok(false),
            other => bail!("Unknown resource mode {:?}, expected 'embed' or 'link'", other),
        }
    }

    fn css_files(&self) -> Vec<ResourceFile> {
        self.css
            .iter()
            .flatten()
            .map(|path| ResourceFile::stylesheet(path))
            .collect()
    }

    fn js_files(&self) -> Vec<ResourceFile> {
        self.js
            .iter()
            .flatten()
            .map(|path| ResourceFile::script(path))
            .collect()
    }
}

fn build(args: &BuildArgs, config: &Config) -> anyhow::Result<()> {
    let mut deck = stepdeck::load_deck(&args.input)?;
    deck.width = args.width.unwrap_or(config.width);
    deck.height = args.height.unwrap_or(config.height);

    if args.check_assets {
        let base_dir = args.input.parent().unwrap_or(Path::new("."));
        let assets = stepdeck::check_images(&deck, base_dir)?;
        println!("Checked {} images", assets.len());
    }

    let options = config
        .get_html_options(
            args.resources.css_files(),
            args.resources.js_files(),
            Some(args.resources.embed()?),
        )
        .for_output(&args.output)?;
    let html_content = stepdeck::generate_html(&deck, &options)?;
    stepdeck::write_html_to_file(&html_content, &args.output)
        .with_context(|| format!("Failed to write output file {:?}", args.output))?;

    println!(
        "HTML generated successfully: {:?} ({} slides, {} steps)",
        args.output,
        deck.len(),
        deck.total_steps()
    );
    Ok(())
}

fn render(args: &RenderArgs, config: &Config) -> anyhow::Result<()> {
    if args.output.is_none() && args.pdf.is_none() {
        bail!("Nothing to render: pass --output for step images and/or --pdf");
    }

    let render_config = config.get_render_config(
        args.width,
        args.height,
        args.format.clone(),
        args.base_name.clone(),
        args.timeout,
    );

    if let Some(output_dir) = &args.output {
        let files = stepdeck::render_steps(&args.input, output_dir, &render_config)?;
        println!("Rendered {} step images into {:?}", files.len(), output_dir);
    }
    if let Some(pdf) = &args.pdf {
        stepdeck::render_pdf(&args.input, pdf, &render_config)?;
        println!("PDF written: {:?}", pdf);
    }
    Ok(())
}

fn steps(args: &StepsArgs) -> anyhow::Result<()> {
    let deck = stepdeck::load_deck(&args.input)?;
    for (index, slide) in deck.slides().iter().enumerate() {
        println!("{:>3}  {:>3} steps  {}", index + 1, slide.steps(), slide.name());
    }
    println!("{} slides, {} steps", deck.len(), deck.total_steps());
    Ok(())
}

fn preview(args: &PreviewArgs) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let line_count = reveal::split_source(&source).len();

    let masks: Vec<StepMask> = if let Some(steps) = &args.steps {
        stepdeck::parse_masks(steps)?
    } else if let Some(counts) = &args.reveal {
        reveal::reveal_masks(line_count, &stepdeck::parse_reveal_counts(counts)?)?
    } else if args.line_by_line {
        reveal::line_by_line_masks(line_count)
    } else {
        bail!("Pass one of --steps, --reveal or --line-by-line");
    };

    for block in stepdeck::reveal_steps(&source, &masks)? {
        println!("--- step {} ---", block.step + 1);
        println!("{}", block.text());
    }
    Ok(())
}

fn watch(args: &WatchArgs, config: &Config) -> anyhow::Result<()> {
    let watch_config = WatchConfig {
        markdown_path: args.input.clone(),
        html_output: args.output.clone(),
        slides_output_dir: args.slides_dir.clone(),
        pdf_output: args.pdf.clone(),
        html_options: config.get_html_options(
            args.resources.css_files(),
            args.resources.js_files(),
            Some(args.resources.embed()?),
        ),
        debounce_ms: args.debounce,
        serve: args.serve,
        port: args.port,
    };
    stepdeck::watch_markdown(watch_config, config)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Build(args)) => build(args, &config),
        Some(Commands::Render(args)) => render(args, &config),
        Some(Commands::Steps(args)) => steps(args),
        Some(Commands::Preview(args)) => preview(args),
        Some(Commands::Watch(args)) => watch(args, &config),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
