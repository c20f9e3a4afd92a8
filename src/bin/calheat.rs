use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "calheat", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every selected metric and write the page model as JSON.
    Page(PageArgs),
    /// Render one metric as a PNG (raster) or SVG (vector) file.
    Panel(PanelArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Observation file: wide CSV (date column first) or a JSON observation list.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Input format; guessed from the file extension when omitted.
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding `<metric>.{png,jpg,jpeg,webp,svg}` reference images.
    #[arg(long)]
    references: Option<PathBuf>,

    /// Color scale name (YlOrBr, YlGnBu, Greens, Greys, Viridis).
    #[arg(long)]
    color_scale: Option<String>,

    /// Week-anchor day, e.g. `sun` or `mon`.
    #[arg(long)]
    anchor: Option<String>,

    /// Vertical order of week rows.
    #[arg(long, value_enum)]
    row_order: Option<RowOrderChoice>,

    /// Where the raster reference image goes.
    #[arg(long, value_enum)]
    placement: Option<PlacementChoice>,
}

#[derive(Parser, Debug)]
struct PageArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Renderer used for every panel.
    #[arg(long, value_enum)]
    variant: Option<VariantChoice>,

    /// What to do with a metric that cannot be built.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Comma-separated metrics, in page order. Defaults to every metric in the input.
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Embed raster panels as base64 data URIs.
    #[arg(long, default_value_t = false)]
    inline: bool,

    /// Build metrics in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PanelArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Metric to render.
    #[arg(long)]
    metric: String,

    /// Output path; `.svg` selects the vector grid, anything else a PNG raster composite.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Vector,
    Raster,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Abort,
    Skip,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RowOrderChoice {
    OldestFirst,
    NewestFirst,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlacementChoice {
    Above,
    Below,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Page(args) => cmd_page(args),
        Command::Panel(args) => cmd_panel(args),
    }
}

fn cmd_page(args: PageArgs) -> anyhow::Result<()> {
    let raw = read_observations(&args.input)?;
    let mut cfg = load_config(&args.input)?;

    if let Some(v) = args.variant {
        cfg.renderer_variant = match v {
            VariantChoice::Vector => calheat::RendererVariant::VectorGrid,
            VariantChoice::Raster => calheat::RendererVariant::RasterComposite,
        };
    }
    if let Some(p) = args.policy {
        cfg.missing_metric_policy = match p {
            PolicyChoice::Abort => calheat::MissingMetricPolicy::Abort,
            PolicyChoice::Skip => calheat::MissingMetricPolicy::Skip,
        };
    }
    if args.inline {
        cfg.render.encoding = calheat::RasterEncoding::InlineDataUri;
    }
    if args.parallel {
        cfg.threading.parallel = true;
    }
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }

    let selection = if args.metrics.is_empty() {
        calheat::MetricSelection::Discover
    } else {
        calheat::MetricSelection::Explicit(args.metrics.clone())
    };
    let references = reference_store(&args.input);
    let page = calheat::assemble(&selection, &raw, &cfg, references.as_ref())?;

    create_parent(&args.out)?;
    let json = page.to_json_pretty()?;
    std::fs::write(&args.out, json)
        .with_context(|| format!("write page '{}'", args.out.display()))?;

    for skipped in &page.skipped {
        eprintln!("skipped {}: {}", skipped.metric, skipped.reason);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_panel(args: PanelArgs) -> anyhow::Result<()> {
    let raw = read_observations(&args.input)?;
    let mut cfg = load_config(&args.input)?;

    let svg = has_extension(&args.out, "svg");
    cfg.renderer_variant = if svg {
        calheat::RendererVariant::VectorGrid
    } else {
        calheat::RendererVariant::RasterComposite
    };

    let references = reference_store(&args.input);
    let panel = calheat::render_panel(&args.metric, &raw, &cfg, references.as_ref())?;

    create_parent(&args.out)?;
    match &panel.body {
        calheat::PanelBody::Vector(grid) => {
            std::fs::write(&args.out, grid.to_svg(cfg.render.background))
                .with_context(|| format!("write svg '{}'", args.out.display()))?;
        }
        calheat::PanelBody::Raster(raster) => {
            std::fs::write(&args.out, &raster.png)
                .with_context(|| format!("write png '{}'", args.out.display()))?;
        }
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn read_observations(input: &InputArgs) -> anyhow::Result<Vec<calheat::RawObservation>> {
    let path = &input.in_path;
    let format = match input.format {
        Some(f) => f,
        None if has_extension(path, "json") => InputFormat::Json,
        None => InputFormat::Csv,
    };

    let f = File::open(path).with_context(|| format!("open observations '{}'", path.display()))?;
    let r = BufReader::new(f);
    let raw = match format {
        InputFormat::Csv => calheat::ingest::read_wide_csv(r),
        InputFormat::Json => calheat::ingest::read_json_observations(r),
    }
    .with_context(|| format!("parse observations '{}'", path.display()))?;
    Ok(raw)
}

fn load_config(input: &InputArgs) -> anyhow::Result<calheat::DashboardConfig> {
    let mut cfg = match &input.config {
        Some(path) => calheat::DashboardConfig::from_json_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => calheat::DashboardConfig::default(),
    };

    if let Some(name) = &input.color_scale {
        cfg.render.color_scale = name.parse()?;
    }
    if let Some(day) = &input.anchor {
        cfg.week_anchor_day = day
            .parse::<chrono::Weekday>()
            .map_err(|_| anyhow::anyhow!("unknown weekday '{day}'"))?;
    }
    if let Some(order) = input.row_order {
        cfg.render.row_order = match order {
            RowOrderChoice::OldestFirst => calheat::RowOrder::OldestFirst,
            RowOrderChoice::NewestFirst => calheat::RowOrder::NewestFirst,
        };
    }
    if let Some(placement) = input.placement {
        cfg.render.reference_placement = match placement {
            PlacementChoice::Above => calheat::ReferencePlacement::Above,
            PlacementChoice::Below => calheat::ReferencePlacement::Below,
        };
    }
    Ok(cfg)
}

fn reference_store(input: &InputArgs) -> Box<dyn calheat::ReferenceImages> {
    match &input.references {
        Some(dir) => Box::new(calheat::DirReferenceImages::new(dir.clone())),
        None => Box::new(calheat::NoReferenceImages),
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn create_parent(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
