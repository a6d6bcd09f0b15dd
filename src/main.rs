use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use psig::app::App;
use psig::config::Config;
use psig::error::{AppError, AppResult};
use psig::overlay::page_sizes;
use psig::placement::Position;
use psig::session::{ExportOutcome, SigningSession};
use psig::signature::{Rgb, SignatureImage, SignatureStore, StrokeCanvas, rasterize_strokes};

#[derive(Debug, Parser)]
#[command(name = "psig", version, about = "Place a signature image onto a PDF page")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Print page count and page sizes.
    Info { pdf: PathBuf },
    /// Render one page to a PNG.
    Preview {
        pdf: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        zoom: Option<f32>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Flatten a signature onto a page without the interactive screen.
    Sign {
        pdf: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Pixel on the rendered preview, e.g. `120,340`.
        #[arg(long, conflicts_with = "percent", required_unless_present = "percent")]
        click: Option<Pair>,
        /// Page percentages, e.g. `50,80`.
        #[arg(long)]
        percent: Option<Pair>,
        /// Signature width in points.
        #[arg(long)]
        width: Option<u32>,
        #[command(flatten)]
        source: SignatureSource,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Open the interactive placement screen.
    Place {
        pdf: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[command(flatten)]
        source: SignatureSource,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage saved signatures.
    #[command(subcommand)]
    Signatures(SignaturesCommand),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct SignatureSource {
    /// PNG or JPEG file.
    #[arg(long)]
    signature: Option<PathBuf>,
    /// Stem of a saved signature.
    #[arg(long)]
    saved: Option<String>,
}

#[derive(Debug, Subcommand)]
enum SignaturesCommand {
    List,
    Save {
        image: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Rasterize strokes JSON and save the result.
    Draw {
        strokes: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        stroke_width: Option<f32>,
    },
    Delete { stem: String },
}

/// Two comma-separated numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pair {
    x: f64,
    y: f64,
}

impl FromStr for Pair {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some((x, y)) = raw.split_once(',') else {
            return Err(format!("expected X,Y but got `{raw}`"));
        };
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| format!("`{}` is not a number", value.trim()))
        };
        Ok(Self {
            x: parse(x)?,
            y: parse(y)?,
        })
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PSIG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = Config::load()?;
    match cli.command {
        CliCommand::Info { pdf } => info(&pdf),
        CliCommand::Preview {
            pdf,
            page,
            zoom,
            output,
        } => preview(&config, &pdf, page, zoom, &output),
        CliCommand::Sign {
            pdf,
            page,
            click,
            percent,
            width,
            source,
            output,
        } => sign(&config, &pdf, page, click, percent, width, &source, output),
        CliCommand::Place {
            pdf,
            page,
            source,
            output,
        } => place(config, &pdf, page, &source, output).await,
        CliCommand::Signatures(command) => signatures(&config, command),
    }
}

fn info(pdf: &Path) -> AppResult<()> {
    let bytes = std::fs::read(pdf).map_err(|source| {
        AppError::io_with_context(source, format!("failed to read pdf: {}", pdf.display()))
    })?;
    let sizes = page_sizes(&bytes)?;
    println!("{}: {} pages", pdf.display(), sizes.len());
    for (index, size) in sizes.iter().enumerate() {
        println!("  page {}: {:.1} x {:.1} pt", index + 1, size.width, size.height);
    }
    Ok(())
}

fn preview(
    config: &Config,
    pdf: &Path,
    page: usize,
    zoom: Option<f32>,
    output: &Path,
) -> AppResult<()> {
    let session = open_session(config, pdf, page)?;
    let zoom = zoom
        .filter(|zoom| zoom.is_finite() && *zoom > 0.0)
        .unwrap_or(config.preview.zoom);
    let rendered = session.render_preview(zoom)?;
    rendered
        .frame
        .to_rgba_image()?
        .save(output)
        .map_err(|source| {
            AppError::image(source, format!("failed to write preview: {}", output.display()))
        })?;

    println!(
        "page {}: {:.1} x {:.1} pt rendered at {}x{} px (scale {:.3})",
        page,
        rendered.page_width_pt,
        rendered.page_height_pt,
        rendered.frame.width,
        rendered.frame.height,
        rendered.scale_x()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn sign(
    config: &Config,
    pdf: &Path,
    page: usize,
    click: Option<Pair>,
    percent: Option<Pair>,
    width: Option<u32>,
    source: &SignatureSource,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let mut session = open_session(config, pdf, page)?;
    session.set_signature(load_signature(config, source)?);
    if let Some(width) = width {
        session.set_width(width);
    }

    let position = match (click, percent) {
        (Some(click), _) => {
            let rendered = session.render_preview(config.preview.zoom)?;
            Position::Click {
                x_px: click.x,
                y_px: click.y,
                preview_width_px: rendered.frame.width,
                preview_height_px: rendered.frame.height,
            }
        }
        (None, Some(percent)) => Position::Percent {
            x: percent.x,
            y: percent.y,
        },
        (None, None) => return Err(AppError::invalid_argument("--click or --percent is required")),
    };
    session.set_position(position)?;

    let output = resolve_output(&session, output)?;
    match session.export()? {
        ExportOutcome::Exported(signed) => {
            write_output(&output, &signed.bytes)?;
            println!(
                "signed page {page} at ({:.1}, {:.1}) {:.1}x{:.1} pt -> {}",
                signed.rect.x0,
                signed.rect.y0,
                signed.rect.width(),
                signed.rect.height(),
                output.display()
            );
            Ok(())
        }
        ExportOutcome::Blocked(blocker) => Err(AppError::invalid_argument(blocker.message())),
    }
}

async fn place(
    config: Config,
    pdf: &Path,
    page: usize,
    source: &SignatureSource,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let mut session = open_session(&config, pdf, page)?;
    session.set_signature(load_signature(&config, source)?);
    let output = resolve_output(&session, output)?;

    let mut app = App::new(session, output, config)?;
    app.run().await
}

fn signatures(config: &Config, command: SignaturesCommand) -> AppResult<()> {
    let store = SignatureStore::open(config.signatures.resolved_directory()?)?;
    match command {
        SignaturesCommand::List => {
            let saved = store.list()?;
            if saved.is_empty() {
                println!("no saved signatures in {}", store.dir().display());
            }
            for entry in saved {
                println!("{}\t{}", entry.stem, entry.path.display());
            }
        }
        SignaturesCommand::Save { image, name } => {
            let signature = SignatureImage::load(&image)?;
            let saved = store.save(&name, &signature)?;
            println!("saved {}", saved.path.display());
        }
        SignaturesCommand::Draw {
            strokes,
            name,
            color,
            stroke_width,
        } => {
            let canvas = StrokeCanvas::load(&strokes)?
                .or_size(config.signature.canvas_width, config.signature.canvas_height);
            let color = match color {
                Some(raw) => Rgb::parse_hex(&raw).ok_or_else(|| {
                    AppError::invalid_argument(format!("`{raw}` is not a #RRGGBB color"))
                })?,
                None => config.signature.stroke_rgb(),
            };
            let stroke_width = stroke_width.unwrap_or(config.signature.stroke_width);
            let Some(signature) = rasterize_strokes(&canvas, color, stroke_width)? else {
                return Err(AppError::invalid_argument("strokes contain no visible ink"));
            };
            let saved = store.save(&name, &signature)?;
            println!("saved {}", saved.path.display());
        }
        SignaturesCommand::Delete { stem } => {
            store.delete(&stem)?;
            println!("deleted {stem}");
        }
    }
    Ok(())
}

fn open_session(config: &Config, pdf: &Path, page: usize) -> AppResult<SigningSession> {
    let mut session = SigningSession::new(config.signature.clone());
    session.open_pdf(pdf)?;
    session.set_page(page_index(page)?)?;
    Ok(session)
}

/// CLI pages are 1-based.
fn page_index(page: usize) -> AppResult<usize> {
    page.checked_sub(1)
        .ok_or_else(|| AppError::invalid_argument("page numbers start at 1"))
}

fn load_signature(config: &Config, source: &SignatureSource) -> AppResult<SignatureImage> {
    match (&source.signature, &source.saved) {
        (Some(path), _) => SignatureImage::load(path),
        (None, Some(stem)) => {
            SignatureStore::open(config.signatures.resolved_directory()?)?.load(stem)
        }
        (None, None) => Err(AppError::invalid_argument(
            "--signature or --saved is required",
        )),
    }
}

fn resolve_output(session: &SigningSession, output: Option<PathBuf>) -> AppResult<PathBuf> {
    output
        .or_else(|| session.default_output_path())
        .ok_or_else(|| AppError::invalid_argument("cannot derive an output path"))
}

fn write_output(path: &Path, bytes: &[u8]) -> AppResult<()> {
    std::fs::write(path, bytes).map_err(|source| {
        AppError::io_with_context(source, format!("failed to write signed pdf: {}", path.display()))
    })
}
