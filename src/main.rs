use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use meetme::config::{self, AppConfig};
use meetme::export::{export_file_name, render_png, ExportError};
use meetme::geometry::{logical_frame_rect, FrameFormat, NormalizedFrame, Offset};
use meetme::loader::load_image;
use meetme::logging;
use meetme::notification::{Notifier, SystemNotifier, Toast};
use meetme::placement::{PlacementBounds, PlacementState};
use meetme::storage::{StorageError, StorageService};
use meetme::template::{DirectoryTemplateSource, TemplateError, TemplateSource};
use meetme::AppResult;

#[derive(Parser)]
#[command(name = "meetme")]
#[command(about = "Compose event photo frames from a template overlay and a photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template and a photo into a full-resolution PNG
    Compose(ComposeArgs),
    /// List the supported frame formats
    Formats,
}

#[derive(clap::Args)]
struct ComposeArgs {
    /// Template overlay image (transparent where the photo shows through)
    #[arg(long, required_unless_present = "template_id", conflicts_with = "template_id")]
    template: Option<PathBuf>,

    /// Directory of `<id>.json` template records
    #[arg(long, requires = "template_id")]
    templates: Option<PathBuf>,

    /// Template record to load from `--templates`
    #[arg(long, requires = "templates")]
    template_id: Option<String>,

    /// Photo to place inside the frame
    #[arg(long)]
    photo: PathBuf,

    /// Output format of an inline template
    #[arg(long, default_value = "square", conflicts_with = "template_id")]
    format: FrameFormat,

    /// Photo frame of an inline template as normalized x,y,width,height
    #[arg(
        long,
        default_value = "0,0,1,1",
        value_parser = parse_frame,
        allow_hyphen_values = true,
        conflicts_with = "template_id"
    )]
    frame: NormalizedFrame,

    /// Photo scale; clamped to the valid zoom range. Defaults to cover scale
    #[arg(long)]
    scale: Option<f64>,

    /// Photo offset in frame pixels as x,y; clamped so the frame stays filled
    #[arg(long, value_parser = parse_offset, allow_hyphen_values = true)]
    offset: Option<Offset>,

    /// Output file. Defaults to the download directory with the standard name
    #[arg(long)]
    out: Option<PathBuf>,

    /// Event slug used in the default file name
    #[arg(long, default_value = "event")]
    event: String,

    /// Template name used in the default file name
    #[arg(long)]
    name: Option<String>,

    /// Show a desktop notification when done
    #[arg(long)]
    notify: bool,
}

/// Overlay, format and frame, from a template record or the inline flags.
#[derive(Debug)]
struct ResolvedTemplate {
    overlay: PathBuf,
    format: FrameFormat,
    frame: NormalizedFrame,
    name: String,
}

fn parse_numbers<const N: usize>(value: &str) -> Result<[f64; N], String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| format!("{part:?}: {err}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    parts.try_into().map_err(|parts: Vec<f64>| {
        format!("expected {N} comma-separated numbers, got {}", parts.len())
    })
}

fn parse_frame(value: &str) -> Result<NormalizedFrame, String> {
    let [x, y, width, height] = parse_numbers::<4>(value)?;
    NormalizedFrame::new(x, y, width, height).map_err(|err| err.to_string())
}

fn parse_offset(value: &str) -> Result<Offset, String> {
    let [x, y] = parse_numbers::<2>(value)?;
    Ok(Offset::new(x, y))
}

fn resolve_template(args: &ComposeArgs) -> AppResult<ResolvedTemplate> {
    if let (Some(dir), Some(id)) = (&args.templates, &args.template_id) {
        let source = DirectoryTemplateSource::new(dir.clone());
        let template = source.fetch_template(id)?;
        return Ok(ResolvedTemplate {
            overlay: source.overlay_path(&template),
            format: template.format,
            frame: template.photo_frame,
            name: args.name.clone().unwrap_or(template.name),
        });
    }

    let overlay = args.template.clone().ok_or(TemplateError::MissingImage {
        id: "inline".to_string(),
    })?;
    let name = args.name.clone().unwrap_or_else(|| {
        overlay
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    Ok(ResolvedTemplate {
        overlay,
        format: args.format,
        frame: args.frame,
        name,
    })
}

/// Writes through the storage service so a failed write never leaves a
/// truncated file at `path`.
fn write_output(path: &Path, bytes: &[u8]) -> AppResult<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StorageError::InvalidFileName {
            name: path.display().to_string(),
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(StorageService::with_paths(dir).save_file(file_name, bytes)?)
}

fn compose(args: ComposeArgs, app_config: &AppConfig) -> AppResult<PathBuf> {
    let template = resolve_template(&args)?;
    let overlay = load_image(&template.overlay)?;
    let photo = load_image(&args.photo)?;

    let frame_size = logical_frame_rect(template.format, &template.frame).size();
    let bounds = PlacementBounds::new(
        frame_size,
        photo.natural_size(),
        app_config.controller_settings().max_zoom_factor,
    )
    .ok_or_else(|| ExportError::ExportFailure {
        reason: "photo frame has no usable area".to_string(),
    })?;

    let initial = bounds.initial();
    let placement = bounds.clamp(PlacementState::new(
        args.scale.unwrap_or(initial.scale),
        args.offset.unwrap_or(initial.offset),
    ));
    tracing::info!(
        format = %template.format,
        scale = placement.scale,
        offset_x = placement.offset.x,
        offset_y = placement.offset.y,
        "composing"
    );

    let bytes = render_png(template.format, template.frame, &overlay, &photo, placement)?;

    let path = match &args.out {
        Some(path) => write_output(path, &bytes)?,
        None => app_config
            .storage_service()?
            .save_file(&export_file_name(&args.event, &template.name), &bytes)?,
    };

    if args.notify {
        SystemNotifier.notify(Toast::success(format!("Saved {}", path.display())));
    }
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Compose(args) => {
            let app_config = config::load_app_config();
            let path = compose(args, &app_config).context("compose failed")?;
            println!("{}", path.display());
        }
        Command::Formats => {
            for format in FrameFormat::ALL {
                let (width, height) = format.pixel_dimensions();
                println!(
                    "{:<10} {:>4}x{:<4} {}",
                    format.as_str(),
                    width,
                    height,
                    format.label()
                );
            }
        }
    }
    Ok(())
}
