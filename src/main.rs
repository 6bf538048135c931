use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use announce_raster::preview::preview_html;
use announce_raster::{
    AnnouncementContent, AnnouncementLayout, AnnouncementRenderer, AsyncRenderer, OutputFormat,
    RasterEngine, RenderJob, RenderOptions, RenderOutput, StyleConfig,
};

#[derive(Parser)]
#[command(name = "announce-raster", about = "Render announcements to PNG/JPEG images")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Jpeg,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => OutputFormat::Png,
            Format::Jpeg => OutputFormat::Jpeg,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Render one announcement
    Render {
        /// Announcement content (JSON)
        #[arg(long)]
        content: PathBuf,
        /// Field layout (JSON); defaults depend on the title
        #[arg(long)]
        layout: Option<PathBuf>,
        /// Style configuration (JSON object or flat key-value map)
        #[arg(long)]
        style: Option<PathBuf>,
        /// Background template image
        #[arg(long)]
        background: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "png")]
        format: Format,
        /// Output image path
        #[arg(long)]
        out: PathBuf,
        /// Try the headless Chrome screenshot first (needs the `cdp` feature)
        #[arg(long)]
        html_fallback: bool,
    },
    /// Render a JSON array of jobs concurrently into a directory
    Batch {
        /// JSON array of {content, layout, style, background}
        #[arg(long)]
        jobs: PathBuf,
        #[arg(long, value_enum, default_value = "png")]
        format: Format,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Write the HTML preview of an announcement
    Preview {
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        layout: Option<PathBuf>,
        #[arg(long)]
        style: Option<PathBuf>,
        #[arg(long)]
        background: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_style(path: Option<&Path>) -> Result<StyleConfig> {
    let Some(path) = path else {
        return Ok(StyleConfig::default());
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    StyleConfig::from_json(&text).with_context(|| format!("loading style {}", path.display()))
}

fn load_inputs(
    content: &Path,
    layout: Option<&Path>,
    style: Option<&Path>,
) -> Result<(AnnouncementContent, AnnouncementLayout, StyleConfig)> {
    let content: AnnouncementContent = read_json(content)?;
    let layout = match layout {
        Some(path) => read_json(path)?,
        None => AnnouncementLayout::defaults_for(&content),
    };
    Ok((content, layout, load_style(style)?))
}

fn write_output(out: &Path, output: &RenderOutput) -> Result<()> {
    std::fs::write(out, &output.bytes).with_context(|| format!("writing {}", out.display()))?;
    if output.truncated {
        warn!("{}: body text did not fit and was truncated", out.display());
    }
    info!(
        "Wrote {} ({}x{}, {} bytes)",
        out.display(),
        output.width,
        output.height,
        output.bytes.len()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_render(
    content: &Path,
    layout: Option<&Path>,
    style: Option<&Path>,
    background: Option<&Path>,
    format: Format,
    out: &Path,
    html_fallback: bool,
) -> Result<()> {
    let (content, layout, style) = load_inputs(content, layout, style)?;
    let options = RenderOptions {
        format: format.into(),
    };
    let engine = RasterEngine::new(options.clone());

    let output = if html_fallback {
        render_via_screenshot(&engine, options, &content, &layout, &style, background)?
    } else {
        engine.render(&content, &layout, &style, background)?
    };
    write_output(out, &output)
}

#[cfg(feature = "cdp")]
fn render_via_screenshot(
    engine: &RasterEngine,
    options: RenderOptions,
    content: &AnnouncementContent,
    layout: &AnnouncementLayout,
    style: &StyleConfig,
    background: Option<&Path>,
) -> Result<RenderOutput> {
    match announce_raster::cdp::CdpRenderer::new(options) {
        Ok(cdp) => Ok(announce_raster::render_with_fallback(
            &cdp, engine, content, layout, style, background,
        )?),
        Err(e) => {
            warn!("Screenshot renderer unavailable ({}), using raster engine", e);
            Ok(engine.render(content, layout, style, background)?)
        }
    }
}

#[cfg(not(feature = "cdp"))]
fn render_via_screenshot(
    _engine: &RasterEngine,
    _options: RenderOptions,
    _content: &AnnouncementContent,
    _layout: &AnnouncementLayout,
    _style: &StyleConfig,
    _background: Option<&Path>,
) -> Result<RenderOutput> {
    bail!("built without the `cdp` feature")
}

async fn cmd_batch(jobs: &Path, format: Format, out_dir: &Path) -> Result<()> {
    let jobs: Vec<RenderJob> = read_json(jobs)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let format: OutputFormat = format.into();
    let renderer = AsyncRenderer::new(RasterEngine::new(RenderOptions { format }));
    let results = renderer.render_batch(jobs).await;

    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(output) => {
                let out = out_dir.join(format!("announcement-{:03}.{}", i, format.extension()));
                write_output(&out, &output)?;
            }
            Err(e) => {
                warn!("Job {} failed: {}", i, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} job(s) failed", failed);
    }
    Ok(())
}

fn cmd_preview(
    content: &Path,
    layout: Option<&Path>,
    style: Option<&Path>,
    background: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let (content, layout, style) = load_inputs(content, layout, style)?;
    let html = preview_html(&content, &layout, &style, background);
    std::fs::write(out, html).with_context(|| format!("writing {}", out.display()))?;
    info!("Wrote preview {}", out.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Cmd::Render {
            content,
            layout,
            style,
            background,
            format,
            out,
            html_fallback,
        } => cmd_render(
            &content,
            layout.as_deref(),
            style.as_deref(),
            background.as_deref(),
            format,
            &out,
            html_fallback,
        ),
        Cmd::Batch {
            jobs,
            format,
            out_dir,
        } => cmd_batch(&jobs, format, &out_dir).await,
        Cmd::Preview {
            content,
            layout,
            style,
            background,
            out,
        } => cmd_preview(
            &content,
            layout.as_deref(),
            style.as_deref(),
            background.as_deref(),
            &out,
        ),
    }
}
