mod cli;
mod renderer;

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use chronolane_core::persist::{DocumentStore, JsonFileStore};
use chronolane_core::store::import::validate_import;
use chronolane_core::svg::render_svg;
use chronolane_core::views::{AXIS_HEIGHT, TimelineScene, render_timeline, render_year_axis};
use chronolane_core::{Timeline, ViewContext};
use chronolane_protocol::Viewport;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_env("CHRONOLANE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_logging(args.log_file.as_deref())?;
    let config = args.layout_config()?;

    let store = JsonFileStore::new(&args.file);
    let Some(doc) = store.load()? else {
        bail!("{} does not exist", args.file.display());
    };
    if let Err(report) = validate_import(&doc) {
        for problem in &report.errors {
            warn!(%problem, "record will be skipped or drawn incompletely");
        }
    }

    let mut timeline = Timeline::from_document(doc, config);
    if let Some((start, end)) = args.year_range() {
        timeline.zoom_mut().set_range(start, end);
    }
    let now = args.now.unwrap_or_else(chronolane_core::model::current_year);

    if let Some(out) = &args.svg {
        let svg = export_svg(&mut timeline, args.width, now, !args.light);
        std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
        info!(path = %out.display(), "svg written");
        return Ok(());
    }

    if let Some(out) = &args.layout_json {
        let view = timeline.zoom().view_context(args.width).with_current_year(now);
        let layout = timeline.layout(&view);
        let json = serde_json::to_string_pretty(&layout)?;
        if out.as_os_str() == "-" {
            writeln!(std::io::stdout().lock(), "{json}")?;
        } else {
            std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        }
        return Ok(());
    }

    renderer::run(&mut timeline, &store, now)
}

/// Render the whole timeline (every lane, no vertical scroll) as SVG.
fn export_svg(timeline: &mut Timeline, width: f64, now: i32, dark: bool) -> String {
    let view: ViewContext = timeline.zoom().view_context(width).with_current_year(now);
    let layout = timeline.layout(&view);
    let items = timeline.items();
    let zoom = *timeline.zoom();
    let config = *timeline.config();
    let viewport = Viewport::new(width, AXIS_HEIGHT + layout.total_height);

    let mut commands = render_year_axis(
        &viewport,
        f64::from(zoom.start_year),
        f64::from(zoom.end_year),
        layout.total_height,
    );
    let scene = TimelineScene::new(&layout, &items, &zoom, &config, now);
    commands.extend(render_timeline(&scene, &viewport));
    render_svg(&commands, viewport.width, viewport.height, dark)
}
