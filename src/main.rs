use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;
use simplelog::{Config, LevelFilter, WriteLogger};

use scrollfolio::document::{DocumentRef, LayoutFileSource};
use scrollfolio::event_source::{EventSource, HostEvent, SimulatedEventSource};
use scrollfolio::layout::{ScrollRequest, Viewport, VisibleWindow};
use scrollfolio::panic_handler;
use scrollfolio::settings;
use scrollfolio::viewer::{LoadState, RenderTarget, Viewer};

/// Lay out a paginated document and report which pages a viewer would render
#[derive(Parser, Debug)]
#[command(name = "scrollfolio", version, about)]
struct Args {
    /// Page-size manifest (YAML, or JSON by extension)
    manifest: PathBuf,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "960x800", value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Zoom factor, 1.0 = 100%
    #[arg(long)]
    zoom: Option<f64>,

    /// Scroll offset in pixels
    #[arg(long)]
    scroll: Option<f64>,

    /// Jump to a 1-based page number
    #[arg(long)]
    page: Option<usize>,

    /// YAML list of host events to replay after loading
    #[arg(long)]
    script: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "scrollfolio.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// How long to wait for page metadata
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn parse_viewport(value: &str) -> Result<(f64, f64), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: f64 = width.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f64 = height.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok((width, height))
}

#[derive(Serialize)]
struct Report<'a> {
    document: &'a str,
    load_state: &'a LoadState,
    page_count: usize,
    failed_pages: Vec<usize>,
    zoom_percent: u32,
    viewport: Viewport,
    content_height: f64,
    current_page: usize,
    scroll_requests: &'a [ScrollRequest],
    window: &'a VisibleWindow,
    render_targets: Vec<RenderTarget>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {:?}", args.log_file))?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting scrollfolio");

    match &args.config {
        Some(path) => settings::load_settings_into_global(path),
        None => settings::load_settings(),
    }

    let result = run(&args);
    if let Err(e) = &result {
        error!("Application error: {e:?}");
    }

    info!("Shutting down scrollfolio");
    result
}

fn run(args: &Args) -> Result<()> {
    let source = LayoutFileSource::new();
    let mut viewer = Viewer::new(Arc::new(source), settings::layout_config());
    let timeout = Duration::from_millis(args.timeout_ms);

    let (width, height) = args.viewport;
    viewer.set_viewport_size(width, height);
    if let Some(zoom) = args.zoom {
        viewer.set_zoom(zoom);
    }

    let document = DocumentRef::from(args.manifest.as_path());
    viewer.attach(document.clone());
    if !viewer.wait_for_load(timeout) {
        warn!("Metadata for {document} still loading after {timeout:?}");
    }

    if let LoadState::Failed(message) = viewer.load_state() {
        bail!("Unable to load {document}: {message}");
    }

    if let Some(offset) = args.scroll {
        viewer.on_scroll(offset);
    }

    let mut scroll_requests = vec![];
    if let Some(page) = args.page {
        let request = viewer
            .scroll_to_page(page)
            .map_err(|e| anyhow!("cannot go to page {page}: {e}"))?;
        viewer.on_scroll(request.offset);
        scroll_requests.push(request);
    }

    if let Some(script) = &args.script {
        scroll_requests.extend(replay_script(&mut viewer, script, timeout)?);
    }

    let report = Report {
        document: document.as_str(),
        load_state: viewer.load_state(),
        page_count: viewer.page_count(),
        failed_pages: viewer.metadata().failed_pages(),
        zoom_percent: viewer.zoom_percent(),
        viewport: viewer.viewport(),
        content_height: viewer.content_height(),
        current_page: viewer.current_page(),
        scroll_requests: &scroll_requests,
        window: viewer.visible_window(),
        render_targets: viewer.render_targets(),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

/// Feed scripted events to the viewer, acting as the scroll container
fn replay_script(
    viewer: &mut Viewer,
    path: &Path,
    timeout: Duration,
) -> Result<Vec<ScrollRequest>> {
    let script = fs::read_to_string(path).with_context(|| format!("reading script {path:?}"))?;
    let mut events = SimulatedEventSource::from_yaml(&script)
        .with_context(|| format!("parsing script {path:?}"))?;
    info!("Replaying {} scripted events", events.remaining());

    let mut requests = vec![];
    while events.poll(Duration::ZERO)? {
        let event = events.read()?;
        let waits_for_load = matches!(event, HostEvent::Attach(_));

        match viewer.dispatch(event) {
            Ok(Some(request)) => {
                viewer.on_scroll(request.offset);
                requests.push(request);
            }
            Ok(None) => {}
            Err(e) => warn!("Scripted navigation failed: {e}"),
        }

        if waits_for_load {
            viewer.wait_for_load(timeout);
        }
        viewer.poll();
    }
    Ok(requests)
}
