use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use nannou::prelude::*;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use reactive_visualizer::audio::AnalysisGraph;
use reactive_visualizer::cli::{Args, SourceRequest};
use reactive_visualizer::host::{CanvasHost, FixedFrames, run_loop};
use reactive_visualizer::settings::{SettingsPatch, SettingsStore, Theme};
use reactive_visualizer::visual::{DrawCanvas, RecordingCanvas, Size};

const SENSITIVITY_STEP: f32 = 0.1;
const INTENSITY_STEP: f32 = 0.1;

struct Model {
    graph: AnalysisGraph,
    host: CanvasHost,
    store: SettingsStore,
    repeat: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    // Fail early on bad analyser settings, before a window exists.
    args.analyzer_config().context("invalid --fft-size")?;

    if let Some(frames) = args.headless {
        return run_headless(&args, frames);
    }
    nannou::app(model).update(update).run();
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn new_host(args: &Args) -> CanvasHost {
    args.seed.map_or_else(CanvasHost::new, CanvasHost::with_seed)
}

fn connect_source(graph: &mut AnalysisGraph, request: SourceRequest) {
    let result = match request {
        SourceRequest::None => return,
        SourceRequest::File { path, repeat } => graph.load_file(&path, repeat),
        SourceRequest::Microphone => graph.start_microphone(),
    };
    if let Err(e) = result {
        warn!(error = %e, "starting without audio");
    }
}

fn model(app: &App) -> Model {
    match setup(app) {
        Ok(model) => model,
        Err(e) => {
            error!(error = ?e, "startup failed");
            std::process::exit(1);
        }
    }
}

fn setup(app: &App) -> anyhow::Result<Model> {
    let args = Args::parse();
    app.new_window()
        .size(args.width, args.height)
        .title("reactive visualizer")
        .view(view)
        .key_pressed(key_pressed)
        .dropped_file(dropped_file)
        .build()
        .map_err(|e| anyhow!("failed to open window: {e:?}"))?;

    let mut graph = AnalysisGraph::new(args.analyzer_config()?)?;
    connect_source(&mut graph, args.source_request());

    let store = SettingsStore::new(args.settings());
    let mut host = new_host(&args);
    host.mount(store.settings().theme);

    Ok(Model {
        graph,
        host,
        store,
        repeat: args.repeat,
    })
}

fn update(app: &App, model: &mut Model, _update: Update) {
    let win = app.window_rect();
    let size = Size::new(win.w(), win.h());
    model.graph.refresh_frequency_data();
    model.graph.refresh_time_domain_data();
    model
        .host
        .frame(size, model.graph.frame(), model.store.settings());
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let mut canvas = DrawCanvas::new(&draw, app.window_rect());
    model.host.paint(&mut canvas, model.store.settings());
    if let Err(e) = draw.to_frame(app, &frame) {
        warn!(error = ?e, "failed to render frame");
    }
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    let settings = model.store.settings().clone();
    let theme_slot = match key {
        Key::Key1 => Some(0),
        Key::Key2 => Some(1),
        Key::Key3 => Some(2),
        Key::Key4 => Some(3),
        Key::Key5 => Some(4),
        Key::Key6 => Some(5),
        _ => None,
    };
    if let Some(theme) = theme_slot.and_then(Theme::from_index) {
        model.store.set_theme(theme);
        return;
    }

    match key {
        Key::R => {
            let theme = model.store.randomize_theme(&mut rand::thread_rng());
            debug!(%theme, "random theme");
        }
        Key::M => {
            if let Err(e) = model.graph.start_microphone() {
                warn!(error = %e, "microphone unavailable");
            }
        }
        Key::S => model.graph.disconnect(),
        Key::Up => {
            model.store.update(SettingsPatch {
                sensitivity: Some(settings.sensitivity + SENSITIVITY_STEP),
                ..SettingsPatch::default()
            });
        }
        Key::Down => {
            model.store.update(SettingsPatch {
                sensitivity: Some((settings.sensitivity - SENSITIVITY_STEP).max(SENSITIVITY_STEP)),
                ..SettingsPatch::default()
            });
        }
        Key::RBracket => {
            model.store.update(SettingsPatch {
                intensity: Some(settings.intensity + INTENSITY_STEP),
                ..SettingsPatch::default()
            });
        }
        Key::LBracket => {
            model.store.update(SettingsPatch {
                intensity: Some((settings.intensity - INTENSITY_STEP).max(INTENSITY_STEP)),
                ..SettingsPatch::default()
            });
        }
        _ => {}
    }
}

fn dropped_file(_app: &App, model: &mut Model, path: PathBuf) {
    if let Err(e) = model.graph.load_file(&path, model.repeat) {
        warn!(error = %e, "dropped file ignored");
    }
}

/// Runs the analysis and engines against a recording canvas for a fixed
/// number of frames, without opening a window.
fn run_headless(args: &Args, frames: u64) -> anyhow::Result<()> {
    let settings = args.settings();
    let mut graph = AnalysisGraph::new(args.analyzer_config()?)?;
    connect_source(&mut graph, args.source_request());

    let mut host = new_host(args);
    host.mount(settings.theme);
    let size = Size::new(args.width as f32, args.height as f32);
    let token = host
        .token()
        .context("host has no scheduler registration")?;

    let mut canvas = RecordingCanvas::new();
    let stepped = run_loop(&mut FixedFrames::new(frames), &token, |tick| {
        graph.refresh_frequency_data();
        graph.refresh_time_domain_data();
        host.frame(size, graph.frame(), &settings);
        canvas.reset();
        host.paint(&mut canvas, &settings);
        if tick.index % 60 == 0 {
            debug!(frame = tick.index, calls = canvas.calls().len(), "headless frame");
        }
    });

    let stats = host.engine_stats();
    info!(
        frames = stepped,
        theme = %settings.theme,
        population = stats.population,
        bursts = stats.bursts,
        draw_calls = canvas.calls().len(),
        "headless run finished"
    );
    Ok(())
}
