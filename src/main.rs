mod app;
mod config;
mod core;
mod detect;
mod input;
mod playback;
mod render;
mod ui;

use anyhow::{Context as _, Result};
use app::AppState;
use clap::{Parser, Subcommand};
use config::{AppConfig, UiSettings};
use detect::DetectorParams;
use imgui::{Context, FontConfig, FontSource};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use input::{DatasetFileSource, MemorySource, RecordSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ui::{ControlAction, ControlPanel, FileDialogs, NoticeModal, RoadView};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use glow::HasContext;
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;

/// Plays back traffic records of one road segment as an animated road scene
#[derive(Parser, Debug)]
#[command(name = "jamview", version, about)]
struct Cli {
    /// Dataset file (CSV or JSON) to read segments from
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Segment to start playing right away
    #[arg(short, long)]
    segment: Option<String>,

    /// Use built-in synthetic segments 1-3 instead of a dataset
    #[arg(long, conflicts_with = "dataset")]
    demo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit the DBSCAN jam detector on a dataset and score a held-out split
    Evaluate {
        /// Dataset file (CSV or JSON)
        dataset: PathBuf,

        /// Neighbourhood radius in standardized feature space
        #[arg(long, default_value = "0.55")]
        eps: f64,

        /// Neighbours (self included) that make a core sample
        #[arg(long, default_value = "4")]
        min_samples: usize,

        /// Share of each class held out for testing
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed of the train/test shuffle
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Write the fitted detector as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

/// Headless detector evaluation; prints the report to stdout
fn run_evaluate(
    runtime: &tokio::runtime::Runtime,
    dataset: &Path,
    params: DetectorParams,
    save: Option<&Path>,
) -> Result<()> {
    let records = runtime
        .block_on(DatasetFileSource::new(dataset).fetch_all())
        .with_context(|| format!("failed to load {}", dataset.display()))?;
    info!(path = %dataset.display(), records = records.len(), "loaded dataset for evaluation");

    let (detector, report) = detect::evaluate(&records, &params).context("evaluation failed")?;
    println!("{}", report);

    if let Some(path) = save {
        detector
            .save(path)
            .with_context(|| format!("failed to save detector to {}", path.display()))?;
        println!("\nDetector saved as: {}", path.display());
    }
    Ok(())
}

fn pick_source(cli: &Cli, config: &AppConfig, settings: &UiSettings) -> Arc<dyn RecordSource> {
    if cli.demo {
        return Arc::new(MemorySource::demo());
    }

    let dataset = cli
        .dataset
        .clone()
        .or_else(|| config.dataset_path.clone())
        .or_else(|| settings.last_dataset.clone().filter(|p| p.exists()));

    match dataset {
        Some(path) => {
            info!(path = %path.display(), "using dataset");
            Arc::new(DatasetFileSource::new(path))
        }
        None => {
            info!("no dataset configured; using demo segments");
            Arc::new(MemorySource::demo())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load();
    let playback_config = config.playback().context("invalid configuration")?;
    let mut settings = UiSettings::load();

    let runtime = tokio::runtime::Runtime::new().context("failed to create Tokio runtime")?;

    if let Some(Commands::Evaluate {
        dataset,
        eps,
        min_samples,
        test_size,
        seed,
        save,
    }) = &cli.command
    {
        let params = DetectorParams {
            eps: *eps,
            min_samples: *min_samples,
            test_size: *test_size,
            seed: *seed,
        };
        return run_evaluate(&runtime, dataset, params, save.as_deref());
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;

    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("jamview - Phantom Jam Segment Viewer")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    playback_config.viewport_width as f64 * 0.9,
                    playback_config.viewport_height as f64 + 120.0,
                )),
        ))
        .build(&event_loop, glutin::config::ConfigTemplateBuilder::new(), |mut configs| {
            // glutin only calls this with at least one config
            configs.next().expect("no GL config offered")
        })
        .map_err(|e| anyhow::anyhow!("failed to create window and display: {}", e))?;

    let window = window.context("failed to create window")?;
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new().build(Some(window.raw_window_handle())),
        )
    }
    .context("failed to create GL context")?;

    let attrs =
        window.build_surface_attributes(glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new());
    let surface =
        unsafe { gl_display.create_window_surface(&gl_config, &attrs) }.context("failed to create surface")?;
    let context = context.make_current(&surface).context("failed to make context current")?;

    let load_gl = || unsafe {
        glow::Context::from_loader_function(|name| {
            std::ffi::CString::new(name)
                .map(|name| gl_display.get_proc_address(&name))
                .unwrap_or(std::ptr::null()) as *const _
        })
    };
    let gl = load_gl();
    let gl_clear = load_gl();

    let mut imgui = Context::create();
    imgui.set_log_filename(None::<PathBuf>);
    if let Some(dir) = AppConfig::config_dir() {
        let _ = std::fs::create_dir_all(&dir);
        imgui.set_ini_filename(Some(dir.join("layout.ini")));
    }

    let hidpi_factor = window.scale_factor();
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: (14.0 * hidpi_factor) as f32,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer =
        imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui).context("failed to initialize renderer")?;

    let source = pick_source(&cli, &config, &settings);
    let mut state = AppState::new(playback_config, source, runtime.handle().clone());
    let road_view = RoadView::new(playback_config);
    let initial_segment = cli.segment.clone().unwrap_or_else(|| settings.last_segment.clone());
    let mut controls = ControlPanel::new(initial_segment);
    let mut notice_modal = NoticeModal::new();
    let mut dataset_dialog_pending = false;

    if let Some(segment) = cli.segment.as_deref() {
        if let Err(e) = state.trigger(segment) {
            warn!("--segment {}: {}", segment, e);
            controls.set_input_error(Some(e.to_string()));
        }
    }

    let mut last_frame_time = Instant::now();
    let mut last_redraw = Instant::now();

    event_loop
        .run(move |event, window_target| {
            match event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    imgui.io_mut().update_delta_time(now - last_frame_time);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    if dataset_dialog_pending {
                        dataset_dialog_pending = false;
                        if let Some(path) = FileDialogs::open_dataset() {
                            state.set_source(Arc::new(DatasetFileSource::new(&path)));
                            settings.last_dataset = Some(path);
                        }
                    }

                    state.update(Instant::now());

                    if let Err(e) = platform.prepare_frame(imgui.io_mut(), &window) {
                        error!("failed to prepare frame: {}", e);
                        window_target.exit();
                        return;
                    }
                    window.request_redraw();
                }
                Event::WindowEvent {
                    event: WindowEvent::RedrawRequested,
                    ..
                } => {
                    let now = Instant::now();
                    let delta_ms = (now - last_redraw).as_secs_f32() * 1000.0;
                    last_redraw = now;
                    state.frame(delta_ms);

                    let ui = imgui.new_frame();
                    let mut action = None;

                    ui.main_menu_bar(|| {
                        ui.menu("File", || {
                            if ui.menu_item("Open Dataset...") {
                                action = Some(ControlAction::BrowseDataset);
                            }
                            if ui.menu_item("Use Demo Data") {
                                action = Some(ControlAction::UseDemo);
                            }
                            ui.separator();
                            if ui.menu_item("Exit") {
                                window_target.exit();
                            }
                        });
                        ui.menu("View", || {
                            ui.checkbox("Controls", &mut settings.show_controls);
                        });
                    });

                    road_view.render(ui, &state.scene);
                    if let Some(a) = controls.render(ui, &state, &mut settings.show_controls) {
                        action = Some(a);
                    }
                    if notice_modal.render(ui, state.notice()) {
                        state.dismiss_notice();
                    }

                    match action {
                        Some(ControlAction::Start(input)) => match state.trigger(&input) {
                            Ok(_) => {
                                controls.set_input_error(None);
                                settings.last_segment = input.trim().to_string();
                            }
                            Err(e) => {
                                warn!("rejected segment input: {}", e);
                                controls.set_input_error(Some(e.to_string()));
                            }
                        },
                        Some(ControlAction::BrowseDataset) => dataset_dialog_pending = true,
                        Some(ControlAction::UseDemo) => state.set_source(Arc::new(MemorySource::demo())),
                        None => {}
                    }

                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    if let Err(e) = renderer.render(draw_data) {
                        error!("rendering failed: {}", e);
                        window_target.exit();
                        return;
                    }
                    if let Err(e) = surface.swap_buffers(&context) {
                        error!("failed to swap buffers: {}", e);
                        window_target.exit();
                        return;
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::Resized(size),
                    ..
                } => {
                    if let (Some(w), Some(h)) = (
                        std::num::NonZeroU32::new(size.width),
                        std::num::NonZeroU32::new(size.height),
                    ) {
                        surface.resize(&context, w, h);
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    settings.save();
                    window_target.exit();
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .context("event loop error")?;

    Ok(())
}
