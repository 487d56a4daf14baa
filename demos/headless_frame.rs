//! Headless Frame Example
//!
//! Renders a few frames of the default scene in every render mode and
//! prints the passes each pipeline issued.
//!
//! Usage:
//!   cargo run --example headless_frame [settings.json]
//!
//! Shaders are read from `shaders/` and images from `assets/`; missing
//! images fall back to the built-in textures. With the `wgpu-backend`
//! feature the frames are rendered offscreen on the GPU instead.

use tidal::assets::{FileImageLoader, FsShaderLoader};
use tidal::{App, GpuDevice, InputState, LoggingConfig, RenderMode, RendererSettings, init_logging};

const FRAMES_PER_MODE: usize = 3;

fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::default());

    let settings = match std::env::args().nth(1) {
        Some(path) => RendererSettings::from_json_file(path)?,
        None => RendererSettings::default(),
    };

    #[cfg(feature = "wgpu-backend")]
    let device = tidal::WgpuDevice::new(settings.width(), settings.height())?;
    #[cfg(not(feature = "wgpu-backend"))]
    let device = tidal::HeadlessDevice::default();

    let mut app = App::new(
        device,
        &mut FsShaderLoader::new("."),
        &mut FileImageLoader::new("assets"),
        settings,
    )?;
    app.populate_default_scene()?;

    let info = app.device.info();
    println!("=== Headless Frame ===");
    println!("Device: {} ({})", info.name, info.backend);

    for mode in RenderMode::ALL {
        app.scene.mode = mode;
        begin_mode(&mut app);
        let inputs = std::iter::repeat_with(|| {
            let mut input = InputState::new();
            input.delta_time = 1.0 / 60.0;
            input
        })
        .take(FRAMES_PER_MODE);
        let frames = app.run(inputs)?;
        println!("\n{} ({frames} frames)", mode.label());
        report_last_frame(&app);
    }

    println!("\nRendered {} frames", app.frame_index());
    Ok(())
}

#[cfg(not(feature = "wgpu-backend"))]
fn begin_mode(app: &mut App<tidal::HeadlessDevice>) {
    app.device.clear_commands();
}

#[cfg(not(feature = "wgpu-backend"))]
fn report_last_frame(app: &App<tidal::HeadlessDevice>) {
    let labels = app.device.pass_labels();
    let per_frame = labels.len() / FRAMES_PER_MODE.max(1);
    let last = app.device.passes().skip(labels.len() - per_frame);
    for pass in last {
        println!("  {:<20} {} draws", pass.label, pass.draws.len());
    }
    for error in app.device.validation_errors() {
        println!("  ! {error}");
    }
}

#[cfg(feature = "wgpu-backend")]
fn begin_mode(_app: &mut App<tidal::WgpuDevice>) {}

#[cfg(feature = "wgpu-backend")]
fn report_last_frame(app: &App<tidal::WgpuDevice>) {
    let size = app.device.screen_texture().size();
    println!("  offscreen target {}x{}", size.width, size.height);
}
