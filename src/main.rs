mod backend;
mod config;
mod config_io;
mod overlays;
mod state;

use std::path::PathBuf;

use clap::Parser;
use glam::Affine2;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    backend::replay::{replay, GestureScript},
    overlays::image::{ManipulatorSettings, UvRect, ViewportTransform},
    state::{AppSession, AppState},
};

/// Pan, pinch-zoom and rotate a patient image with two XR ray pointers
#[derive(Default, Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Gesture script to replay against the image viewport
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Read config.yaml and conf.d from here instead of the XDG config home
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[arg(long)]
    pan_sensitivity: Option<f32>,

    #[arg(long)]
    zoom_sensitivity: Option<f32>,

    #[arg(long)]
    rotation_sensitivity: Option<f32>,

    #[arg(long)]
    min_zoom: Option<f32>,

    #[arg(long)]
    max_zoom: Option<f32>,

    /// Print the resulting transform as JSON
    #[arg(long)]
    json: bool,

    /// Path to write logs to
    #[arg(short, long, value_name = "FILE_PATH")]
    log_to: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    steps: usize,
    settings: ManipulatorSettings,
    transform: ViewportTransform,
    uv_rect: UvRect,
    container: Affine2,
}

fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();

    logging_init(&mut args);

    log::info!(
        "Welcome to {} version {}!",
        env!("CARGO_PKG_NAME"),
        env!("MANIP_BUILD"),
    );

    let mut app = AppState::new(AppSession::load(args.config_dir.take()));
    apply_overrides(&mut app, &args);

    let steps = match args.script.as_deref() {
        Some(path) => {
            let script = GestureScript::load(path).inspect_err(|e| log::error!("{e}"))?;
            replay(&script, &mut app.viewport).len()
        }
        None => {
            log::info!("No gesture script given, showing the initial transform");
            0
        }
    };

    let summary = Summary {
        steps,
        settings: *app.viewport.settings(),
        transform: app.viewport.current_transform(),
        uv_rect: app.viewport.uv_rect(),
        container: app.viewport.current_transform().container_rotation(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let s = summary.settings;
        let t = summary.transform;
        let rect = summary.uv_rect;
        println!(
            "sensitivity pan {} zoom {} rotation {}  zoom range [{}, {}]",
            s.pan_sensitivity(),
            s.zoom_sensitivity(),
            s.rotation_sensitivity(),
            s.min_zoom(),
            s.max_zoom()
        );
        println!(
            "zoom {:.3}  pan ({:.4}, {:.4})  rotation {:.2}°",
            t.zoom, t.pan.x, t.pan.y, t.rotation
        );
        println!(
            "uv rect ({:.4}, {:.4}) .. ({:.4}, {:.4})",
            rect.min.x,
            rect.min.y,
            rect.max().x,
            rect.max().y
        );
    }

    Ok(())
}

fn apply_overrides(app: &mut AppState, args: &Args) {
    let viewport = &mut app.viewport;
    if let Some(v) = args.pan_sensitivity {
        viewport.set_pan_sensitivity(v);
    }
    if let Some(v) = args.zoom_sensitivity {
        viewport.set_zoom_sensitivity(v);
    }
    if let Some(v) = args.rotation_sensitivity {
        viewport.set_rotation_sensitivity(v);
    }
    if let Some(v) = args.min_zoom {
        viewport.set_min_zoom(v);
    }
    if let Some(v) = args.max_zoom {
        viewport.set_max_zoom(v);
    }
}

fn logging_init(args: &mut Args) {
    let log_file_path = args
        .log_to
        .take()
        .or_else(|| std::env::var("MANIP_LOGFILE").ok());

    let file_writer = log_file_path.and_then(|path| {
        match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
        {
            Ok(file) => {
                eprintln!("Logging to {}", &path);
                Some(file)
            }
            Err(e) => {
                eprintln!("Failed to open log file (path: {e:?}): {path}");
                None
            }
        }
    });

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .with(
            /* read RUST_LOG env var */
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    if let Some(writer) = file_writer {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry.init();
    }

    log_panics::init();
}
