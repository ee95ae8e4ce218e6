//! Scene viewer entry point
//!
//! Usage: `viewer [model.obj]`. Settings are read from `engine.json` in the
//! working directory when present; a model path on the command line
//! replaces the configured one. A bare name such as `bunny` is looked up
//! as `assets/models/bunny.obj`.

use engine::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use winit::event_loop::EventLoop;

const CONFIG_PATH: &str = "engine.json";

fn main() {
    let mut config = match EngineConfig::load_or_default(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            engine::init_logging();
            error!("{e}");
            std::process::exit(1);
        }
    };

    if let Some(model) = std::env::args_os().nth(1) {
        config.model = Some(PathBuf::from(model));
    }

    // Builds the app first so the configured log filter is in effect
    let mut app = EngineBuilder::from_config(config).build();
    info!("Starting scene viewer");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {e}");
        std::process::exit(1);
    }

    if let Some(e) = app.take_error() {
        error!("Viewer stopped: {e}");
        std::process::exit(1);
    }

    info!("Viewer closed");
}
