//! Demo application
//!
//! Loads the project manifest from the working directory (or the directory
//! given as the first argument), registers the demo modules and runs the
//! default scene until something asks the engine to quit.

mod console;
mod krys;
mod test_game;

use std::path::PathBuf;
use std::process::ExitCode;

use real_engine::core::ProjectManifest;
use real_engine::foundation::logging;
use real_engine::registry::Extension;
use real_engine::{Engine, EngineError};

fn project_dir() -> Result<PathBuf, EngineError> {
    match std::env::args_os().nth(1) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir().map_err(|e| EngineError::Config(e.into())),
    }
}

fn run() -> Result<(), EngineError> {
    let dir = project_dir()?;
    let manifest = ProjectManifest::discover(&dir)?.ok_or_else(|| EngineError::ManifestNotFound(dir.clone()))?;

    logging::init(&manifest.logging_settings(&dir)).map_err(|e| EngineError::Logging(e.to_string()))?;
    log::info!("Starting '{}' from {}", manifest.name, dir.display());

    let modules: [&dyn Extension; 3] = [&console::ConsoleModule, &test_game::TestGame, &krys::Krys];
    let mut engine = Engine::bootstrap(manifest, dir, &modules)?;

    engine.run();
    log::info!("Engine shutdown complete");
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("demo_app: {err}");
            ExitCode::FAILURE
        }
    }
}
