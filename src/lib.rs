// Library surface for headless/integration tests and reuse.
// Keep terminal setup and rendering in main.rs / ui.rs.
pub mod app;
pub mod app_dirs;
pub mod best_score;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod passage;
pub mod runtime;
pub mod session;
pub mod util;

pub use error::{Error, Result};
