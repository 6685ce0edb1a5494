//! CLI command implementations.

mod config;
mod ingest;
mod map;
mod search;
mod serve;

pub use config::run_config;
pub use ingest::run_ingest;
pub use map::run_map;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};
