//! Configuration file I/O and printer settings

mod loader;
mod types;

pub use loader::{load_config, save_config};
pub use types::{DEFAULT_MAX_LINE_ARGS, FormatOptions};
