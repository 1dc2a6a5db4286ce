pub mod config;
pub mod fd_limit;
pub mod feed_env;
pub(crate) mod feedgrab_toml;
pub mod logger;
pub mod tempfiles;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, max_workers_by_fd_limit};
pub use feed_env::feed_from_env;
pub use logger::setup_logging;
pub use tempfiles::{create_partial, persist_partial, sweep_stale_partials};
