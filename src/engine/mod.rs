//! Engine module: CLI plumbing, transfer, naming helpers, progress

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod tools;
pub mod transfer;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use tools::{determine_worker_count, output_path_for, sanitize_file_stem};
pub use transfer::{Fetcher, HttpConfig, HttpFetcher, build_client, download};
