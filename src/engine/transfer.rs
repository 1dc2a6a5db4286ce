//! Blocking file transfer: open the remote body, stream it into a partial file, rename on success.

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::TransferError;
use crate::utils::config::{Defaults, PackagePaths};
use crate::utils::{create_partial, persist_partial};

/// Source of remote bytes. The worker pool only ever sees this trait.
pub trait Fetcher: Send + Sync {
    /// Open `url` and return its body as a reader. Errors here are connect-stage failures.
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransferError>;
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(Defaults::CONNECT_TIMEOUT_SECS),
            user_agent: PackagePaths::get().user_agent().to_string(),
        }
    }
}

/// Build the blocking client shared by the feed fetch and every worker.
/// No overall request timeout: a large episode may legitimately stream for a long time.
pub fn build_client(config: &HttpConfig) -> anyhow::Result<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(None)
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(Defaults::MAX_REDIRECTS))
        .build()?;
    Ok(client)
}

/// [`Fetcher`] over a `reqwest` blocking client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransferError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransferError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(Box::new(response))
    }
}

/// Fetch `url` into `output`. Bytes go to a fresh hidden partial file first; only a complete,
/// synced copy is moved onto `output`, and a failed copy leaves nothing behind.
/// If `output` appeared meanwhile (another task with the same name won), the copy is discarded
/// and [`TransferError::Exists`] is returned. Returns the byte count.
pub fn download(fetcher: &dyn Fetcher, url: &str, output: &Path) -> Result<u64, TransferError> {
    let mut body = fetcher.open(url)?;

    let mut partial = create_partial(output).map_err(|source| TransferError::Create {
        path: output.to_path_buf(),
        source,
    })?;

    let bytes = stream_to(&mut body, partial.as_file_mut()).map_err(|source| {
        TransferError::Stream {
            path: partial.path().to_path_buf(),
            source,
        }
    })?;

    match persist_partial(partial, output) {
        Ok(()) => Ok(bytes),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(TransferError::Exists {
            path: output.to_path_buf(),
        }),
        Err(e) => Err(TransferError::Finalize {
            path: output.to_path_buf(),
            message: e.error.to_string(),
        }),
    }
}

fn stream_to(body: &mut dyn Read, file: &mut File) -> io::Result<u64> {
    let n = io::copy(body, file)?;
    file.flush()?;
    file.sync_all()?;
    Ok(n)
}
