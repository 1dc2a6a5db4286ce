//! Shared fetchers and fixtures for pool and feed tests.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use feedgrab::{Fetcher, PoolOpts, Task, TransferError};
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// What the scripted fetcher does on one call for a URL.
#[derive(Clone, Debug)]
pub enum Reply {
    Body(&'static [u8]),
    Refuse,
    /// Open succeeds, then reading fails after `n` bytes.
    BreakAfter(usize),
    /// Body handed out one byte per read with a short pause between reads.
    Trickle(&'static [u8]),
    Panic,
    /// Block until the gate's sender is dropped, then refuse.
    Wait(Receiver<()>),
}

/// Fetcher driven by a per-URL script. Calls past the end of a script repeat its last reply;
/// URLs with no script get a small body.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, url: &str, replies: Vec<Reply>) -> Self {
        self.script.lock().unwrap().insert(url.to_string(), replies);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|u| *u == url).count()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut script = self.script.lock().unwrap();
        match script.get_mut(url) {
            Some(replies) if replies.len() > 1 => replies.remove(0),
            Some(replies) if !replies.is_empty() => replies[0].clone(),
            _ => Reply::Body(b"episode bytes"),
        }
    }
}

impl Fetcher for ScriptedFetcher {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransferError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.next_reply(url) {
            Reply::Body(bytes) => Ok(Box::new(Cursor::new(bytes))),
            Reply::Refuse => Err(refused(url)),
            Reply::BreakAfter(n) => Ok(Box::new(BrokenBody { left: n })),
            Reply::Trickle(bytes) => Ok(Box::new(Trickle { rest: bytes })),
            Reply::Panic => panic!("fetcher blew up on {url}"),
            Reply::Wait(gate) => {
                let _ = gate.recv();
                Err(refused(url))
            }
        }
    }
}

fn refused(url: &str) -> TransferError {
    TransferError::Connect {
        url: url.to_string(),
        message: "connection refused".into(),
    }
}

/// Yields `left` zero bytes, then a reset error.
struct BrokenBody {
    left: usize,
}

impl Read for BrokenBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.left == 0 {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        }
        let n = self.left.min(buf.len());
        buf[..n].fill(0);
        self.left -= n;
        Ok(n)
    }
}

struct Trickle {
    rest: &'static [u8],
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some((first, rest)) = self.rest.split_first() else {
            return Ok(0);
        };
        if buf.is_empty() {
            return Ok(0);
        }
        std::thread::sleep(Duration::from_millis(1));
        buf[0] = *first;
        self.rest = rest;
        Ok(1)
    }
}

/// Pool options writing into `dir` with a near-zero backoff.
pub fn pool_opts(dir: &Path) -> PoolOpts {
    PoolOpts {
        output_dir: dir.to_path_buf(),
        retry_backoff: Duration::from_millis(5),
        ..PoolOpts::default()
    }
}

pub fn tasks(names: &[&str]) -> Vec<Task> {
    names.iter().map(|n| Task::new(*n, url_for(n))).collect()
}

pub fn url_for(name: &str) -> String {
    format!("http://casts.test/{name}.mp3")
}

/// Every file name in `dir`, sorted.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// RSS document with items A, B (in window, with audio), C (out of window), D (no audio).
pub const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Test casts</title>
  <link>http://casts.test/</link>
  <description>fixture</description>
  <item>
    <title>A</title>
    <pubDate>Tue, 03 Mar 2015 10:00:00 +0000</pubDate>
    <description><![CDATA[<p>show notes</p><audio src="http://casts.test/a.mp3" preload="none"></audio>]]></description>
  </item>
  <item>
    <title>B</title>
    <pubDate>Sun, 01 Mar 2015 10:00:00 +0000</pubDate>
    <content:encoded><![CDATA[<audio src="http://casts.test/b.mp3" preload="none"></audio>]]></content:encoded>
  </item>
  <item>
    <title>C</title>
    <pubDate>Sun, 22 Feb 2015 10:00:00 +0000</pubDate>
    <description><![CDATA[<audio src="http://casts.test/c.mp3" preload="none"></audio>]]></description>
  </item>
  <item>
    <title>D</title>
    <pubDate>Mon, 02 Mar 2015 10:00:00 +0000</pubDate>
    <description><![CDATA[<p>no recording this week</p>]]></description>
  </item>
</channel>
</rss>
"#;
