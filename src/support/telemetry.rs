//! Logger initialization and the log-file handle shared with cleanup.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File every run appends its logs to; the baseline cleanup deletes it again.
pub const LOG_FILE_NAME: &str = "rewind-logs.txt";

/// Handle to the log file handed to the cleanup chain.
///
/// The subscriber keeps writing through this handle for the whole process
/// lifetime, so "closing" flushes and drops the writer; later writes become
/// no-ops instead of faults.
#[derive(Clone)]
pub struct LogHandle {
    file: Arc<Mutex<Option<File>>>,
    path: PathBuf,
}

impl LogHandle {
    /// Flush buffered output and drop the writer. Safe to call when the file
    /// was already closed.
    pub fn close(&self) {
        let mut slot = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(mut file) = slot.take() {
            let _ = file.flush();
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Clone)]
struct SharedLogWriter(Arc<Mutex<Option<File>>>);

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self
            .0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_mut() {
            Some(file) => file.write(buf),
            // Log file already closed by cleanup; swallow late writes.
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self
            .0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Initialize `tracing` with a stderr layer and a log-file layer.
///
/// Every bootstrap step after this call reports through the logger; a failure
/// here is the one error the caller must print to stdout itself.
pub fn init() -> Result<LogHandle> {
    let path = PathBuf::from(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let handle = LogHandle {
        file: Arc::new(Mutex::new(Some(file))),
        path,
    };

    if tracing::dispatcher::has_been_set() {
        return Ok(handle);
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_writer = {
        let writer = SharedLogWriter(Arc::clone(&handle.file));
        move || writer.clone()
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))?;
    Ok(handle)
}
