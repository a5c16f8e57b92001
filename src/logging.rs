//! Process-wide log sink.
//!
//! Every request writes through the same [`LogSink`]. When logging to a
//! file, [`LogSink::reopen`] opens the file again by name and swaps the
//! handle under the lock, so an external rotator can move the old file away
//! and signal the process (see [`signal`](crate::signal)).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

enum Target {
    Stdout,
    File { path: PathBuf, file: File },
}

/// Shared, swappable log destination. Clones share the destination.
#[derive(Clone)]
pub struct LogSink {
    target: Arc<Mutex<Target>>,
}

impl LogSink {
    pub fn stdout() -> Self {
        Self { target: Arc::new(Mutex::new(Target::Stdout)) }
    }

    /// Appends to `path`, creating it if needed.
    pub fn file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        Ok(Self { target: Arc::new(Mutex::new(Target::File { path, file })) })
    }

    /// Reopens the log file by name. The old handle is closed once the new
    /// one is in place; on stdout this does nothing.
    pub fn reopen(&self) -> io::Result<()> {
        let mut target = self.lock();
        if let Target::File { path, file } = &mut *target {
            let fresh = open_append(path)?;
            let _old = std::mem::replace(file, fresh);
            drop(target);
            info!("reopened log file");
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Target> {
        // Poisoning means nothing for a file handle.
        self.target.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Installs the global `tracing` subscriber writing to this sink.
    /// `RUST_LOG` filters; the default level is `info`.
    pub fn install(&self) {
        let ansi = matches!(*self.lock(), Target::Stdout);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(ansi)
            .with_writer(self.clone())
            .init();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

/// One write handle per log event, handed out by [`LogSink`].
pub struct SinkWriter {
    sink: LogSink,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.sink.lock() {
            Target::Stdout => io::stdout().write(buf),
            Target::File { file, .. } => file.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // Hold the lock for the whole event so lines never interleave.
        match &mut *self.sink.lock() {
            Target::Stdout => io::stdout().write_all(buf),
            Target::File { file, .. } => file.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.sink.lock() {
            Target::Stdout => io::stdout().flush(),
            Target::File { file, .. } => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { sink: self.clone() }
    }
}
