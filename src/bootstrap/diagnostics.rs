//! CPU and heap profile sessions driven by environment variables.
//!
//! Reports are resource-usage counter deltas serialized as JSON; the
//! contract that matters to bootstrap is the session lifecycle: start never
//! leaves a half-open file, stop always flushes and closes.

use std::{
    fs::{self, File},
    io::{self, Write},
    mem::MaybeUninit,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

/// Environment variable naming the CPU profile output path.
pub const CPU_PROFILE_ENV: &str = "CPU_PROFILE";
/// Environment variable naming the heap profile output path.
pub const HEAP_PROFILE_ENV: &str = "HEAP_PROFILE";

#[derive(Debug, Clone, Copy)]
struct RusageSnapshot {
    user_cpu_us: i64,
    system_cpu_us: i64,
    max_rss_kb: i64,
    minor_faults: i64,
    major_faults: i64,
    voluntary_ctx_switches: i64,
    involuntary_ctx_switches: i64,
}

fn rusage_snapshot() -> io::Result<RusageSnapshot> {
    let mut usage = MaybeUninit::<libc::rusage>::zeroed();
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let usage = unsafe { usage.assume_init() };
    Ok(RusageSnapshot {
        user_cpu_us: timeval_us(usage.ru_utime),
        system_cpu_us: timeval_us(usage.ru_stime),
        max_rss_kb: usage.ru_maxrss as i64,
        minor_faults: usage.ru_minflt as i64,
        major_faults: usage.ru_majflt as i64,
        voluntary_ctx_switches: usage.ru_nvcsw as i64,
        involuntary_ctx_switches: usage.ru_nivcsw as i64,
    })
}

fn timeval_us(tv: libc::timeval) -> i64 {
    tv.tv_sec as i64 * 1_000_000 + tv.tv_usec as i64
}

#[derive(Debug, Serialize)]
struct CpuProfileReport {
    kind: &'static str,
    captured_at: String,
    wall_ms: u64,
    user_cpu_us: i64,
    system_cpu_us: i64,
    minor_faults: i64,
    major_faults: i64,
    voluntary_ctx_switches: i64,
    involuntary_ctx_switches: i64,
}

#[derive(Debug, Serialize)]
struct HeapProfileReport {
    kind: &'static str,
    captured_at: String,
    max_rss_kb: i64,
    minor_faults: i64,
    major_faults: i64,
}

/// An open CPU profile session: started during bootstrap, stopped by the
/// cleanup chain.
#[derive(Debug)]
pub struct CpuProfileSession {
    file: File,
    path: PathBuf,
    started: RusageSnapshot,
    wall_start: Instant,
}

impl CpuProfileSession {
    /// Create the output file and snapshot the starting counters. A failure
    /// after the file was created removes it again rather than leaving a
    /// half-open profile behind.
    pub fn start(path: PathBuf) -> io::Result<Self> {
        let file = File::create(&path)?;
        let started = match rusage_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(err);
            }
        };
        info!(
            target: "rewind::diagnostics",
            path = %path.display(),
            "started CPU profile session"
        );
        Ok(Self {
            file,
            path,
            started,
            wall_start: Instant::now(),
        })
    }

    /// Write the usage deltas accumulated since start and close the file.
    pub fn stop(mut self) -> io::Result<()> {
        let finished = rusage_snapshot()?;
        let report = CpuProfileReport {
            kind: "cpu",
            captured_at: Utc::now().to_rfc3339(),
            wall_ms: self.wall_start.elapsed().as_millis() as u64,
            user_cpu_us: finished.user_cpu_us - self.started.user_cpu_us,
            system_cpu_us: finished.system_cpu_us - self.started.system_cpu_us,
            minor_faults: finished.minor_faults - self.started.minor_faults,
            major_faults: finished.major_faults - self.started.major_faults,
            voluntary_ctx_switches: finished.voluntary_ctx_switches
                - self.started.voluntary_ctx_switches,
            involuntary_ctx_switches: finished.involuntary_ctx_switches
                - self.started.involuntary_ctx_switches,
        };
        serde_json::to_writer_pretty(&mut self.file, &report)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        info!(
            target: "rewind::diagnostics",
            path = %self.path.display(),
            "wrote CPU profile"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write a heap snapshot: peak RSS and fault counters at teardown.
pub fn write_heap_profile(path: &Path) -> io::Result<()> {
    let usage = rusage_snapshot()?;
    let report = HeapProfileReport {
        kind: "heap",
        captured_at: Utc::now().to_rfc3339(),
        max_rss_kb: usage.max_rss_kb,
        minor_faults: usage.minor_faults,
        major_faults: usage.major_faults,
    };
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, &report)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")?;
    file.flush()?;
    info!(
        target: "rewind::diagnostics",
        path = %path.display(),
        "wrote heap profile"
    );
    Ok(())
}
