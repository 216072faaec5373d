//! Rotating file output.
//!
//! Rotation itself is log4rs's job: a `SizeTrigger` decides when the active
//! file is full and a fixed-window roller renames (and optionally gzips) the
//! backups. This module derives the per-logger path, checks the file can be
//! written before anything is registered, and adds age-based pruning on top
//! of the roller.
//!
//! Backups keep the full active file name and append the index:
//! `app.log` rolls into `app.log.0`, `app.log.1`, ... (`app.log.0.gz` when
//! compressing), index 0 being the newest. A named logger's own file always
//! ends in the base extension, so it can never be mistaken for a backup.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log4rs::append::rolling_file::policy::compound::roll::delete::DeleteRoller;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::roll::Roll;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::Append;
use log4rs::encode::pattern::PatternEncoder;

use crate::config::FileConfig;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::level::Severity;
use crate::record::Record;
use crate::sink::Sink;

const BYTES_PER_MB: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Path of the file written by the logger called `name`.
///
/// A non-empty name is inserted before the extension of `base`; the
/// anonymous logger (empty name) writes to `base` itself.
///
/// ```
/// # use std::path::Path;
/// # use awesome_log::rotation::derive_path;
/// assert_eq!(
///     derive_path(Path::new("logs/app.log"), "user-service"),
///     Path::new("logs/app.user-service.log"),
/// );
/// assert_eq!(derive_path(Path::new("logs/app.log"), ""), Path::new("logs/app.log"));
/// ```
pub fn derive_path(base: &Path, name: &str) -> PathBuf {
    if name.is_empty() {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}.{name}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{name}"),
    };
    base.with_file_name(file_name)
}

/// Builds the rotating file sink of the logger called `name`.
///
/// The containing directory is created and the file opened for append before
/// the sink is returned, so an unwritable location fails here and not on the
/// first record.
pub fn build_file_sink(
    file: &FileConfig,
    name: &str,
    threshold: Severity,
    encoder: Encoder,
) -> Result<FileSink> {
    let path = derive_path(&file.path, name);
    if !name.is_empty() && looks_like_backup(&path) {
        return Err(Error::BackupCollision { path });
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
        path: dir.clone(),
        source,
    })?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| Error::OpenFile {
            path: path.clone(),
            source,
        })?;

    let max_size_mb = if file.max_size_mb == 0 {
        DEFAULT_MAX_SIZE_MB
    } else {
        file.max_size_mb
    };
    let trigger = SizeTrigger::new(max_size_mb.saturating_mul(BYTES_PER_MB));
    let roller = RetentionRoller::new(&path, file)?;
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .append(true)
        .build(&path, Box::new(policy))
        .map_err(|source| Error::OpenFile {
            path: path.clone(),
            source,
        })?;

    Ok(FileSink {
        path,
        threshold,
        encoder,
        appender,
    })
}

/// A sink writing to a size-rotated file.
pub struct FileSink {
    path: PathBuf,
    threshold: Severity,
    encoder: Encoder,
    appender: RollingFileAppender,
}

impl FileSink {
    /// The active file, after name derivation.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("threshold", &self.threshold)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl Sink for FileSink {
    fn enabled(&self, level: Severity) -> bool {
        level >= self.threshold
    }

    fn write_record(&self, record: &Record) -> io::Result<()> {
        let line = self.encoder.encode(record);
        self.appender
            .append(
                &log::Record::builder()
                    .args(format_args!("{line}"))
                    .level(record.level.into())
                    .build(),
            )
            .map_err(io::Error::other)
    }

    fn flush(&self) -> io::Result<()> {
        self.appender.flush();
        Ok(())
    }
}

/// Fixed-window rolling plus removal of backups past their age limit.
#[derive(Debug)]
struct RetentionRoller {
    inner: Box<dyn Roll>,
    dir: PathBuf,
    backups: BackupPattern,
    max_age: Option<Duration>,
}

impl RetentionRoller {
    fn new(active: &Path, file: &FileConfig) -> Result<Self> {
        let backups = BackupPattern::for_active(active);
        let inner: Box<dyn Roll> = if file.max_backups == 0 {
            Box::new(DeleteRoller::new())
        } else {
            let pattern = backups.window_pattern(active, file.compress);
            let roller = FixedWindowRoller::builder()
                .build(&pattern, file.max_backups)
                .map_err(|err| Error::Rotation {
                    path: active.to_path_buf(),
                    source: err.into(),
                })?;
            Box::new(roller)
        };
        let max_age = (file.max_age_days > 0)
            .then(|| Duration::from_secs(u64::from(file.max_age_days) * SECONDS_PER_DAY));

        Ok(Self {
            inner,
            dir: active
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            backups,
            max_age,
        })
    }

    fn prune_expired(&self, max_age: Duration) -> io::Result<()> {
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(());
        };
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if !self.backups.matches(&name.to_string_lossy()) {
                continue;
            }
            // Another process may prune the same directory.
            match remove_if_older(&entry.path(), cutoff) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err),
                _ => {}
            }
        }
        Ok(())
    }
}

impl Roll for RetentionRoller {
    fn roll(&self, file: &Path) -> anyhow::Result<()> {
        self.inner.roll(file)?;
        if let Some(max_age) = self.max_age {
            self.prune_expired(max_age)?;
        }
        Ok(())
    }
}

fn remove_if_older(path: &Path, cutoff: SystemTime) -> io::Result<()> {
    if fs::metadata(path)?.modified()? < cutoff {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Whether `path` has the `<anything>.<digits>[.gz]` shape of a backup.
fn looks_like_backup(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|name| name.to_string_lossy()) else {
        return false;
    };
    let name = name.strip_suffix(".gz").unwrap_or(name.as_ref());
    match name.rsplit_once('.') {
        Some((_, index)) => is_index(index),
        None => false,
    }
}

fn is_index(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// File names of backups: `<active file name>.<index>[.gz]`.
#[derive(Debug, Clone)]
struct BackupPattern {
    file_name: String,
}

impl BackupPattern {
    fn for_active(active: &Path) -> Self {
        Self {
            file_name: active
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// The log4rs window pattern, `{}` standing for the backup index.
    /// log4rs gzips the rolled file when the pattern ends in `.gz`.
    fn window_pattern(&self, active: &Path, compress: bool) -> String {
        let mut file_name = format!("{}.{{}}", self.file_name);
        if compress {
            file_name.push_str(".gz");
        }
        active.with_file_name(file_name).to_string_lossy().into_owned()
    }

    fn matches(&self, file_name: &str) -> bool {
        let Some(rest) = file_name
            .strip_prefix(self.file_name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return false;
        };
        is_index(rest.strip_suffix(".gz").unwrap_or(rest))
    }
}
