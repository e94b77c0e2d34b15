use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub quiet: bool,
    /// Root of the dated log directories; `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

type SharedFile = Arc<Mutex<BufWriter<File>>>;

/// Sends every record to stderr and, when configured, to the session log file.
struct TeeWriter {
    file: Option<SharedFile>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &self.file {
            let mut file = file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                file.flush()?;
            }
        }
        Ok(())
    }
}

/// `<root>/<dd_mm_yyyy>/debug_<YYYYmmdd_HHMMSS>.log`
pub fn session_log_path(root: &Path, now: &DateTime<Local>) -> PathBuf {
    root.join(now.format("%d_%m_%Y").to_string())
        .join(format!("debug_{}.log", now.format("%Y%m%d_%H%M%S")))
}

/// The process-wide logger. The log file is flushed by [`LogSession::finish`] or on drop.
pub struct LogSession {
    file: Option<SharedFile>,
    path: Option<PathBuf>,
}

impl LogSession {
    pub fn init(options: &LogOptions) -> Result<Self> {
        let (file, path) = match &options.log_dir {
            Some(root) => {
                let path = session_log_path(root, &Local::now());
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create log directory {}", parent.display())
                    })?;
                }
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create log file {}", path.display()))?;
                (Some(Arc::new(Mutex::new(BufWriter::new(file)))), Some(path))
            }
            None => (None, None),
        };

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        if options.quiet {
            builder.filter_level(log::LevelFilter::Warn);
        } else if options.verbose {
            builder.filter_level(log::LevelFilter::Debug);
        }
        builder
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}][{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .write_style(env_logger::WriteStyle::Never)
            .target(env_logger::Target::Pipe(Box::new(TeeWriter {
                file: file.clone(),
            })))
            .try_init()
            .context("Logger already initialised")?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn finish(self) {
        drop(self);
    }

    fn flush(&self) {
        log::logger().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

impl Drop for LogSession {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_file_lives_in_dated_directory() {
        let now = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            session_log_path(Path::new("logs"), &now),
            PathBuf::from("logs/07_03_2024/debug_20240307_090501.log")
        );
    }

    #[test]
    fn tee_writes_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.log");
        let shared = Arc::new(Mutex::new(BufWriter::new(File::create(&path).unwrap())));
        let mut tee = TeeWriter {
            file: Some(shared.clone()),
        };
        tee.write_all(b"2024-03-07 [INFO][envrec] ready\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "2024-03-07 [INFO][envrec] ready\n"
        );
    }
}
