use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use crate::error::LoggingError;
use crate::utils::get_data_dir;

#[derive(Debug)]
struct FileLogger {
    log_path: PathBuf,
    level: Level,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!(
                "{} {} - {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            );
            let log_file = self.log_path.join("log.txt");

            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

pub fn init(debug: bool) -> Result<(), LoggingError> {
    let log_path = get_data_dir().ok_or(LoggingError::NoHomeDir)?;
    create_dir_all(&log_path)?;

    let level = if debug { Level::Debug } else { Level::Info };
    LOGGER
        .set(FileLogger { log_path, level })
        .map_err(|_| LoggingError::AlreadySet)?;

    let logger = LOGGER.get().ok_or(LoggingError::AlreadySet)?;
    log::set_logger(logger).map_err(|_| LoggingError::AlreadySet)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}
