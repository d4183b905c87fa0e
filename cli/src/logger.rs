use colored::*;
use inapp_core::paths;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

const TARGET_COLORS: &[fn(&str) -> ColoredString] = &[
    |s| s.green(),
    |s| s.yellow(),
    |s| s.blue(),
    |s| s.magenta(),
    |s| s.cyan(),
];

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "[E]",
        Level::Warn => "[W]",
        Level::Info => "[I]",
        Level::Debug => "[D]",
        Level::Trace => "[T]",
    }
}

/// Last path segment of a log target, `inapp_core::coordinator::display` -> `display`.
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

pub struct InAppLogger {
    max_level: Level,
    log_file: Mutex<Option<File>>,
    target_colors: Mutex<HashMap<String, usize>>,
}

impl InAppLogger {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let log_file = paths::ensure_data_dir()
            .and_then(|_| paths::log_file_path())
            .and_then(|path| {
                OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&path)
                    .map_err(|e| {
                        eprintln!("Warning: Failed to open log file at {}: {e}", path.display())
                    })
                    .ok()
            });

        Self {
            max_level: max_level(quiet, verbose),
            log_file: Mutex::new(log_file),
            target_colors: Mutex::new(HashMap::new()),
        }
    }

    fn color_for_target(&self, target: &str) -> ColoredString {
        let index = {
            let mut colors = lock(&self.target_colors);
            let next = colors.len();
            *colors
                .entry(target.to_string())
                .or_insert(next % TARGET_COLORS.len())
        };
        TARGET_COLORS[index](target)
    }

    fn format_log(&self, record: &Record) -> String {
        let tag = level_tag(record.level());
        let target = short_target(record.target());
        let message = format!(
            "{tag} [{}] {}",
            self.color_for_target(target).dimmed(),
            record.args()
        );

        match record.level() {
            Level::Error => message.red().bold().to_string(),
            Level::Warn => message.yellow().bold().to_string(),
            level => {
                let colored_tag = match level {
                    Level::Info => tag.green().bold(),
                    Level::Debug => tag.blue().bold(),
                    _ => tag.white().bold(),
                };
                message.replacen(tag, &colored_tag.to_string(), 1)
            }
        }
    }
}

fn max_level(quiet: bool, verbose: bool) -> Level {
    if quiet {
        Level::Info
    } else if verbose {
        Level::Trace
    } else {
        Level::Debug
    }
}

fn format_log_plain(record: &Record) -> String {
    format!(
        "{} [{}] {}",
        level_tag(record.level()),
        short_target(record.target()),
        record.args()
    )
}

impl Log for InAppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        println!("{}", self.format_log(record));

        if let Some(file) = lock(&self.log_file).as_mut() {
            let _ = writeln!(file, "{}", format_log_plain(record));
        }
    }

    fn flush(&self) {
        if let Some(file) = lock(&self.log_file).as_mut() {
            let _ = file.flush();
        }
    }
}

pub fn init_logger(quiet: bool, verbose: bool) -> Result<(), log::SetLoggerError> {
    let logger = InAppLogger::new(quiet, verbose);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
