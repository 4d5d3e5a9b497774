use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;
use std::path::Path;

const LOG_DIR: &str = "logs";
const CONTROLLER_LOG: &str = "controller.log";
const ANALYTICS_LOG: &str = "analytics.log";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Target of the structured `tracing` events (recomputations, locks, unlocks).
///
/// These records skip the console and the controller log and are written to
/// `logs/analytics.log` only.
pub const ANALYTICS_TARGET: &str = "analytics";

/// Installs the process wide logger of the controller binary.
///
/// Operator messages go to stderr and `logs/controller.log`, filtered by
/// `RUST_LOG` (default `info`). Routing and firewall analytics always reach
/// `logs/analytics.log`.
pub fn init() {
    if let Err(e) = fs::create_dir_all(LOG_DIR) {
        eprintln!("Failed to create log directory at '{}': {}", LOG_DIR, e);
    }

    let level = parse_level(std::env::var("RUST_LOG").ok().as_deref());
    let log_dir = Path::new(LOG_DIR);

    let mut operator = Dispatch::new()
        .level(level)
        .level_for("serde", LevelFilter::Warn)
        .filter(|metadata| metadata.target() != ANALYTICS_TARGET)
        .chain(console());
    if let Some(file) = plain_file(&log_dir.join(CONTROLLER_LOG)) {
        operator = operator.chain(file);
    }

    let mut root = Dispatch::new().chain(operator);
    if let Some(file) = plain_file(&log_dir.join(ANALYTICS_LOG)) {
        root = root.chain(Dispatch::new().filter(|metadata| metadata.target() == ANALYTICS_TARGET).chain(file));
    }

    if let Err(e) = root.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::info!("Controller logging at {} to stderr and '{}'", level, log_dir.display());
}

/// Unknown or missing levels fall back to `info`.
fn parse_level(value: Option<&str>) -> LevelFilter {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(LevelFilter::Info)
}

fn console() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("[{} {} {}] {}", Local::now().format(TIME_FORMAT), colors.color(record.level()), record.target(), message))
        })
        .chain(std::io::stderr())
}

/// `None` when the file cannot be opened; the console keeps working.
fn plain_file(path: &Path) -> Option<Dispatch> {
    match fern::log_file(path) {
        Ok(file) => Some(
            Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("[{} {} {}] {}", Local::now().format(TIME_FORMAT), record.level(), record.target(), message))
                })
                .chain(file),
        ),
        Err(e) => {
            eprintln!("Failed to open log file '{}': {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults_to_info() {
        assert_eq!(parse_level(None), LevelFilter::Info);
        assert_eq!(parse_level(Some("verbose")), LevelFilter::Info);
        assert_eq!(parse_level(Some(" debug ")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("WARN")), LevelFilter::Warn);
    }
}
