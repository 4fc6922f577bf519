use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// Build the subscriber for `cfg` and install it globally.
pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let registry = tracing_subscriber::registry().with(filter(&cfg.level)?);

    match cfg.format {
        LoggerFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.use_color)
                .with_target(cfg.with_targets)
                .with_file(cfg.with_source)
                .with_line_number(cfg.with_source)
                .with_timer(timer());
            registry.with(layer).try_init()?;
        }
        LoggerFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_targets)
                .with_file(cfg.with_source)
                .with_line_number(cfg.with_source)
                .with_timer(timer());
            registry.with(layer).try_init()?;
        }
        #[cfg(all(target_os = "linux", feature = "journald"))]
        LoggerFormat::Journald => {
            let layer = tracing_journald::layer().map_err(LoggerError::Journald)?;
            registry.with(layer).try_init()?;
        }
        #[cfg(not(all(target_os = "linux", feature = "journald")))]
        LoggerFormat::Journald => return Err(LoggerError::JournaldNotSupported),
    }
    tracing::debug!(format = ?cfg.format, level = %cfg.level, "logger installed");
    Ok(())
}

pub(crate) fn filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|source| LoggerError::InvalidLogLevel {
        level: level.to_string(),
        source,
    })
}

/// RFC 3339 timestamps in the local offset, UTC when it cannot be determined.
fn timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}
