use anyhow::{Context, Result};
use tracing_log::LogTracer;

pub fn get_log_level(verbose: u8) -> tracing::Level {
    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
    match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Routes `log` records into `tracing` and installs the fmt subscriber.
pub fn init(verbose: u8) -> Result<()> {
    LogTracer::init().context("Cannot initialize logger")?;
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(get_log_level(verbose))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Cannot install tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::get_log_level;

    #[test]
    fn test_log_levels() {
        assert_eq!(get_log_level(0), tracing::Level::ERROR);
        assert_eq!(get_log_level(1), tracing::Level::WARN);
        assert_eq!(get_log_level(2), tracing::Level::INFO);
        assert_eq!(get_log_level(3), tracing::Level::DEBUG);
        assert_eq!(get_log_level(4), tracing::Level::TRACE);
        assert_eq!(get_log_level(u8::MAX), tracing::Level::TRACE);
    }
}
