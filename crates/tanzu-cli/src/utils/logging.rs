//! Logging initialization.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Install the global tracing subscriber for the selected verbosity.
///
/// Logs go to stderr so plugin output on stdout stays clean.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

const fn log_level(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn verbosity_flags_select_level() {
        let cli = Cli::try_parse_from(["tanzu", "plugin", "list"]).unwrap();
        assert_eq!(log_level(&cli), Level::WARN);

        let cli = Cli::try_parse_from(["tanzu", "-v", "plugin", "list"]).unwrap();
        assert_eq!(log_level(&cli), Level::DEBUG);

        let cli = Cli::try_parse_from(["tanzu", "plugin", "list", "--quiet"]).unwrap();
        assert_eq!(log_level(&cli), Level::ERROR);
    }
}
