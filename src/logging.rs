//! Log output for the command line.
//!
//! Every module logs through `tracing`; the binary installs one subscriber at
//! startup. Lines look like:
//!
//! ```text
//! 14:02:11  INFO Scanned pages comic="" pages=3 scheduled=1
//! 14:02:11  WARN No info.ini, skipping page=Drafts
//! ```
//!
//! `RUST_LOG` overrides the default filter (`panelgen=info`, or
//! `panelgen=debug` with `--verbose`).

use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Time, level, then the event's message and fields.
pub struct LineFormatter;

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        write!(writer, "{timestamp} {:>5} ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{}={level}", env!("CARGO_CRATE_NAME"))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().event_format(LineFormatter))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_targets_crate() {
        assert_eq!(default_filter(false), "panelgen=info");
        assert_eq!(default_filter(true), "panelgen=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(false);
        init_logging(true);
        tracing::info!("still logging");
    }
}
