//! Console output: the pipe-separated log line and the cooldown countdown.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `<timestamp> | <LEVEL> | <message>`, one event per line.
pub struct PipeFormat;

impl<S, N> FormatEvent<S, N> for PipeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} | {:<5} | ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level().as_str()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .event_format(PipeFormat)
        .with_writer(std::io::stdout)
        .init();
}

/// Count down `seconds` on a single, overwritten stdout line.
pub async fn countdown(seconds: u64) {
    let mut stdout = std::io::stdout();
    for remaining in (1..=seconds).rev() {
        let _ = write!(stdout, "\rWait {remaining} seconds to continue the loop ");
        let _ = stdout.flush();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    if seconds > 0 {
        let _ = writeln!(stdout, "\r{:<45}", "");
    }
}
