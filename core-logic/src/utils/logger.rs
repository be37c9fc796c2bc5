use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Install the layered console + rolling-file subscriber.
///
/// Per-submission lines are emitted on the `spam_result` target at INFO;
/// everything else is WARN-and-up in the file and the console. The
/// returned guard must be kept alive by the caller for file logging.
pub fn setup_logger() -> Option<WorkerGuard> {
    std::fs::create_dir_all("logs").ok();

    // Hourly rotation keeps the on-disk footprint small for long runs
    let file_appender = tracing_appender::rolling::hourly("logs", "spammer");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = tracing_subscriber::filter::Targets::new()
        .with_target("spam_result", tracing::Level::INFO)
        .with_default(tracing::Level::WARN);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let console_filter = tracing_subscriber::filter::Targets::new()
        .with_target("spam_result", tracing::Level::INFO)
        .with_default(tracing::Level::WARN);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    Some(guard)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);
        let msg = msg_visitor.message;

        // Colorize the submission outcome keywords
        let colored_msg = if msg.contains("SENT") {
            let green_text = Style::new().fg(Color::LightGreen).bold();
            msg.replace("SENT", &format!("{}", green_text.paint("SENT")))
        } else if msg.contains("Error") {
            let red_text = Style::new().fg(Color::LightRed).bold();
            msg.replace("Error", &format!("{}", red_text.paint("Error")))
        } else {
            msg
        };

        write!(writer, "{}", colored_msg)?;
        writeln!(writer)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;

        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);
        writeln!(writer, "{}", msg_visitor.message)
    }
}
