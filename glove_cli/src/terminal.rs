//! Terminal presentation of sequencer events and the run log.
//!
//! Writes to stdout never abort a run: the first failure is logged and the
//! view goes quiet for the rest of the process.

use console::Term;
use glove_core::{EventSink, LogEntry, RunLog, SequenceEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

const BAR_TEMPLATE: &str = "  [{bar:24.cyan/blue}] ⏳ {msg}";

static STDOUT_CLOSED: AtomicBool = AtomicBool::new(false);

/// Print a line to stdout, swallowing write errors
macro_rules! outln {
    () => {
        $crate::terminal::write_stdout(format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::terminal::write_stdout(format_args!("{}\n", format_args!($($arg)*)))
    };
}

/// Like `outln!` without the trailing newline
macro_rules! out {
    ($($arg:tt)*) => {
        $crate::terminal::write_stdout(format_args!($($arg)*))
    };
}

pub fn write_stdout(args: fmt::Arguments<'_>) {
    if STDOUT_CLOSED.load(Ordering::Relaxed) {
        return;
    }
    let mut out = io::stdout().lock();
    if let Err(e) = out.write_fmt(args).and_then(|_| out.flush()) {
        STDOUT_CLOSED.store(true, Ordering::Relaxed);
        tracing::warn!("Stdout unavailable, further output dropped: {}", e);
    }
}

/// Line writer that stops after its first failure
#[derive(Debug)]
struct Lines<W: Write> {
    out: W,
    broken: bool,
}

impl<W: Write> Lines<W> {
    fn new(out: W) -> Self {
        Self { out, broken: false }
    }

    fn line(&mut self, text: &str) {
        if self.broken {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            self.broken = true;
            tracing::warn!("Event output failed, continuing without it: {}", e);
        }
    }
}

/// Human-readable progress view
///
/// Event lines go to `out`; the countdown bar is drawn by indicatif on
/// stderr, and only when stderr is a terminal.
pub struct ConsoleView<W: Write> {
    lines: Lines<W>,
    show_progress: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), Term::stderr().is_term())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W, show_progress: bool) -> Self {
        Self {
            lines: Lines::new(out),
            show_progress,
            bar: None,
        }
    }

    fn line(&mut self, text: String) {
        self.clear_bar();
        self.lines.line(&text);
    }

    fn start_bar(&mut self, seconds: u32) {
        self.clear_bar();
        let bar = if self.show_progress {
            let bar = ProgressBar::new(u64::from(seconds));
            let style = ProgressStyle::with_template(BAR_TEMPLATE)
                .map(|style| style.progress_chars("#>."))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(format!("{}s remaining", seconds));
        self.bar = Some(bar);
    }

    fn tick(&mut self, remaining: u32) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{}s remaining", remaining));
            bar.inc(1);
        }
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl<W: Write> EventSink for ConsoleView<W> {
    fn emit(&mut self, event: &SequenceEvent) {
        match event {
            SequenceEvent::RunStarted {
                units,
                planned_seconds,
            } => self.line(format!(
                "\n▶ Running {} steps ({}s planned)",
                units, planned_seconds
            )),
            SequenceEvent::StepStarted { name, seconds } => {
                self.line(format!("\n{} - {}s", name, seconds));
                self.start_bar(*seconds);
            }
            SequenceEvent::Tick { remaining, .. } => self.tick(*remaining),
            SequenceEvent::StepCompleted { name, .. } => self.line(format!("✅ {} complete", name)),
            SequenceEvent::StepSkipped { name } => {
                self.line(format!("⏭  Skipping {} (0s)", name))
            }
            SequenceEvent::RotationStarted {
                title,
                turns,
                per_turn_seconds,
            } => self.line(format!(
                "\n🔄 {} - {} × {}s",
                title, turns, per_turn_seconds
            )),
            SequenceEvent::TurnStarted { title, turn, turns } => {
                self.line(format!("  ↺ {} - Turn {} of {}", title, turn, turns))
            }
            SequenceEvent::RotationCompleted { title, .. } => {
                self.line(format!("✅ {} complete", title))
            }
            SequenceEvent::RotationSkipped { title } => {
                self.line(format!("⏭  Skipping {} (0 time or 0 turns)", title))
            }
            SequenceEvent::CascadeSkipped { name } => {
                self.line(format!("⏭  Skipping {} (Dip 2 is 0s)", name))
            }
            SequenceEvent::AwaitingContinue { token, seconds } => match token.turn {
                Some(_) => self.line(format!(
                    "  Run {} seconds and press Enter to continue.",
                    seconds
                )),
                None => self.line(format!(
                    "  Run {}s manually, then press Enter for Next.",
                    seconds
                )),
            },
            SequenceEvent::RunFinished { entries, seconds } => self.line(format!(
                "\n■ Run finished: {} steps logged, {}s",
                entries, seconds
            )),
        }
    }
}

/// One JSON object per event
pub struct JsonLines<W: Write> {
    lines: Lines<W>,
}

impl JsonLines<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self {
            lines: Lines::new(out),
        }
    }
}

impl<W: Write> EventSink for JsonLines<W> {
    fn emit(&mut self, event: &SequenceEvent) {
        match serde_json::to_string(event) {
            Ok(line) => self.lines.line(&line),
            Err(e) => tracing::warn!("Failed to encode event: {}", e),
        }
    }
}

/// Print the run log as a two-column table
pub fn print_log(log: &RunLog) {
    if let Err(e) = write_log(&mut io::stdout().lock(), log) {
        tracing::warn!("Failed to print timer log: {}", e);
    }
}

pub fn write_log(out: &mut impl Write, log: &RunLog) -> io::Result<()> {
    writeln!(out, "\n📋 Timer Log")?;
    if log.is_empty() {
        writeln!(out, "  No steps run yet. Start a section ✨")?;
        return out.flush();
    }

    let width = log
        .export()
        .iter()
        .map(|e| e.step.chars().count())
        .max()
        .unwrap_or(0)
        .max("Step".len())
        .max("Total".len());

    writeln!(out, "  {:<width$}  {:>8}", "Step", "Time (s)", width = width)?;
    for LogEntry { step, seconds } in log.export() {
        writeln!(out, "  {:<width$}  {:>8}", step, seconds, width = width)?;
    }
    writeln!(
        out,
        "  {:<width$}  {:>8}",
        "Total",
        log.total_seconds(),
        width = width
    )?;
    out.flush()
}
