//! TerminalSink - 画面をクリアして表を描く進捗表示

use std::io::{self, Write};

use chrono::Local;

use crate::domain::Snapshot;
use crate::ports::ProgressSink;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";
const RULE_WIDTH: usize = 60;

pub struct TerminalSink<W> {
    out: W,
    clear: bool,
}

impl TerminalSink<io::Stdout> {
    /// Redraws stdout in place on every tick.
    pub fn stdout() -> Self {
        Self::new(io::stdout()).clear_screen(true)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, clear: false }
    }

    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ProgressSink for TerminalSink<W> {
    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        let at = snapshot.taken_at.with_timezone(&Local).format("%H:%M:%S");
        writeln!(self.out, "Task monitor - {at}")?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        for (name, outcome) in &snapshot.entries {
            writeln!(
                self.out,
                "{:<15} | {:<10} | {}",
                name,
                outcome.status.as_str(),
                outcome.result.as_deref().unwrap_or("-")
            )?;
        }
        let counts = snapshot.counts();
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(
            self.out,
            "{} done, {} failed",
            counts.done, counts.failed
        )?;
        self.out.flush()
    }
}
