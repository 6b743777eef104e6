use console::Term;
use log::debug;

use crate::status::StatusSink;

use super::styling::status_line;

/// Status "bar" on a single, redrawn stderr line.
pub struct TerminalSink {
    term: Term,
}

impl TerminalSink {
    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn redraw(&self, text: &str) {
        let result = self
            .term
            .clear_line()
            .and_then(|()| self.term.write_str(&status_line(text).to_string()));

        if let Err(e) = result {
            debug!("Failed to draw status line: {e}");
        }
    }
}

impl StatusSink for TerminalSink {
    fn set_status(&self, _key: &str, text: &str) {
        self.redraw(text);
    }

    fn erase_status(&self, _key: &str) {
        if let Err(e) = self.term.clear_line() {
            debug!("Failed to clear status line: {e}");
        }
    }
}
