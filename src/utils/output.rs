use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Human-facing status lines. Write failures are ignored: the report is advisory.
pub struct Reporter {
    out: Box<dyn Write + Send>,
}

impl Reporter {
    pub fn stdout() -> Self {
        if !io::stdout().is_terminal() || std::env::var_os("NO_COLOR").is_some() {
            colored::control::set_override(false);
        }
        Self {
            out: Box::new(io::stdout()),
        }
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()))
    }

    pub fn banner(&mut self, title: &str) {
        let rule = "=".repeat(title.chars().count() + 4);
        let _ = writeln!(self.out, "{}", rule.blue());
        let _ = writeln!(self.out, "  {}", title.bold());
        let _ = writeln!(self.out, "{}", rule.blue());
    }

    pub fn section(&mut self, title: &str) {
        let _ = writeln!(self.out, "\n{}", title.bold().underline());
    }

    pub fn ok(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", "✓".green(), message);
    }

    pub fn warn(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", "⚠".yellow(), message.yellow());
    }

    pub fn error(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", "✗".red(), message.red());
    }

    pub fn info(&mut self, message: &str) {
        let _ = writeln!(self.out, "{} {}", "ℹ".blue(), message);
    }

    pub fn fix(&mut self, message: &str) {
        let _ = writeln!(self.out, "🔧 {}", message.green());
    }

    pub fn hint(&mut self, message: &str) {
        let _ = writeln!(self.out, "   {} {}", "→".dimmed(), message.dimmed());
    }

    pub fn plain(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message);
    }
}
