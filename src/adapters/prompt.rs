use crate::domain::ports::Prompter;
use crate::utils::error::{DoctorError, Result};
use colored::Colorize;
use std::io::{self, BufRead, BufReader, Stdin, Write};

/// Reads answers line by line. End of input declines whatever is being asked.
pub struct ConsolePrompter<R> {
    input: R,
    out: Box<dyn Write + Send>,
}

impl ConsolePrompter<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), Box::new(io::stdout()))
    }
}

impl<R: BufRead + Send> ConsolePrompter<R> {
    pub fn new(input: R, out: Box<dyn Write + Send>) -> Self {
        Self { input, out }
    }

    fn ask(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{} ", text.cyan())?;
        self.out.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| DoctorError::PromptError {
                message: e.to_string(),
            })?;
        if read == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead + Send> Prompter for ConsolePrompter<R> {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.ask(&format!("{} {}", question, hint))? else {
                return Ok(false);
            };
            match answer.to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.out, "Please answer y or n.")?,
            }
        }
    }

    fn choose(
        &mut self,
        question: &str,
        options: &[&str],
        default: usize,
    ) -> Result<Option<usize>> {
        writeln!(self.out, "{}", question)?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.out, "  {}) {}", index + 1, option)?;
        }
        let skip = options.len() + 1;
        writeln!(self.out, "  {}) Skip", skip)?;

        loop {
            let Some(answer) =
                self.ask(&format!("Choose [1-{}] (default {}):", skip, default + 1))?
            else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(default));
            }
            match answer.parse::<usize>() {
                Ok(n) if n == skip => return Ok(None),
                Ok(n) if (1..skip).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(self.out, "Please enter a number between 1 and {}.", skip)?,
            }
        }
    }
}

/// Answers without asking: `--yes` takes every default, `--no-fix` declines.
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompter {
    accept: bool,
}

impl AutoPrompter {
    pub fn accept_defaults() -> Self {
        Self { accept: true }
    }

    pub fn decline_all() -> Self {
        Self { accept: false }
    }
}

impl Prompter for AutoPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = self.accept && default;
        tracing::debug!("Auto-answered '{}' with {}", question, answer);
        Ok(answer)
    }

    fn choose(
        &mut self,
        question: &str,
        _options: &[&str],
        default: usize,
    ) -> Result<Option<usize>> {
        tracing::debug!("Auto-answered '{}' (accept defaults: {})", question, self.accept);
        Ok(self.accept.then_some(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> ConsolePrompter<Cursor<Vec<u8>>> {
        ConsolePrompter::new(Cursor::new(input.as_bytes().to_vec()), Box::new(io::sink()))
    }

    #[test]
    fn test_confirm_answers() {
        assert!(prompter("y\n").confirm("Start Docker?", false).unwrap());
        assert!(!prompter("no\n").confirm("Start Docker?", true).unwrap());
        assert!(prompter("\n").confirm("Start Docker?", true).unwrap());
        assert!(prompter("maybe\nYES\n").confirm("Start Docker?", false).unwrap());
    }

    #[test]
    fn test_confirm_eof_declines() {
        assert!(!prompter("").confirm("Start Docker?", true).unwrap());
    }

    #[test]
    fn test_choose_numeric() {
        let options = ["Stop the process", "Use another port"];
        assert_eq!(prompter("1\n").choose("Conflict", &options, 1).unwrap(), Some(0));
        assert_eq!(prompter("2\n").choose("Conflict", &options, 0).unwrap(), Some(1));
        assert_eq!(prompter("3\n").choose("Conflict", &options, 0).unwrap(), None);
        assert_eq!(prompter("\n").choose("Conflict", &options, 1).unwrap(), Some(1));
        assert_eq!(prompter("7\nx\n1\n").choose("Conflict", &options, 1).unwrap(), Some(0));
        assert_eq!(prompter("").choose("Conflict", &options, 1).unwrap(), None);
    }

    #[test]
    fn test_auto_prompter() {
        let mut yes = AutoPrompter::accept_defaults();
        assert!(yes.confirm("Generate secrets?", true).unwrap());
        assert!(!yes.confirm("Kill process?", false).unwrap());
        assert_eq!(yes.choose("Conflict", &["a", "b"], 1).unwrap(), Some(1));

        let mut no = AutoPrompter::decline_all();
        assert!(!no.confirm("Generate secrets?", true).unwrap());
        assert_eq!(no.choose("Conflict", &["a", "b"], 1).unwrap(), None);
    }
}
