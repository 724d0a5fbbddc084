use crate::utils::error::{DoctorError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*)(.*)$")
            .expect("static pattern compiles")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvLine {
    Entry {
        /// Everything up to and including `=` plus following whitespace.
        prefix: String,
        key: String,
        quote: Option<char>,
        value: String,
        /// Trailing comment and line terminator remnants, kept verbatim.
        suffix: String,
    },
    Other(String),
}

/// A dotenv file that can be edited without disturbing untouched lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<EnvLine>,
}

impl EnvFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(source: &str, content: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (index, raw) in content.split('\n').enumerate() {
            let (body, cr) = match raw.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (raw, ""),
            };

            let Some(caps) = entry_pattern().captures(body) else {
                lines.push(EnvLine::Other(raw.to_string()));
                continue;
            };

            let mut prefix = caps[1].to_string();
            let key = caps[2].to_string();
            let rest = &caps[3];

            // `KEY= # note` assigns an empty value; the comment moves to the suffix.
            if rest.starts_with('#') && prefix.ends_with(char::is_whitespace) {
                let gap = prefix.split_off(prefix.trim_end().len());
                lines.push(EnvLine::Entry {
                    prefix,
                    key,
                    quote: None,
                    value: String::new(),
                    suffix: format!("{}{}{}", gap, rest, cr),
                });
                continue;
            }

            let (quote, value, suffix) = match rest.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let inner = &rest[1..];
                    let close = inner.find(q).ok_or_else(|| DoctorError::EnvFileError {
                        path: source.to_string(),
                        line: index + 1,
                        message: format!("unterminated {} quote in value of {}", q, key),
                    })?;
                    (
                        Some(q),
                        inner[..close].to_string(),
                        inner[close + 1..].to_string(),
                    )
                }
                _ => match rest.find(" #").or_else(|| rest.find("\t#")) {
                    Some(pos) => {
                        let value = rest[..pos].trim_end();
                        (None, value.to_string(), rest[value.len()..].to_string())
                    }
                    None => {
                        let value = rest.trim_end();
                        (None, value.to_string(), rest[value.len()..].to_string())
                    }
                },
            };

            lines.push(EnvLine::Entry {
                prefix,
                key,
                quote,
                value,
                suffix: format!("{}{}", suffix, cr),
            });
        }
        Ok(Self { lines })
    }

    /// Last assignment wins, as when the file is sourced by a shell.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            EnvLine::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let EnvLine::Entry { key, .. } = line {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Updates the last assignment of `key` or appends a new one.
    /// Returns false when the stored value was already `value`.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let existing = self.lines.iter_mut().rev().find_map(|line| match line {
            EnvLine::Entry {
                key: k, value: v, ..
            } if k == key => Some(v),
            _ => None,
        });

        match existing {
            Some(v) if v == value => false,
            Some(v) => {
                *v = value.to_string();
                true
            }
            None => {
                let entry = EnvLine::Entry {
                    prefix: format!("{}=", key),
                    key: key.to_string(),
                    quote: None,
                    value: value.to_string(),
                    suffix: String::new(),
                };
                // Keep the trailing newline at the end of the file.
                let at = match self.lines.last() {
                    Some(EnvLine::Other(last)) if last.is_empty() => self.lines.len() - 1,
                    _ => self.lines.len(),
                };
                self.lines.insert(at, entry);
                if at == self.lines.len() - 1 {
                    self.lines.push(EnvLine::Other(String::new()));
                }
                true
            }
        }
    }

    /// Line numbers (1-based) that are neither assignments, comments nor blank.
    pub fn malformed_lines(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| match line {
                EnvLine::Other(raw) => {
                    let trimmed = raw.trim();
                    (!trimmed.is_empty() && !trimmed.starts_with('#')).then_some(index + 1)
                }
                EnvLine::Entry { .. } => None,
            })
            .collect()
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line {
                EnvLine::Entry {
                    prefix,
                    quote,
                    value,
                    suffix,
                    ..
                } => match quote {
                    Some(q) => format!("{}{}{}{}{}", prefix, q, value, q, suffix),
                    None => format!("{}{}{}", prefix, value, suffix),
                },
                EnvLine::Other(raw) => raw.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}
