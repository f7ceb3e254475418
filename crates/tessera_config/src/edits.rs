//! Command-edit files.
//!
//! A command-edit file rewrites the simulator run command. Each non-blank line
//! not starting with `#` has the form `s<d>from<d>to<d>`, where `<d>` is any
//! single delimiter character. Edits are literal substring replacements applied
//! in file order to the space-joined command, which is then re-split on
//! whitespace.

use serde::Serialize;

use crate::error::ConfigError;

/// A single literal substitution on the run command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEdit {
    /// Text to find. Never empty.
    pub from: String,
    /// Replacement text. May be empty.
    pub to: String,
}

/// Parses the contents of a command-edit file.
pub fn parse_command_edits(text: &str) -> Result<Vec<CommandEdit>, ConfigError> {
    let mut edits = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = || ConfigError::MalformedEdit {
            line: idx + 1,
            text: line.to_string(),
        };

        let mut chars = line.chars();
        if chars.next() != Some('s') {
            return Err(malformed());
        }
        let delim = chars.next().ok_or_else(malformed)?;
        let body = chars.as_str();
        let parts: Vec<&str> = body.split(delim).collect();
        // "from<d>to<d>" splits into ["from", "to", ""].
        match parts.as_slice() {
            [from, to, ""] if !from.is_empty() => edits.push(CommandEdit {
                from: from.to_string(),
                to: to.to_string(),
            }),
            _ => return Err(malformed()),
        }
    }
    Ok(edits)
}

/// Applies `edits` to `command` and returns the rewritten argv.
pub fn apply_command_edits(command: &[String], edits: &[CommandEdit]) -> Vec<String> {
    if edits.is_empty() {
        return command.to_vec();
    }
    let mut joined = command.join(" ");
    for edit in edits {
        joined = joined.replace(&edit.from, &edit.to);
    }
    joined.split_whitespace().map(str::to_string).collect()
}
