//! INI-style configuration file parser.
//!
//! Files look like:
//!
//! ```text
//! # comment
//! [default]
//! region = eu1
//! api_key = 1a2b3c
//! ```
//!
//! Section names are kept exactly as written between the brackets, and
//! anything after the closing bracket is ignored. Option names are
//! lower-cased. Options of a `[DEFAULT]` section are inherited by every
//! other section and `[DEFAULT]` itself is not listed. Values are raw
//! strings, interpretation is left to the loaders.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::paths::expand_user;
use crate::error::{CloudGuardError, IniError, Result};

/// Options of one section, by lower-cased name.
pub type Section = BTreeMap<String, String>;

/// Parsed file: section name to its options.
pub type RawConfig = BTreeMap<String, Section>;

/// Section read by the loaders.
pub const DEFAULT_SECTION: &str = "default";

/// Section whose options every other section inherits.
pub const INHERITED_SECTION: &str = "DEFAULT";

const COMMENT_PREFIXES: &[char] = &['#', ';'];
const DELIMITERS: &[char] = &['=', ':'];

/// Read and parse a configuration file.
///
/// A `None` path is a no-op returning an empty mapping. A leading `~` is
/// expanded to the home directory.
///
/// # Errors
///
/// - [`CloudGuardError::Io`] if the file does not exist or cannot be read.
/// - [`CloudGuardError::ConfigParse`] if the file is not UTF-8 or not valid
///   INI syntax.
pub fn parse_raw_config(path: Option<&Path>) -> Result<RawConfig> {
    let Some(path) = path else {
        return Ok(RawConfig::new());
    };

    let bytes = fs::read(expand_user(path)).map_err(|source| CloudGuardError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8(bytes).map_err(|e| CloudGuardError::ConfigParse {
        path: path.to_path_buf(),
        source: IniError {
            line: None,
            reason: format!("invalid UTF-8: {e}"),
        },
    })?;

    parse_ini(&text).map_err(|source| CloudGuardError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse INI text.
///
/// # Errors
///
/// Returns an [`IniError`] naming the offending line for options outside a
/// section, lines without a `=`/`:` delimiter, empty option names, malformed
/// headers, and duplicate sections or options.
pub fn parse_ini(text: &str) -> core::result::Result<RawConfig, IniError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut config = RawConfig::new();
    let mut section: Option<String> = None;
    // Last option assigned, target of continuation lines.
    let mut option: Option<String> = None;

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            option = None;
            continue;
        }
        if trimmed.starts_with(COMMENT_PREFIXES) {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            if let (Some(s), Some(o)) = (&section, &option) {
                if let Some(value) = config.get_mut(s).and_then(|opts| opts.get_mut(o)) {
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest
                .rfind(']')
                .map(|end| &rest[..end])
                .ok_or_else(|| IniError::at(lineno, "unterminated section header"))?;
            if name.is_empty() {
                return Err(IniError::at(lineno, "empty section name"));
            }
            if config.contains_key(name) {
                return Err(IniError::at(
                    lineno,
                    format!("section '{name}' already exists"),
                ));
            }
            config.insert(name.to_string(), Section::new());
            section = Some(name.to_string());
            option = None;
            continue;
        }

        let Some(current) = section.as_ref() else {
            return Err(IniError::at(lineno, "option outside of any section"));
        };

        let pos = trimmed
            .find(DELIMITERS)
            .ok_or_else(|| IniError::at(lineno, "expected `key = value`"))?;
        let key = trimmed[..pos].trim().to_lowercase();
        let value = trimmed[pos + 1..].trim();

        if key.is_empty() {
            return Err(IniError::at(lineno, "empty option name"));
        }

        let options = config.entry(current.clone()).or_default();
        if options.contains_key(&key) {
            return Err(IniError::at(
                lineno,
                format!("option '{key}' in section '{current}' already exists"),
            ));
        }
        options.insert(key.clone(), value.to_string());
        option = Some(key);
    }

    if let Some(inherited) = config.remove(INHERITED_SECTION) {
        for options in config.values_mut() {
            for (key, value) in &inherited {
                options.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }

    Ok(config)
}

/// Parse a file, downgrading an unreadable or missing file to an empty
/// mapping. Parse errors still propagate.
pub(crate) fn read_or_empty(path: Option<&Path>, what: &str) -> Result<RawConfig> {
    match parse_raw_config(path) {
        Err(CloudGuardError::Io { path, source }) => {
            tracing::warn!(path = %path.display(), error = %source, "could not read {}", what);
            Ok(RawConfig::new())
        }
        other => other,
    }
}
