//! `.properties` file persister.
//!
//! One UTF-8 file per plugin, `<dir>/<plugin id>.properties`:
//!
//! ```text
//! # Configuration for plugin: greeter
//! greeting.prefix=Hello
//! start.count=3
//! url=https\://example.com?a\=1&b\=2
//! ```
//!
//! The reader accepts the usual properties syntax (`=`, `:` or whitespace
//! separators, `#` / `!` comments, backslash line continuations and
//! `\uXXXX` escapes), so files written by other tools load too.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error};

use super::ConfigPersister;

const FILE_EXTENSION: &str = "properties";

#[derive(Debug, Error)]
enum PersistenceError {
    #[error("plugin id '{0}' cannot be used as a file name")]
    InvalidPluginId(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Stores each plugin's configuration in its own `.properties` file.
///
/// I/O failures are logged; loading then yields an empty map and saving
/// leaves the previous file in place.
#[derive(Debug, Clone)]
pub struct PropertiesConfigPersister {
    dir: PathBuf,
}

impl PropertiesConfigPersister {
    /// Files live in `dir`, which is created on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `plugin_id`'s configuration.
    pub fn file_for(&self, plugin_id: &str) -> PathBuf {
        self.dir.join(format!("{plugin_id}.{FILE_EXTENSION}"))
    }

    fn checked_file_for(&self, plugin_id: &str) -> Result<PathBuf, PersistenceError> {
        if plugin_id.is_empty() || plugin_id.contains(['/', '\\']) || plugin_id.contains("..") {
            return Err(PersistenceError::InvalidPluginId(plugin_id.to_string()));
        }
        Ok(self.file_for(plugin_id))
    }

    fn try_load(&self, plugin_id: &str) -> Result<HashMap<String, String>, PersistenceError> {
        let file = self.checked_file_for(plugin_id)?;
        match fs::read_to_string(&file) {
            Ok(text) => {
                let entries = parse(&text);
                debug!(plugin = plugin_id, file = %file.display(), entries = entries.len(), "Loaded configuration");
                Ok(entries)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(plugin = plugin_id, file = %file.display(), "No configuration file");
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_save(
        &self,
        plugin_id: &str,
        config: &HashMap<String, String>,
    ) -> Result<(), PersistenceError> {
        let file = self.checked_file_for(plugin_id)?;
        fs::create_dir_all(&self.dir)?;

        // One temp file per save; concurrent saves of a plugin share only the target.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(render(plugin_id, config).as_bytes())?;
        tmp.persist(&file).map_err(|e| e.error)?;
        debug!(plugin = plugin_id, file = %file.display(), entries = config.len(), "Saved configuration");
        Ok(())
    }

    fn try_delete(&self, plugin_id: &str) -> Result<(), PersistenceError> {
        let file = self.checked_file_for(plugin_id)?;
        match fs::remove_file(&file) {
            Ok(()) => {
                debug!(plugin = plugin_id, file = %file.display(), "Deleted configuration file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ConfigPersister for PropertiesConfigPersister {
    fn load(&self, plugin_id: &str) -> HashMap<String, String> {
        self.try_load(plugin_id).unwrap_or_else(|e| {
            error!(plugin = plugin_id, error = %e, "Failed to load configuration");
            HashMap::new()
        })
    }

    fn save(&self, plugin_id: &str, config: &HashMap<String, String>) {
        if let Err(e) = self.try_save(plugin_id, config) {
            error!(plugin = plugin_id, error = %e, "Failed to save configuration");
        }
    }

    fn delete(&self, plugin_id: &str) {
        if let Err(e) = self.try_delete(plugin_id) {
            error!(plugin = plugin_id, error = %e, "Failed to delete configuration");
        }
    }
}

// =============================================================================
// Format
// =============================================================================

fn render(plugin_id: &str, config: &HashMap<String, String>) -> String {
    let mut entries: Vec<_> = config.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = format!("# Configuration for plugin: {plugin_id}\n");
    for (key, value) in entries {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
}

/// Joins continuation lines and drops blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = raw.trim_start_matches([' ', '\t', '\u{c}']);
        if !continuing && (line.is_empty() || line.starts_with(['#', '!'])) {
            continue;
        }
        let trailing = line.len() - line.trim_end_matches('\\').len();
        if trailing % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn parse(text: &str) -> HashMap<String, String> {
    logical_lines(text)
        .iter()
        .map(|line| parse_entry(line))
        .collect()
}

fn parse_entry(line: &str) -> (String, String) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if matches!(c, '=' | ':' | ' ' | '\t' | '\u{c}') {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }
    (unescape(key), unescape(rest))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        assert!(persister.load("nobody").is_empty());
    }

    #[test]
    fn test_round_trip_utf8_and_special_characters() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        let config = entries(&[
            ("greeting", "Привет мир"),
            ("url", "https://example.com?a=1&b=2"),
            ("key with spaces", "  leading spaces"),
            ("multi", "line one\nline two\ttabbed"),
            ("#hash", "!bang"),
            ("path", "C:\\plugins\\greeter"),
            ("empty", ""),
        ]);

        persister.save("greeter", &config);
        assert_eq!(persister.load("greeter"), config);
    }

    #[test]
    fn test_file_layout() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        persister.save("greeter", &entries(&[("b", "2"), ("a", "1")]));

        let text = fs::read_to_string(dir.path().join("greeter.properties")).unwrap();
        assert_eq!(text, "# Configuration for plugin: greeter\na=1\nb=2\n");
    }

    #[test]
    fn test_creates_directory_on_demand() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("config").join("plugins");
        let persister = PropertiesConfigPersister::new(&nested);

        persister.save("p1", &entries(&[("k", "v")]));
        assert!(nested.join("p1.properties").is_file());
        assert_eq!(fs::read_dir(&nested).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_saves_of_one_plugin() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        let snapshots: Vec<HashMap<String, String>> = (0..4)
            .map(|writer| {
                (0..200)
                    .map(|i| (format!("key.{i}"), format!("writer-{writer}")))
                    .collect()
            })
            .collect();

        for _ in 0..25 {
            std::thread::scope(|s| {
                for snapshot in &snapshots {
                    let persister = &persister;
                    s.spawn(move || persister.try_save("p1", snapshot).unwrap());
                }
            });

            let loaded = persister.load("p1");
            assert!(snapshots.contains(&loaded));
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_overwrites_previous_entries() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        persister.save("p1", &entries(&[("old", "1")]));
        persister.save("p1", &entries(&[("new", "2")]));
        assert_eq!(persister.load("p1"), entries(&[("new", "2")]));
    }

    #[test]
    fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path());
        persister.save("p1", &entries(&[("k", "v")]));
        persister.delete("p1");

        assert!(!persister.file_for("p1").exists());
        assert!(persister.load("p1").is_empty());
        persister.delete("p1");
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let persister = PropertiesConfigPersister::new(dir.path().join("inner"));

        persister.save("../escape", &entries(&[("k", "v")]));
        persister.save("a/b", &entries(&[("k", "v")]));
        assert!(!dir.path().join("escape.properties").exists());
        assert!(!dir.path().join("inner").exists());

        assert!(persister.checked_file_for("dotted.plugin.id").is_ok());
    }

    #[test]
    fn test_reads_foreign_syntax() {
        let text = "\
! comment
# another
plain = value
colon:value
spaced   value with spaces
continued = first \\
    second
unicode=caf\\u00e9
";
        let parsed = parse(text);
        assert_eq!(parsed["plain"], "value");
        assert_eq!(parsed["colon"], "value");
        assert_eq!(parsed["spaced"], "value with spaces");
        assert_eq!(parsed["continued"], "first second");
        assert_eq!(parsed["unicode"], "café");
        assert_eq!(parsed.len(), 5);
    }
}
