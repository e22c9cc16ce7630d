//! # Configuration Dictionary
//!
//! The preset loader (see [`crate::channel::preset`]) consumes a plain
//! `section -> key -> value` dictionary; the spec explicitly leaves the
//! on-disk file syntax unspecified beyond that shape and the closed key
//! set. [`ConfigDict`] is that dictionary. [`load_toml`] is a convenience
//! adapter from a TOML file for the `radiod` binary's startup path; it is
//! not load-bearing for the preset loader itself, which only ever sees a
//! `ConfigDict`.

use std::collections::HashMap;
use std::path::Path;

use crate::error::RadioError;

/// A configuration dictionary: section name -> key -> raw string value.
/// Global/default values conventionally live under the `"global"`
/// section; named presets are overlaid on top of it (global first, then
/// the named section), per the preset loader contract.
#[derive(Debug, Clone, Default)]
pub struct ConfigDict {
    sections: HashMap<String, HashMap<String, String>>,
}

impl ConfigDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key/value pair into a section, creating the section if
    /// needed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Looks up a raw string value.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// Names of every section in the dictionary.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// True if the section exists (even if empty).
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Keys present in a section, in arbitrary order.
    pub fn keys(&self, section: &str) -> Vec<&str> {
        self.sections
            .get(section)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Loads a `ConfigDict` from a TOML file where each top-level table is a
/// section and each of its string-valued keys becomes a dictionary entry.
/// Non-string values are rejected with [`RadioError::Other`] rather than
/// silently stringified, since every recognized key's wire form is
/// textual (frequency strings, dB strings, booleans as `"true"`/`"false"`).
pub fn load_toml(path: impl AsRef<Path>) -> Result<ConfigDict, RadioError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| RadioError::Setup(format!("reading {}: {e}", path.display())))?;
    parse_toml_str(&text)
}

fn parse_toml_str(text: &str) -> Result<ConfigDict, RadioError> {
    let doc: toml::Value = text
        .parse()
        .map_err(|e| RadioError::Setup(format!("invalid TOML: {e}")))?;

    let table = doc
        .as_table()
        .ok_or_else(|| RadioError::Setup("config root must be a table".to_string()))?;

    let mut dict = ConfigDict::new();
    for (section, value) in table {
        let section_table = value.as_table().ok_or_else(|| {
            RadioError::Setup(format!("section [{section}] must be a table of key = value"))
        })?;
        for (key, v) in section_table {
            let s = match v {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(RadioError::Setup(format!(
                        "[{section}].{key} must be a scalar, got {other:?}"
                    )))
                }
            };
            dict.set(section, key, s);
        }
    }
    Ok(dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_scalars() {
        let dict = parse_toml_str(
            r#"
            [global]
            samprate = "12000"
            mono = "true"

            [nbfm]
            demod = "fm"
            low = "-5k"
            "#,
        )
        .unwrap();

        assert_eq!(dict.get("global", "samprate"), Some("12000"));
        assert_eq!(dict.get("global", "mono"), Some("true"));
        assert_eq!(dict.get("nbfm", "demod"), Some("fm"));
        assert_eq!(dict.get("missing", "x"), None);
    }

    #[test]
    fn rejects_non_scalar_values() {
        let err = parse_toml_str(
            r#"
            [global]
            freqs = [1, 2, 3]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RadioError::Setup(_)));
    }

    #[test]
    fn set_and_get_roundtrip() {
        let mut dict = ConfigDict::new();
        dict.set("global", "samprate", "8000");
        assert_eq!(dict.get("global", "samprate"), Some("8000"));
        assert!(dict.has_section("global"));
        assert!(!dict.has_section("nbfm"));
    }
}
