use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

/// Defaults read from `--config`. Command-line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Symbol names always offered for reconciliation by `show`.
    pub symbols: Vec<String>,
    pub format: OutputFormat,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.unwrap_or(self.format)
    }

    /// Config symbols followed by `extra`, without repeats.
    pub fn symbol_names(&self, extra: &[String]) -> Vec<String> {
        let mut names = self.symbols.clone();
        for name in extra {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = CliConfig::default();
        assert!(c.symbols.is_empty());
        assert_eq!(c.format, OutputFormat::Text);
    }

    #[test]
    fn load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "symbols = [\"x\", \"mu\"]\nformat = \"json\"").unwrap();
        let c = CliConfig::load(file.path()).unwrap();
        assert_eq!(c.symbols, vec!["x", "mu"]);
        assert_eq!(c.format, OutputFormat::Json);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let c: CliConfig = toml::from_str("symbols = [\"y\"]").unwrap();
        assert_eq!(c.format, OutputFormat::Text);
    }

    #[test]
    fn flags_take_precedence() {
        let c = CliConfig {
            symbols: vec!["x".into()],
            format: OutputFormat::Json,
        };
        assert_eq!(c.format(None), OutputFormat::Json);
        assert_eq!(c.format(Some(OutputFormat::Text)), OutputFormat::Text);
        assert_eq!(c.symbol_names(&["y".to_owned(), "x".to_owned()]), vec!["x", "y"]);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(&dir.path().join("absent.toml")).is_err());
        assert!(CliConfig::load_or_default(None).is_ok());
    }
}
