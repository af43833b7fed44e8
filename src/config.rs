//! Optional config file loading and the immutable options handed to the generators.
//!
//! Search order: ./fdx2ebook.toml, then $XDG_CONFIG_HOME/fdx2ebook/config.toml
//! (or ~/.config/fdx2ebook/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONVERTER: &str = "kindlegen";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_PUBLISHER: &str = "fdx2ebook";

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Directory receiving scratch directories and final artifacts. Relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Keep the `__mobi` / `__epub` scratch directories after a run.
    pub keep: Option<bool>,
    /// Program used to build the .mobi file.
    pub kindlegen: Option<PathBuf>,
    /// `dc:language` of the generated packages.
    pub language: Option<String>,
    /// `dc:publisher` of the generated packages.
    pub publisher: Option<String>,
}

/// Search order: (1) ./fdx2ebook.toml, (2) $XDG_CONFIG_HOME/fdx2ebook/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("fdx2ebook.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("fdx2ebook").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}

/// Settings for one conversion run. Built once by the CLI, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub output_dir: PathBuf,
    pub keep_intermediate: bool,
    /// Stream converter output and log each step.
    pub verbose: bool,
    pub kindlegen: PathBuf,
    pub language: String,
    pub publisher: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            output_dir: PathBuf::from("."),
            keep_intermediate: false,
            verbose: false,
            kindlegen: PathBuf::from(DEFAULT_CONVERTER),
            language: DEFAULT_LANGUAGE.to_string(),
            publisher: DEFAULT_PUBLISHER.to_string(),
        }
    }
}

impl Options {
    /// Defaults overridden by whatever keys the config file sets.
    pub fn from_config(config: Option<&Config>) -> Self {
        let defaults = Options::default();
        let Some(c) = config else {
            return defaults;
        };
        Options {
            output_dir: c.output_dir.clone().unwrap_or(defaults.output_dir),
            keep_intermediate: c.keep.unwrap_or(defaults.keep_intermediate),
            verbose: defaults.verbose,
            kindlegen: c.kindlegen.clone().unwrap_or(defaults.kindlegen),
            language: c.language.clone().unwrap_or(defaults.language),
            publisher: c.publisher.clone().unwrap_or(defaults.publisher),
        }
    }
}
