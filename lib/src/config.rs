use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, Chainable};

/// The name of the configuration file looked up in a site root.
pub const CONFIG_FILE: &str = "folio.toml";

/// Where posts live relative to the site root, unless configured otherwise.
pub const CONTENT_DIR: &str = "content/blog";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub content_dir: PathBuf,
    pub render: RenderOptions,
    pub nav: NavOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Pass HTML embedded in posts through verbatim. When `false`, it is
    /// escaped and shows up as text.
    pub allow_raw_html: bool,
    pub math: MathOptions,
    pub highlight: HighlightOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MathOptions {
    /// Fail the whole render on a malformed formula instead of falling back
    /// to its source text.
    pub throw_on_error: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HighlightOptions {
    pub light_theme: String,
    pub dark_theme: String,
    /// Selector under which the dark theme's rules apply.
    pub dark_selector: String,
    pub line_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NavOptions {
    /// Number of outline levels displayed by the navigation.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            content_dir: PathBuf::from(CONTENT_DIR),
            render: RenderOptions::default(),
            nav: NavOptions::default(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            allow_raw_html: true,
            math: MathOptions::default(),
            highlight: HighlightOptions::default(),
        }
    }
}

impl Default for HighlightOptions {
    fn default() -> Self {
        HighlightOptions {
            light_theme: "InspiredGitHub".into(),
            dark_theme: "base16-ocean.dark".into(),
            dark_selector: ".dark".into(),
            line_numbers: true,
        }
    }
}

impl Default for NavOptions {
    fn default() -> Self {
        NavOptions { max_depth: 2 }
    }
}

impl Config {
    pub fn from_toml(string: &str) -> Result<Config> {
        Ok(toml::from_str(string)?)
    }

    /// Reads the configuration at `path`. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }

        let string = std::fs::read_to_string(path).chain_with(|| error! {
            "failed to read configuration file",
            "path" => path.display(),
        })?;

        Config::from_toml(&string).chain_with(|| error! {
            "invalid configuration file",
            "path" => path.display(),
        })
    }

    /// Loads `folio.toml` from `root` and resolves the content directory
    /// against `root`.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Config> {
        let root = root.as_ref();
        let mut config = Config::load(root.join(CONFIG_FILE))?;
        config.content_dir = root.join(&config.content_dir);
        Ok(config)
    }
}
