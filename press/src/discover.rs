use std::path::PathBuf;

use folio::error::Result;
use folio::{Config, Store};

#[derive(Debug)]
pub struct Press {
    pub config: Config,
    pub store: Store,
    pub output: PathBuf,
}

impl Press {
    /// Loads the configuration for the site at `root` (the working directory
    /// by default), or from `config` when given.
    pub fn new(root: Option<PathBuf>, config: Option<PathBuf>, output: PathBuf) -> Result<Self> {
        let root = root.unwrap_or_else(|| PathBuf::from("."));
        let config = match config {
            Some(path) => {
                let mut config = Config::load(path)?;
                config.content_dir = root.join(&config.content_dir);
                config
            }
            None => Config::discover(&root)?,
        };

        tracing::debug!(content = %config.content_dir.display(), "discovered site");
        Ok(Press { store: Store::from_config(&config), config, output })
    }
}
