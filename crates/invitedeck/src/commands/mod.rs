pub mod completion;
pub mod config;
pub mod export;
pub mod video;

use anyhow::Result;

use crate::cli::SourceArgs;
use crate::config::Config;
use crate::content::{ContentTable, Language};

/// Resolve the content table and language: flags first, then config, then
/// the built-in defaults.
pub fn load_source(source: &SourceArgs, config: &Config) -> Result<(ContentTable, Language)> {
    let path = source.content.as_deref().or(config.content_path());
    let table = ContentTable::load_or_builtin(path)?;
    let language = source
        .lang
        .map(Language::from)
        .unwrap_or_else(|| config.language());
    if table.get(language).is_none() {
        tracing::warn!(%language, "content has no entry for this language");
    }
    Ok((table, language))
}
