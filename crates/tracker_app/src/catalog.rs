use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracker_core::{JobKind, PhaseCatalog};
use tracker_logging::tracker_info;

const BUILTIN_CATALOG: &str = include_str!("../catalog.ron");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    resume: Vec<String>,
    story: Vec<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    ticker: BTreeMap<String, Vec<String>>,
}

impl CatalogFile {
    fn into_catalog(self) -> PhaseCatalog {
        let catalog = PhaseCatalog::new()
            .with_phases(JobKind::Resume, self.resume)
            .with_phases(JobKind::Story, self.story);
        let catalog = self
            .labels
            .into_iter()
            .fold(catalog, |catalog, (phase, label)| catalog.with_label(phase, label));
        self.ticker
            .into_iter()
            .fold(catalog, |catalog, (phase, messages)| {
                catalog.with_ticker_messages(phase, messages)
            })
    }
}

pub fn parse(text: &str) -> Result<PhaseCatalog, CatalogError> {
    let file: CatalogFile = ron::from_str(text)?;
    Ok(file.into_catalog())
}

/// The catalog shipped with the binary.
pub fn builtin() -> Result<PhaseCatalog, CatalogError> {
    parse(BUILTIN_CATALOG)
}

pub fn load(path: &Path) -> Result<PhaseCatalog, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog = parse(&text)?;
    tracker_info!("Loaded phase catalog from {:?}", path);
    Ok(catalog)
}
