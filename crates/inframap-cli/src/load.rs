use crate::pipeline::CliError;
use inframap_model::Asset;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Optional file-level section carrying the overall map title.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct General {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    general: Option<General>,
    #[serde(default)]
    assets: Vec<Asset>,
}

/// Assets from one inventory file, each stamped with its source path.
pub fn load_inventory(path: &Path) -> Result<(Option<General>, Vec<Asset>), CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Usage(format!("failed to read {}: {e}", path.display())))?;
    if text.trim().is_empty() {
        return Ok((None, Vec::new()));
    }
    let file: InventoryFile = serde_yaml::from_str(&text)
        .map_err(|e| CliError::Usage(format!("failed to parse {}: {e}", path.display())))?;
    let mut assets = file.assets;
    for asset in &mut assets {
        asset.source = Some(path.to_path_buf());
    }
    Ok((file.general, assets))
}

/// Splits assets tagged `archived` out of the working set. Archived assets
/// are listed but never validated or drawn.
#[must_use]
pub fn split_archived(assets: Vec<Asset>) -> (Vec<Asset>, Vec<Asset>) {
    assets.into_iter().partition(|a| !a.is_archived())
}
