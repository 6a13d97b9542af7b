//! Persistence adapters for the workspace
//!
//! The reducer in [`crate::Workspace`] never touches storage. A
//! [`crate::Session`] calls [`Persistence::save`] after each committed
//! mutation and [`Persistence::load`] once when it opens.

use crate::{Result, Workspace};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DATA_DIR: &str = "corkboard";
const WORKSPACE_FILE: &str = "workspace.json";

/// Where a workspace is loaded from and saved to
pub trait Persistence {
    /// Load the stored workspace, or `None` if nothing was stored yet
    fn load(&self) -> Result<Option<Workspace>>;

    /// Replace the stored workspace
    fn save(&mut self, workspace: &Workspace) -> Result<()>;
}

/// Deserialize a stored workspace and make sure it upholds every invariant.
///
/// Derived data that drifted (positions, field order, the board order) is
/// repaired with a warning; anything else is an error.
fn parse_workspace(content: &str, source: &str) -> Result<Workspace> {
    let mut workspace: Workspace = serde_json::from_str(content)?;
    if let Err(e) = workspace.validate() {
        warn!(source, "stored workspace is inconsistent, repairing: {}", e);
        workspace.repair();
        workspace.validate()?;
    }
    Ok(workspace)
}

/// Workspace stored as a single pretty-printed JSON document
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default data file under the platform data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR)
            .join(WORKSPACE_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Result<Option<Workspace>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let workspace = parse_workspace(&content, &self.path.display().to_string())?;
        debug!(path = %self.path.display(), boards = workspace.board_order().len(), "workspace loaded");
        Ok(Some(workspace))
    }

    /// Write to a sibling temp file, then rename over the target
    fn save(&mut self, workspace: &Workspace) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            info!(dir = %parent.display(), "created data directory");
        }
        let content = serde_json::to_string_pretty(workspace)?;
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory store holding the serialized form, for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    json: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// The last saved document
    pub fn contents(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Result<Option<Workspace>> {
        self.json
            .as_deref()
            .map(|json| parse_workspace(json, "memory"))
            .transpose()
    }

    fn save(&mut self, workspace: &Workspace) -> Result<()> {
        self.json = Some(serde_json::to_string(workspace)?);
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_store_missing_file_loads_none() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("workspace.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_json_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("workspace.json");
        let mut store = JsonFileStore::new(&path);

        let mut ws = Workspace::new();
        ws.initialize_template_boards();
        let b = ws.create_board("Campaign");
        ws.add_card(&b, "ideas", "Draft copy").unwrap();

        store.save(&ws).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path().exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.board_order(), ws.board_order());
        assert_eq!(loaded.board(&b), ws.board(&b));
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workspace.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(crate::Error::Json(_))));
    }

    /// Saved workspace with one card's position bumped out of sequence
    fn document_with_gap(temp: &TempDir) -> (PathBuf, String) {
        let path = temp.path().join("workspace.json");
        let mut ws = Workspace::new();
        let b = ws.create_board("Campaign");
        ws.add_card(&b, "ideas", "First").unwrap();
        ws.add_card(&b, "ideas", "Second").unwrap();

        let mut doc = serde_json::to_value(&ws).unwrap();
        doc["boards"][&b]["cards"]["ideas"][1]["position"] = serde_json::json!(5);
        fs::write(&path, doc.to_string()).unwrap();
        (path, b)
    }

    #[test]
    fn test_json_store_repairs_position_gap() {
        let temp = TempDir::new().unwrap();
        let (path, b) = document_with_gap(&temp);

        let mut ws = JsonFileStore::new(&path).load().unwrap().unwrap();
        ws.validate().unwrap();
        ws.add_card(&b, "ideas", "Third").unwrap();
        let positions: Vec<usize> = ws.list_cards(&b, "ideas").unwrap().iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_json_store_rejects_unrepairable_document() {
        let temp = TempDir::new().unwrap();
        let (path, b) = document_with_gap(&temp);
        let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        doc["boards"][&b]["listsOrder"].as_array_mut().unwrap().push("ghost".into());
        fs::write(&path, doc.to_string()).unwrap();

        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(crate::Error::Invariant { .. })
        ));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&Workspace::new()).unwrap();
        assert_eq!(store.saves(), 1);
        assert!(store.contents().unwrap().contains("boardOrder"));
        assert!(store.load().unwrap().is_some());
    }
}
