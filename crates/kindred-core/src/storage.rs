//! The on-disk tree library under `~/.kindred/trees/`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LibraryError;
use crate::interchange::{export_json, import_json};
use crate::model::Graph;

const TREE_EXT: &str = "json";

/// Resolve the data directory (~/.kindred/, or `$KINDRED_HOME`).
pub fn kindred_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("KINDRED_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kindred")
}

/// A directory of named trees, one JSON document each.
#[derive(Debug, Clone)]
pub struct Library {
    dir: PathBuf,
}

fn validate_name(name: &str) -> Result<(), LibraryError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..");
    if bad {
        return Err(LibraryError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Library {
    /// `~/.kindred/trees/`.
    pub fn open_default() -> Self {
        Self::at(kindred_dir().join("trees"))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, LibraryError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{TREE_EXT}")))
    }

    /// Tree names (without extension), sorted.
    pub fn list_trees(&self) -> Result<Vec<String>, LibraryError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let suffix = format!(".{TREE_EXT}");
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_suffix(&suffix)
                    .filter(|n| !n.starts_with('.'))
                    .map(|n| n.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_ok_and(|p| p.exists())
    }

    pub fn read_tree_raw(&self, name: &str) -> Result<String, LibraryError> {
        let path = self.path_of(name)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LibraryError::NotFound(name.to_string()),
            _ => LibraryError::Io(e),
        })
    }

    /// Read and validate a tree.
    pub fn read_tree(&self, name: &str) -> Result<Graph, LibraryError> {
        let raw = self.read_tree_raw(name)?;
        Ok(import_json(&raw)?)
    }

    /// Write raw JSON through a temp file and a rename, so readers never see a
    /// half-written document.
    pub fn write_tree_raw(&self, name: &str, data: &str) -> Result<(), LibraryError> {
        let path = self.path_of(name)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{name}.{TREE_EXT}.tmp"));
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        debug!(tree = name, bytes = data.len(), "wrote tree");
        Ok(())
    }

    pub fn write_tree(&self, name: &str, graph: &Graph) -> Result<(), LibraryError> {
        let json = export_json(graph)?;
        self.write_tree_raw(name, &json)
    }

    /// Delete a tree. Deleting a missing tree is not an error.
    pub fn delete_tree(&self, name: &str) -> Result<(), LibraryError> {
        let path = self.path_of(name)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Member};

    fn graph() -> Graph {
        Graph::new(Member::new("r", "Root", Gender::Female).with_child(Member::new("a", "A", Gender::Male)))
    }

    #[test]
    fn write_list_read_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = Library::at(tmp.path().join("trees"));
        assert!(lib.list_trees().unwrap().is_empty());

        lib.write_tree("tran", &graph()).unwrap();
        lib.write_tree("le", &graph()).unwrap();
        assert_eq!(lib.list_trees().unwrap(), vec!["le", "tran"]);
        assert_eq!(lib.read_tree("tran").unwrap(), graph());
        // no temp files left behind
        let leftovers = fs::read_dir(lib.dir())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        lib.delete_tree("tran").unwrap();
        lib.delete_tree("tran").unwrap();
        assert_eq!(lib.list_trees().unwrap(), vec!["le"]);
    }

    #[test]
    fn missing_and_invalid_names() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = Library::at(tmp.path());
        assert!(matches!(lib.read_tree("ghost"), Err(LibraryError::NotFound(_))));
        assert!(matches!(lib.read_tree("../etc"), Err(LibraryError::InvalidName(_))));
        assert!(matches!(lib.write_tree("", &graph()), Err(LibraryError::InvalidName(_))));
        assert!(!lib.exists("ghost"));
    }

    #[test]
    fn corrupt_document_surfaces_import_error() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = Library::at(tmp.path());
        lib.write_tree_raw("bad", "{\"gender\": \"male\"}").unwrap();
        assert!(matches!(lib.read_tree("bad"), Err(LibraryError::Import(_))));
    }
}
