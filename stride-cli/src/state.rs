use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use stride_core::{Task, TaskForest};

pub fn stride_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".stride"))
}

pub fn ensure_stride_home() -> Result<PathBuf> {
    let dir = stride_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_store_path() -> Result<PathBuf> {
    Ok(ensure_stride_home()?.join("tasks.json"))
}

/// Load the task store: a JSON array of flat records linked by `parentId`.
/// A missing file is an empty forest.
pub fn load_store(path: &Path) -> Result<TaskForest> {
    if !path.exists() {
        return Ok(TaskForest::new());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let records: Vec<Task> =
        serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(TaskForest::from_records(records))
}

/// Write via a sibling temp file so a crash never leaves half a store.
pub fn save_store(path: &Path, forest: &TaskForest) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(&forest.to_records())?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let forest = load_store(&dir.path().join("nope.json")).unwrap();
        assert!(forest.is_empty());
    }

    #[test]
    fn store_keeps_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tasks.json");

        let mut forest = TaskForest::new();
        forest.insert_root(Task::new("p", "Parent", Utc::now())).unwrap();
        forest.add_subtask("p", Task::new("c", "Child", Utc::now())).unwrap();
        save_store(&path, &forest).unwrap();

        let back = load_store(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.children("p"), ["c"]);
    }

    #[test]
    fn corrupt_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_store(&path).is_err());
    }
}
