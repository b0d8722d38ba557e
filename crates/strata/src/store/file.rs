//! Directory-backed structure store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, error, info, warn};

use strata_core::model::Diagram;

use super::{StoreError, StructureRecord, StructureStore, StructureSummary, validate_id};

const RECORD_EXTENSION: &str = "json";

/// Stores each structure as `<id>.json` inside a directory.
///
/// Each write goes to its own temporary file in the store directory and is
/// persisted over the record, so readers never see a partial record and
/// concurrent saves of one id resolve to the last write.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| io_error(&root, err))?;
        debug!(root:? = root; "File store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.root.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    fn read_record(path: &Path) -> Result<StructureRecord, StoreError> {
        let content = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl StructureStore for FileStore {
    fn list(&self) -> Result<Vec<StructureSummary>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|err| io_error(&self.root, err))?;

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| io_error(&self.root, err))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) => summaries.push(record.summary()),
                Err(err) => warn!(path:? = path, err:err; "Skipping unreadable structure record"),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn load(&self, id: &str) -> Result<Option<StructureRecord>, StoreError> {
        let path = self.record_path(id)?;
        if !path.exists() {
            debug!(id; "Structure not found");
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn save(&self, id: &str, name: &str, data: &Diagram) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        let record = StructureRecord {
            id: id.to_string(),
            name: name.to_string(),
            data: data.clone(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&record)?;

        let mut staging =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|err| io_error(&self.root, err))?;
        staging
            .write_all(content.as_bytes())
            .map_err(|err| io_error(staging.path(), err))?;
        staging
            .persist(&path)
            .map_err(|err| io_error(&path, err.error))?;

        info!(id, name; "Structure saved");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id; "Structure deleted");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    error!(path:? = path, err:err = source; "Structure store I/O failure");
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread, time::Duration};

    use strata_core::{
        geometry::Point,
        model::{EntityType, RelationshipType},
        shape::EntityShape,
    };

    use super::*;

    fn sample_diagram() -> Diagram {
        let mut diagram = Diagram::new();
        let a = diagram
            .add_entity_at(EntityType::Individual, EntityShape::Circle, Point::new(10.0, 10.0))
            .id()
            .to_string();
        let b = diagram
            .add_entity_at(EntityType::Spv, EntityShape::Rectangle, Point::new(10.0, 200.0))
            .id()
            .to_string();
        diagram.add_relationship(&a, &b, RelationshipType::Equity, "Equity", Default::default());
        diagram
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let diagram = sample_diagram();

        store.save("s1", "Demo", &diagram).unwrap();
        let record = store.load("s1").unwrap().unwrap();

        assert_eq!(record.id, "s1");
        assert_eq!(record.name, "Demo");
        assert_eq!(record.data, diagram);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(store.load("nothing-here").unwrap().is_none());
    }

    #[test]
    fn test_save_is_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save("s1", "First", &Diagram::new()).unwrap();
        store.save("s1", "Second", &sample_diagram()).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Second");
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.save("older", "Older", &Diagram::new()).unwrap();
        thread::sleep(Duration::from_millis(5));
        store.save("newer", "Newer", &Diagram::new()).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["newer", "older"]);
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        store.save("s1", "Demo", &Diagram::new()).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "s1");
    }

    #[test]
    fn test_concurrent_saves_of_one_id() {
        const WRITERS: usize = 4;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let diagram = sample_diagram();

        for _ in 0..50 {
            let barrier = Barrier::new(WRITERS);
            thread::scope(|scope| {
                let handles: Vec<_> = (0..WRITERS)
                    .map(|writer| {
                        let (store, diagram, barrier) = (&store, &diagram, &barrier);
                        scope.spawn(move || {
                            barrier.wait();
                            store.save("s1", &format!("Writer {writer}"), diagram)
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }
            });
        }

        let record = store.load("s1").unwrap().unwrap();
        assert!(record.name.starts_with("Writer "));
        assert_eq!(record.data, diagram);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "s1.json")
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.save("s1", "Demo", &Diagram::new()).unwrap();

        store.delete("s1").unwrap();
        store.delete("s1").unwrap();

        assert!(store.load("s1").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let err = store.save("../escape", "Bad", &Diagram::new()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = FileStore::open(&nested).unwrap();
        assert!(store.root().is_dir());
    }
}
