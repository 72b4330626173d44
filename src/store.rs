use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::note::NoteRecord;

/// Longest note filename kept inside a temp file name, so `.{name}.tmp`
/// still fits the usual 255-byte limit.
const TMP_STEM_MAX: usize = 240;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot decode note {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl StoreError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Flat-file note storage: one JSON document per note inside one directory.
#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Read and decode the note stored at `path`.
    pub fn load(&self, path: &Path) -> Result<NoteRecord, StoreError> {
        let file = fs::File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::io("cannot open note", path)(source)
            }
        })?;

        let record: NoteRecord =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(path = %path.display(), "loaded note");
        Ok(record)
    }

    /// Persist `record` under its sanitized filename and return that name.
    ///
    /// The new file is written first. Only then is `previous_file_name`
    /// removed, when it is non-empty and differs from the new name, so an
    /// interrupted save leaves two copies rather than none.
    pub fn save(&self, record: &NoteRecord, previous_file_name: &str) -> Result<String, StoreError> {
        fs::create_dir_all(&self.dir)
            .map_err(StoreError::io("cannot create notes directory", &self.dir))?;

        let file_name = record.file_name();
        let path = self.path_for(&file_name);
        self.write_atomically(&path, &file_name, record)?;

        if !previous_file_name.is_empty() && previous_file_name != file_name {
            let stale = self.path_for(previous_file_name);
            match fs::remove_file(&stale) {
                Ok(()) => {
                    tracing::info!(from = previous_file_name, to = %file_name, "renamed note");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(path = %stale.display(), "previous note file left behind: {e}");
                    return Err(StoreError::io("cannot remove previous note file", &stale)(e));
                }
            }
        }

        tracing::info!(path = %path.display(), "saved note");
        Ok(file_name)
    }

    fn write_atomically(
        &self,
        path: &Path,
        file_name: &str,
        record: &NoteRecord,
    ) -> Result<(), StoreError> {
        let stem = &file_name[..file_name.len().min(TMP_STEM_MAX)];
        let tmp = self.path_for(&format!(".{stem}.tmp"));

        let result = (|| -> io::Result<()> {
            let file = fs::File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();

        result.map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::io("cannot write note", path)(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn round_trip_preserves_name_and_body() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());

        for record in [
            NoteRecord::new("Groceries", "milk, eggs"),
            NoteRecord::new("Empty body", ""),
            NoteRecord::new("Multi line", "# Title\n\n- one\n- \"two\"\n"),
        ] {
            let file_name = store.save(&record, "").unwrap();
            let loaded = store.load(&store.path_for(&file_name)).unwrap();
            assert_eq!(loaded, record);
        }
    }

    #[test]
    fn writes_json_document_with_trailing_newline() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());

        let file_name = store.save(&NoteRecord::new("Groceries", "milk, eggs"), "").unwrap();
        assert_eq!(file_name, "Groceries");

        let raw = fs::read_to_string(dir.path().join("Groceries")).unwrap();
        assert_eq!(raw, "{\"Name\":\"Groceries\",\"Body\":\"milk, eggs\"}\n");
        assert_eq!(file_names(dir.path()), ["Groceries"]);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = NoteStore::new(&nested);

        store.save(&NoteRecord::new("x", "y"), "").unwrap();
        assert!(nested.join("x").is_file());
    }

    #[test]
    fn rename_on_save_removes_previous_file() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());
        store.save(&NoteRecord::new("Old Note", "x"), "").unwrap();

        let renamed = NoteRecord::new("New Note", "x");
        let file_name = store.save(&renamed, "Old_Note").unwrap();

        assert_eq!(file_name, "New_Note");
        assert_eq!(file_names(dir.path()), ["New_Note"]);
        assert_eq!(store.load(&dir.path().join("New_Note")).unwrap(), renamed);
    }

    #[test]
    fn same_name_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());
        store.save(&NoteRecord::new("Todo", "one"), "").unwrap();
        store.save(&NoteRecord::new("Todo", "two"), "Todo").unwrap();

        assert_eq!(file_names(dir.path()), ["Todo"]);
        assert_eq!(store.load(&dir.path().join("Todo")).unwrap().body, "two");
    }

    #[test]
    fn missing_previous_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());

        let file_name = store.save(&NoteRecord::new("Fresh", ""), "Gone").unwrap();
        assert_eq!(file_name, "Fresh");
    }

    #[cfg(unix)]
    #[test]
    fn failed_removal_keeps_both_copies() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());
        // A non-empty directory cannot be removed as a file.
        fs::create_dir(dir.path().join("Stuck")).unwrap();
        fs::write(dir.path().join("Stuck").join("inner"), "").unwrap();

        let err = store.save(&NoteRecord::new("Moved", "x"), "Stuck").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "{err:?}");
        assert!(err.to_string().contains("Stuck"));
        assert!(dir.path().join("Moved").is_file());
        assert!(dir.path().join("Stuck").exists());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());

        let err = store.load(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn load_malformed_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());
        fs::write(dir.path().join("junk"), "not json at all").unwrap();
        fs::write(dir.path().join("wrong_shape"), "{\"Title\": 3}").unwrap();

        for name in ["junk", "wrong_shape"] {
            let err = store.load(&dir.path().join(name)).unwrap_err();
            assert!(matches!(err, StoreError::Decode { .. }), "{name}: {err:?}");
        }
    }

    #[test]
    fn long_names_still_save() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path());
        let record = NoteRecord::new("n".repeat(400), "body");

        let file_name = store.save(&record, "").unwrap();
        assert_eq!(file_name.len(), 255);
        assert_eq!(file_names(dir.path()), [file_name]);
    }
}
