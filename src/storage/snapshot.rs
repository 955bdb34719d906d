// Diagnostic dump of the last extraction; nothing reads it back.
use crate::model::{RawRecord, StorageError};
use crate::storage::to_pretty_json;
use std::fs;
use std::path::Path;

pub fn save_snapshot(path: &Path, records: &[RawRecord]) -> Result<(), StorageError> {
    let bytes = to_pretty_json(records)?;
    fs::write(path, bytes).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_array_of_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extracted_text_parts.json");
        let records = vec![RawRecord {
            title: "Catering Ausschreibung Schule".into(),
            date: String::new(),
            link: "XYZ".into(),
        }];

        save_snapshot(&path, &records).unwrap();
        save_snapshot(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let back: Vec<RawRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records);
    }
}
