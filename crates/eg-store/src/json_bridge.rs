use std::fs;
use std::path::Path;

use eg_core::{GraphDatabase, MatrixKind, export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Import a JSON document (any supported version) into this store,
    /// replacing its contents. Returns the imported database.
    pub fn import_json_file(&self, path: &Path, kind: MatrixKind) -> Result<GraphDatabase> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json, kind)
    }

    /// Import a JSON string. The document's matrix kind must match `kind`.
    pub fn import_json_str(&self, json: &str, kind: MatrixKind) -> Result<GraphDatabase> {
        let db =
            import_json(json).map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        if db.kind() != kind {
            return Err(StoreError::InvalidData(format!(
                "document holds a {} database, expected {kind}",
                db.kind()
            )));
        }
        self.save_database(&db)?;
        Ok(db)
    }

    pub fn export_json_file(&self, path: &Path, kind: MatrixKind) -> Result<()> {
        let json = self.export_json_string(kind)?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    pub fn export_json_string(&self, kind: MatrixKind) -> Result<String> {
        let db = self.load_database(kind)?;
        export_json(&db).map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eg_core::families;
    use eg_core::{CURRENT_VERSION, Classifier, canonical_hash};

    fn seeded(kind: MatrixKind) -> GraphDatabase {
        let mut db = GraphDatabase::new(kind);
        db.seed_known_families(5, &Classifier::default());
        db
    }

    #[test]
    fn test_import_export_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let original = seeded(MatrixKind::Skew);

        let json = export_json(&original).unwrap();
        store.import_json_str(&json, MatrixKind::Skew).unwrap();

        let exported = store.export_json_string(MatrixKind::Skew).unwrap();
        assert_eq!(import_json(&exported).unwrap(), original);
    }

    #[test]
    fn test_export_wire_layout() {
        let store = Store::open_in_memory().unwrap();
        store.save_database(&seeded(MatrixKind::Symmetric)).unwrap();
        let exported = store.export_json_string(MatrixKind::Symmetric).unwrap();

        let wire: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(wire["version"], CURRENT_VERSION);
        assert_eq!(wire["matrixKind"], "symmetric");
        assert!(wire["perN"]["4"]["analyticEntries"].is_array());
        assert!(wire["seedFamilies"].is_array());
    }

    #[test]
    fn test_import_v1_document() {
        let json = r#"{
            "version": 1,
            "matrixKind": "skew",
            "perN": {
                "3": {
                    "analyticEntries": [{
                        "edges": [[1, 2], [0, 1]],
                        "eigenvalues": [-1.4142135623730951, 0.0, 1.4142135623730951],
                        "analytic": true,
                        "method": "algebraic"
                    }]
                }
            }
        }"#;

        let store = Store::open_in_memory().unwrap();
        store.import_json_str(json, MatrixKind::Skew).unwrap();

        let db = store.load_database(MatrixKind::Skew).unwrap();
        let entry = db.entry(3, &canonical_hash(&families::path(3))).unwrap();
        assert!(entry.analytic);
        assert_eq!(entry.eigenvalues.len(), 3);
    }

    #[test]
    fn test_import_rejects_wrong_kind() {
        let store = Store::open_in_memory().unwrap();
        let json = export_json(&seeded(MatrixKind::Symmetric)).unwrap();
        assert!(store.import_json_str(&json, MatrixKind::Skew).is_err());
        assert_eq!(store.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_import_export_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("graphs.json");

        let store = Store::open_in_memory().unwrap();
        let original = seeded(MatrixKind::Skew);
        store.save_database(&original).unwrap();
        store.export_json_file(&json_path, MatrixKind::Skew).unwrap();
        assert!(json_path.exists());

        let store2 = Store::open_in_memory().unwrap();
        store2.import_json_file(&json_path, MatrixKind::Skew).unwrap();
        assert_eq!(store2.load_database(MatrixKind::Skew).unwrap(), original);
    }

    #[test]
    fn test_import_invalid_json() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.import_json_str("not valid json", MatrixKind::Skew).is_err());
    }
}
