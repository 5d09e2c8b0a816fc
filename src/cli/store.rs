// JSON-file certificate store
//
// The reference record layer for the CLI. The engine itself has no knowledge
// of this module; it only sees the CertificateStore trait.

use crate::error::{CertError, Result};
use crate::import::{CertificateRecord, CertificateStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, CertificateRecord>>,
}

impl JsonFileStore {
    /// Open a store file, creating an empty store if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                let list: Vec<CertificateRecord> = serde_json::from_str(&contents)?;
                list.into_iter().map(|r| (r.name.clone(), r)).collect()
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// All records, name order.
    pub fn records(&self) -> Vec<CertificateRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    fn persist(&self, records: &BTreeMap<String, CertificateRecord>) -> Result<()> {
        let list: Vec<&CertificateRecord> = records.values().collect();
        let contents = serde_json::to_string_pretty(&list)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[async_trait]
impl CertificateStore for JsonFileStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<CertificateRecord>> {
        Ok(self.records.lock().unwrap().get(name).cloned())
    }

    async fn create(&self, record: CertificateRecord) -> Result<CertificateRecord> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.name) {
            return Err(CertError::Store(format!(
                "record '{}' already exists",
                record.name
            )));
        }
        records.insert(record.name.clone(), record.clone());
        self.persist(&records)?;
        Ok(record)
    }

    async fn update(&self, record: CertificateRecord) -> Result<CertificateRecord> {
        let mut records = self.records.lock().unwrap();
        if !records.contains_key(&record.name) {
            return Err(CertError::Store(format!(
                "record '{}' not found",
                record.name
            )));
        }
        records.insert(record.name.clone(), record.clone());
        self.persist(&records)?;
        Ok(record)
    }
}
