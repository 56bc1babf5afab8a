// * JSON-file record store
// * Loads once at open. Every mutation is applied to a copy, flushed (temp file + rename),
// * then swapped in, so a failed write leaves both the file and memory untouched.

use crate::persistence::schema::{CompetitorRecord, SchemaError};
use crate::metrics::window_start;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Export formats for the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

/// Store write errors. Reads never fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Rejected record for {company:?}: {errors:?}")]
    Invalid {
        company: String,
        errors: Vec<SchemaError>,
    },
}

/// Persistent collection of competitor records
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: RwLock<Vec<CompetitorRecord>>,
}

impl RecordStore {
    /// Opens the store at `path`. A missing or unreadable file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = load_records(&path);
        info!(path = %path.display(), records = records.len(), "Record store opened");

        Self {
            path,
            records: RwLock::new(records),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all records
    pub fn records(&self) -> Vec<CompetitorRecord> {
        self.read(|records| records.to_vec())
    }

    pub fn len(&self) -> usize {
        self.read(|records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn by_company(&self, company: &str) -> Vec<CompetitorRecord> {
        self.filtered(|r| r.company == company)
    }

    pub fn by_category(&self, category: &str) -> Vec<CompetitorRecord> {
        self.filtered(|r| r.category == category)
    }

    /// Records updated within `days` of `now`
    pub fn recent(&self, days: i64, now: DateTime<Utc>) -> Vec<CompetitorRecord> {
        let cutoff = window_start(now, days);
        self.filtered(|r| r.last_updated >= cutoff)
    }

    /// Distinct company names with their first source URL and category, first-seen order
    pub fn companies(&self) -> Vec<(String, String, String)> {
        self.read(|records| {
            let mut seen: Vec<(String, String, String)> = Vec::new();
            for r in records {
                if !seen.iter().any(|(c, _, _)| *c == r.company) {
                    seen.push((r.company.clone(), r.source_url.clone(), r.category.clone()));
                }
            }
            seen
        })
    }

    /// Appends records and persists. Nothing is written if any record is invalid.
    pub fn append(&self, new_records: Vec<CompetitorRecord>) -> Result<usize, StoreError> {
        check_records(&new_records)?;
        let added = new_records.len();
        self.mutate(|records| records.extend(new_records))?;
        debug!(added = added, "Records appended");
        Ok(added)
    }

    /// Drops every record of `company`, then appends `new_records`
    pub fn replace_company(
        &self,
        company: &str,
        new_records: Vec<CompetitorRecord>,
    ) -> Result<usize, StoreError> {
        check_records(&new_records)?;
        let added = new_records.len();
        self.mutate(|records| {
            records.retain(|r| r.company != company);
            records.extend(new_records);
        })?;
        debug!(company = company, added = added, "Company records replaced");
        Ok(added)
    }

    /// Removes a company. Returns false when it had no records.
    pub fn remove_company(&self, company: &str) -> Result<bool, StoreError> {
        if !self.read(|records| records.iter().any(|r| r.company == company)) {
            return Ok(false);
        }
        self.mutate(|records| records.retain(|r| r.company != company))?;
        info!(company = company, "Company removed");
        Ok(true)
    }

    /// Empties the store and deletes the backing file
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }
        guard.clear();
        info!(path = %self.path.display(), "Record store cleared");
        Ok(())
    }

    /// Serializes the collection, `None` when empty
    pub fn export(&self, format: ExportFormat) -> Option<String> {
        self.read(|records| {
            if records.is_empty() {
                return None;
            }
            match format {
                ExportFormat::Json => serde_json::to_string_pretty(records).ok(),
                ExportFormat::Csv => Some(to_csv(records)),
            }
        })
    }

    fn read<T>(&self, f: impl FnOnce(&[CompetitorRecord]) -> T) -> T {
        let guard = self.records.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn filtered(&self, pred: impl Fn(&CompetitorRecord) -> bool) -> Vec<CompetitorRecord> {
        self.read(|records| records.iter().filter(|r| pred(r)).cloned().collect())
    }

    // * copy -> flush -> swap, holding the write lock throughout
    fn mutate(&self, f: impl FnOnce(&mut Vec<CompetitorRecord>)) -> Result<(), StoreError> {
        let mut guard = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        f(&mut next);
        self.flush(&next)?;
        *guard = next;
        Ok(())
    }

    fn flush(&self, records: &[CompetitorRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp = temp_path(&self.path);
        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), records = records.len(), "Record store flushed");
        Ok(())
    }
}

// * Price and identity invariants must hold before anything reaches disk
fn check_records(records: &[CompetitorRecord]) -> Result<(), StoreError> {
    for record in records {
        let errors = record.validate();
        if !errors.is_empty() {
            warn!(company = %record.company, errors = ?errors, "Record rejected");
            return Err(StoreError::Invalid {
                company: record.company.clone(),
                errors,
            });
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn load_records(path: &Path) -> Vec<CompetitorRecord> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read record store, starting empty");
            return Vec::new();
        }
    };

    if text.trim().is_empty() {
        return Vec::new();
    }

    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Could not parse record store, starting empty");
        Vec::new()
    })
}

const CSV_HEADERS: [&str; 10] = [
    "company",
    "source_url",
    "category",
    "price",
    "product_name",
    "content",
    "title",
    "description",
    "summary",
    "last_updated",
];

fn csv_cell(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn to_csv(records: &[CompetitorRecord]) -> String {
    let mut out = CSV_HEADERS.join(",");
    out.push('\n');

    for r in records {
        let row = [
            csv_cell(&r.company),
            csv_cell(&r.source_url),
            csv_cell(&r.category),
            r.price.map(|p| p.to_string()).unwrap_or_default(),
            csv_cell(&r.product_name),
            csv_cell(&r.content),
            csv_cell(r.title.as_deref().unwrap_or("")),
            csv_cell(r.description.as_deref().unwrap_or("")),
            csv_cell(r.summary.as_deref().unwrap_or("")),
            r.last_updated.to_rfc3339(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn rec(company: &str, product: &str, price: Option<f64>) -> CompetitorRecord {
        CompetitorRecord::builder(company, format!("https://{}.example.com", company.to_lowercase()))
            .product_name(product)
            .price(price)
            .category("SaaS")
            .content("Page text, with a comma")
            .last_updated(Utc.with_ymd_and_hms(2024, 4, 2, 8, 30, 0).unwrap())
            .build()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("none.json"));
        assert!(store.is_empty());
        assert!(store.export(ExportFormat::Csv).is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{not json").unwrap();

        let store = RecordStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let records = vec![rec("Acme", "Acme Cloud", Some(49.0)), rec("Beta", "Beta Service", None)];

        let store = RecordStore::open(&path);
        store.append(records.clone()).unwrap();

        let reopened = RecordStore::open(&path);
        assert_eq!(reopened.records(), records);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_replace_and_remove() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.json"));
        store
            .append(vec![rec("Acme", "Old A", None), rec("Acme", "Old B", None), rec("Beta", "B", None)])
            .unwrap();

        store.replace_company("Acme", vec![rec("Acme", "New", Some(10.0))]).unwrap();
        let acme = store.by_company("Acme");
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].product_name, "New");
        assert_eq!(store.len(), 2);

        assert!(store.remove_company("Beta").unwrap());
        assert!(!store.remove_company("Beta").unwrap());
        assert_eq!(store.companies().len(), 1);
    }

    #[test]
    fn test_clear_deletes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = RecordStore::open(&path);
        store.append(vec![rec("Acme", "A", None)]).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!path.exists());
        // * Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_recent_and_category() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.json"));
        let mut old = rec("Old", "O", None);
        old.last_updated = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        old.category = "Fintech".into();
        store.append(vec![old, rec("New", "N", None)]).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        let recent = store.recent(7, now);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].company, "New");
        assert_eq!(store.by_category("Fintech").len(), 1);
    }

    #[test]
    fn test_csv_export_quotes_fields() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.json"));
        store.append(vec![rec("Acme", "Acme \"Pro\"", Some(49.5))]).unwrap();

        let csv = store.export(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Acme,https://acme.example.com,SaaS,49.5,\"Acme \"\"Pro\"\"\","));
        assert!(row.contains("\"Page text, with a comma\""));
        assert!(row.ends_with("2024-04-02T08:30:00+00:00"));
    }

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.json"));
        store.append(vec![rec("Acme", "A", Some(1.0))]).unwrap();

        let json = store.export(ExportFormat::Json).unwrap();
        let parsed: Vec<CompetitorRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_invalid_prices_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let store = RecordStore::open(&path);

        let result = store.append(vec![rec("Acme", "A", Some(10.0)), rec("Nan", "N", Some(f64::NAN))]);
        assert!(matches!(
            result,
            Err(StoreError::Invalid { ref company, ref errors })
                if company == "Nan" && matches!(errors[0], SchemaError::InvalidPrice(_))
        ));

        let result = store.replace_company("Acme", vec![rec("Acme", "A", Some(5_000_000.0))]);
        assert!(matches!(
            result,
            Err(StoreError::Invalid { ref errors, .. })
                if errors == &vec![SchemaError::PriceTooHigh(5_000_000.0)]
        ));

        // * Nothing was written, not even the valid record of the rejected batch
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_recent_with_huge_window() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.json"));
        store.append(vec![rec("Acme", "A", None)]).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 4, 5, 0, 0, 0).unwrap();
        assert_eq!(store.recent(100_000_000, now).len(), 1);
        assert_eq!(store.recent(i64::MAX, now).len(), 1);
        assert!(store.recent(-100_000_000, now).is_empty());
    }
}
