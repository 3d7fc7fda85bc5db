//! CSV files as tables.
//!
//! Empty cells read back as null. Writes go to a temporary file in the
//! target directory which is then renamed over the destination, so a reader
//! sees either the previous table or the new one.

use crate::error::{Result, StorageError};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use pantry_core::Table;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TableStore {
    data_dir: PathBuf,
}

impl TableStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn read(&self, name: &str) -> Result<Table> {
        read_table(self.path(name))
    }

    /// Like [`TableStore::read`], but a missing file is `None`.
    pub fn read_optional(&self, name: &str) -> Result<Option<Table>> {
        if !self.exists(name) {
            return Ok(None);
        }
        self.read(name).map(Some)
    }

    pub fn write(&self, name: &str, table: &Table) -> Result<()> {
        write_table(self.path(name), table)
    }
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }

    let now = Instant::now();
    let read_err = |source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
    let headers: Vec<String> = reader.headers().map_err(read_err)?.iter().map(str::to_string).collect();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let row = record
            .iter()
            .map(|cell| if cell.is_empty() { None } else { Some(cell.to_string()) })
            .collect();
        table.push_row(row)?;
    }

    debug!(
        path = %path.display(),
        rows = table.len(),
        elapsed_ms = now.elapsed().as_micros() as f64 / 1000.0,
        "Read table"
    );
    Ok(table)
}

pub fn write_table<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| -> std::result::Result<(), csv::Error> {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(table.headers())?;
            for row in table.rows() {
                writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
            }
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| StorageError::Write {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    info!(path = %path.display(), rows = table.len(), "Wrote table");
    Ok(())
}
