//! Per-module JSON record files.
//!
//! Each module is stored as `<dir>/<module name>.json`, pretty-printed with
//! two-space indentation. Files are plainly overwritten; there is no
//! temp-file swap.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::types::{MaterialsResult, ModuleRecord};

/// What happened when a record was handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The record was written to this path.
    Written(PathBuf),
    /// The record held only its year marker and was not written.
    Discarded,
}

/// Directory of module record files.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a module. The name is used verbatim as the file stem.
    pub fn path_for(&self, module_name: &str) -> PathBuf {
        self.dir.join(format!("{module_name}.json"))
    }

    /// Write the record unless it is empty, creating the directory on demand.
    pub fn persist(&self, module_name: &str, record: &ModuleRecord) -> MaterialsResult<PersistOutcome> {
        if record.is_empty() {
            return Ok(PersistOutcome::Discarded);
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(module_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        write_record_to(record, &mut writer)?;
        writer.flush()?;

        Ok(PersistOutcome::Written(path))
    }

    /// Read a previously written module record.
    pub fn load(&self, module_name: &str) -> MaterialsResult<ModuleRecord> {
        read_record_from_file(&self.path_for(module_name))
    }
}

/// Serialize a record as pretty JSON (two-space indent) to any writer.
pub fn write_record_to<W: Write>(record: &ModuleRecord, writer: &mut W) -> MaterialsResult<()> {
    serde_json::to_writer_pretty(writer, record)?;
    Ok(())
}

/// Read a record from any reader.
pub fn read_record_from<R: Read>(reader: R) -> MaterialsResult<ModuleRecord> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read a record from a file path.
pub fn read_record_from_file(path: &Path) -> MaterialsResult<ModuleRecord> {
    let file = File::open(path)?;
    read_record_from(BufReader::new(file))
}
