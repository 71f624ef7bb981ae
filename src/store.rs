//! HDF5-backed session store for feature records.
//!
//! The dataset is a single `.h5` file holding every table ever recorded for
//! a deployment. Tables live under the fixed `/features` group, are named
//! `fset_<id>`, and are append-only chunked compound datasets with a
//! [`FeatureRecord`] row type.
//!
//! Table identifiers are kept in an explicit index built once at open by
//! scanning the group's member names; they are never re-derived from
//! display strings afterwards. The store assumes a single writer: one
//! acquisition process owns the file for the duration of a run.

use crate::error::{AcqResult, EmgError};
use crate::record::FeatureRecord;
use chrono::Local;
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Group};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Group under which all session tables are stored.
pub const FEATURES_GROUP: &str = "features";

/// Rows per HDF5 chunk for session tables.
const CHUNK_ROWS: usize = 64;

fn table_name(id: u32) -> String {
    format!("fset_{id}")
}

/// Recover the integer identifier from a `fset_<id>` dataset name.
fn parse_table_id(name: &str) -> Option<u32> {
    name.strip_prefix("fset_")?.parse().ok()
}

fn h5_string(value: &str) -> AcqResult<VarLenUnicode> {
    value
        .parse::<VarLenUnicode>()
        .map_err(|e| EmgError::Hdf5(hdf5::Error::from(e.to_string().as_str())))
}

/// The on-disk dataset: an ordered collection of session tables.
pub struct FeatureStore {
    file: File,
    path: PathBuf,
    // id -> dataset name, scanned once at open and kept consistent.
    tables: BTreeMap<u32, String>,
}

impl FeatureStore {
    /// Open an existing dataset for append, or create a new empty one.
    ///
    /// An existing file that is not a valid HDF5 container (zero-length
    /// included) is [`EmgError::StoreUnreadable`]; the store never repairs
    /// a broken file.
    pub fn open(path: impl AsRef<Path>) -> AcqResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = if path.exists() {
            info!(path = %path.display(), "opening existing dataset");
            File::open_rw(&path).map_err(|e| EmgError::StoreUnreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            info!(path = %path.display(), "dataset not found, creating new file");
            let file = File::create(&path)?;
            let group = file.create_group(FEATURES_GROUP)?;
            let created = Local::now().format("%d/%m/%Y, %H:%M:%S").to_string();
            group
                .new_attr::<VarLenUnicode>()
                .create("creation")?
                .write_scalar(&h5_string(&created)?)?;
            file
        };

        let group = Self::features_group(&file)?;
        let mut tables = BTreeMap::new();
        for name in group.member_names()? {
            if let Some(id) = parse_table_id(&name) {
                tables.insert(id, name);
            }
        }
        debug!(tables = tables.len(), "scanned table index");

        Ok(Self { file, path, tables })
    }

    fn features_group(file: &File) -> AcqResult<Group> {
        let group = if file.group(FEATURES_GROUP).is_ok() {
            file.group(FEATURES_GROUP)?
        } else {
            file.create_group(FEATURES_GROUP)?
        };
        Ok(group)
    }

    /// Path of the dataset file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers of every table in the dataset, ascending.
    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.keys().copied().collect()
    }

    /// The identifier a new session table should use: one greater than the
    /// maximum existing id, or 0 for an empty dataset. Never reuses an id,
    /// regardless of creation order of the existing tables.
    pub fn next_table_id(&self) -> u32 {
        self.tables.keys().next_back().map_or(0, |max| max + 1)
    }

    /// Create a new append-only session table.
    ///
    /// Fails with [`EmgError::TableAlreadyExists`] on identifier collision;
    /// a collision means the id index is wrong and must surface, not be
    /// silently renumbered.
    pub fn create_table(&mut self, id: u32, title: &str) -> AcqResult<SessionTable> {
        if self.tables.contains_key(&id) {
            return Err(EmgError::TableAlreadyExists(id));
        }

        let name = table_name(id);
        let group = Self::features_group(&self.file)?;
        let dataset = group
            .new_dataset::<FeatureRecord>()
            .chunk(CHUNK_ROWS)
            .shape(0..)
            .create(name.as_str())?;
        dataset
            .new_attr::<VarLenUnicode>()
            .create("TITLE")?
            .write_scalar(&h5_string(title)?)?;

        info!(table = %name, title, "created session table");
        self.tables.insert(id, name);

        Ok(SessionTable {
            id,
            dataset,
            file: self.file.clone(),
            buffer: Vec::new(),
        })
    }

    /// Number of rows currently stored in table `id`.
    pub fn row_count(&self, id: u32) -> AcqResult<usize> {
        let name = self.tables.get(&id).ok_or_else(|| {
            EmgError::Hdf5(hdf5::Error::from(format!("no table with id {id}").as_str()))
        })?;
        let dataset = Self::features_group(&self.file)?.dataset(name)?;
        Ok(dataset.shape()[0])
    }

    /// Read every complete record across all tables as one ordered
    /// sequence, tables in ascending id order, provenance discarded.
    ///
    /// This is the read interface consumed by classification and
    /// visualization; they operate on the union.
    pub fn read_all_records(&self) -> AcqResult<Vec<FeatureRecord>> {
        let group = Self::features_group(&self.file)?;
        let mut records = Vec::new();
        for name in self.tables.values() {
            let dataset = group.dataset(name)?;
            records.extend(dataset.read_raw::<FeatureRecord>()?);
        }
        Ok(records)
    }

    /// Flush all pending file buffers and release the file resource.
    ///
    /// Dropping the store also releases the file; `close` exists so callers
    /// can surface the final flush error instead of losing it in drop.
    pub fn close(self) -> AcqResult<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// One append-only table, created per acquisition session.
///
/// Appends are buffered in memory; nothing is durable until
/// [`flush`](Self::flush). The acquisition loop flushes at least once per
/// gesture, bounding loss on failure to one gesture's worth of buffered
/// records.
pub struct SessionTable {
    id: u32,
    dataset: Dataset,
    file: File,
    buffer: Vec<FeatureRecord>,
}

impl SessionTable {
    /// Identifier of this table within the dataset.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of records appended but not yet flushed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffer one record for storage. Amortized O(1); durability comes
    /// from [`flush`](Self::flush).
    pub fn append(&mut self, record: FeatureRecord) {
        self.buffer.push(record);
    }

    /// Write all buffered records to the dataset and flush the file.
    ///
    /// Records land in append order at the end of the table. Returns the
    /// number of records written.
    pub fn flush(&mut self) -> AcqResult<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let start = self.dataset.shape()[0];
        let end = start + self.buffer.len();
        self.dataset.resize(end)?;
        self.dataset.write_slice(self.buffer.as_slice(), start..end)?;
        self.file.flush()?;

        let written = self.buffer.len();
        debug!(table = self.id, written, total = end, "flushed records");
        self.buffer.clear();
        Ok(written)
    }
}
