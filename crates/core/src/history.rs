//! Durable, ordered log of visited addresses.
//!
//! The backing file is JSON lines: every mutation appends one tagged
//! operation, and opening the store replays them. Indices are handed out by
//! the store and never reused, even after the newest entry was deleted,
//! because the high-water mark survives in the log (`seal` lines after a
//! compaction, `visit` lines otherwise).

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    ops::Bound,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Local};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "entry_index")]
    pub index: i32,
    pub address: String,
    pub visited_at: DateTime<Local>,
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("no history entry with index {0}")]
    NotFound(i32),
    #[error("refusing to store an empty address")]
    EmptyAddress,
    #[error("history index space exhausted")]
    Exhausted,
    #[error("storage io on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("history store lock poisoned")]
    Poisoned,
    #[error("no data directory available for the history file")]
    NoDataDir,
}

impl HistoryError {
    /// Everything except a missed point lookup means the medium misbehaved.
    pub fn is_storage(&self) -> bool {
        !matches!(self, HistoryError::NotFound(_))
    }

    fn io(path: &Path, source: io::Error) -> Self {
        HistoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The slice of the store the line editor needs: append on commit, neighbour
/// lookups for recall, prefix search for completion.
pub trait HistoryLog {
    fn add(&self, address: &str, visited_at: DateTime<Local>) -> Result<i32, HistoryError>;
    /// Newest live record with an index strictly below `before`, or the newest
    /// record overall when `before` is `None`.
    fn record_before(&self, before: Option<i32>) -> Result<Option<HistoryRecord>, HistoryError>;
    /// Oldest live record with an index strictly above `after`.
    fn record_after(&self, after: i32) -> Result<Option<HistoryRecord>, HistoryError>;
    fn match_prefix(&self, prefix: &str) -> Result<Vec<String>, HistoryError>;
}

impl<T: HistoryLog + ?Sized> HistoryLog for &T {
    fn add(&self, address: &str, visited_at: DateTime<Local>) -> Result<i32, HistoryError> {
        (**self).add(address, visited_at)
    }
    fn record_before(&self, before: Option<i32>) -> Result<Option<HistoryRecord>, HistoryError> {
        (**self).record_before(before)
    }
    fn record_after(&self, after: i32) -> Result<Option<HistoryRecord>, HistoryError> {
        (**self).record_after(after)
    }
    fn match_prefix(&self, prefix: &str) -> Result<Vec<String>, HistoryError> {
        (**self).match_prefix(prefix)
    }
}

impl<T: HistoryLog + ?Sized> HistoryLog for Arc<T> {
    fn add(&self, address: &str, visited_at: DateTime<Local>) -> Result<i32, HistoryError> {
        (**self).add(address, visited_at)
    }
    fn record_before(&self, before: Option<i32>) -> Result<Option<HistoryRecord>, HistoryError> {
        (**self).record_before(before)
    }
    fn record_after(&self, after: i32) -> Result<Option<HistoryRecord>, HistoryError> {
        (**self).record_after(after)
    }
    fn match_prefix(&self, prefix: &str) -> Result<Vec<String>, HistoryError> {
        (**self).match_prefix(prefix)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogEntry {
    Seal { next_index: i64 },
    Visit(HistoryRecord),
    Forget { entry_index: i32 },
}

struct LogFile {
    path: PathBuf,
    file: File,
    // A failed append may have left a partial line behind.
    torn_tail: bool,
}

impl LogFile {
    fn open(path: &Path) -> Result<Self, HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| HistoryError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            torn_tail: false,
        })
    }

    fn append(&mut self, entry: &LogEntry) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        if self.torn_tail {
            line.insert(0, '\n');
        }
        let res = self
            .file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data());
        match res {
            Ok(()) => {
                self.torn_tail = false;
                Ok(())
            }
            Err(e) => {
                self.torn_tail = true;
                Err(HistoryError::io(&self.path, e))
            }
        }
    }

    /// Atomically replaces the log with a seal line followed by `records`.
    fn rewrite<'a>(
        &mut self,
        next_index: i64,
        records: impl Iterator<Item = &'a HistoryRecord>,
    ) -> Result<(), HistoryError> {
        let mut tmp = self.path.clone();
        tmp.set_extension("jsonl.tmp");
        {
            let mut f = File::create(&tmp).map_err(|e| HistoryError::io(&tmp, e))?;
            let mut data = serde_json::to_string(&LogEntry::Seal { next_index })?;
            data.push('\n');
            for r in records {
                data.push_str(&serde_json::to_string(&LogEntry::Visit(r.clone()))?);
                data.push('\n');
            }
            f.write_all(data.as_bytes())
                .and_then(|_| f.sync_all())
                .map_err(|e| HistoryError::io(&tmp, e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| HistoryError::io(&self.path, e))?;
        *self = LogFile::open(&self.path)?;
        Ok(())
    }
}

#[derive(Default)]
struct Inner {
    log: Option<LogFile>,
    records: BTreeMap<i32, HistoryRecord>,
    next_index: i64,
    tombstones: usize,
}

impl Inner {
    fn apply(&mut self, entry: LogEntry) {
        match entry {
            LogEntry::Seal { next_index } => {
                self.next_index = self.next_index.max(next_index);
            }
            LogEntry::Visit(record) => {
                self.next_index = self.next_index.max(i64::from(record.index) + 1);
                self.records.insert(record.index, record);
            }
            LogEntry::Forget { entry_index } => {
                self.records.remove(&entry_index);
                self.tombstones += 1;
            }
        }
    }

    fn compact(&mut self) -> Result<(), HistoryError> {
        if let Some(log) = self.log.as_mut() {
            log.rewrite(self.next_index, self.records.values())?;
        }
        self.tombstones = 0;
        Ok(())
    }
}

/// Process-wide history handle. Every operation takes the same lock, reads
/// included, so no two operations ever interleave.
pub struct HistoryStore {
    inner: Mutex<Inner>,
}

impl HistoryStore {
    /// Opens (creating if needed) the log at `path` and replays it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HistoryError::io(parent, e))?;
        }
        let mut inner = Inner::default();
        let data = match fs::read(path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(HistoryError::io(path, e)),
        };
        for (n, line) in data.split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<LogEntry>(line) {
                Ok(entry) => inner.apply(entry),
                Err(e) => {
                    warn!(target: "history", line = n + 1, error = %e, "skipping unreadable history line")
                }
            }
        }
        let mut log = LogFile::open(path)?;
        log.torn_tail = data.last().is_some_and(|b| *b != b'\n');
        inner.log = Some(log);
        if inner.tombstones > inner.records.len() {
            debug!(target: "history", tombstones = inner.tombstones, "compacting history log");
            inner.compact()?;
        }
        info!(target: "history", path = %path.display(), entries = inner.records.len(), "opened history");
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    /// Opens the log in the platform data directory.
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = default_path().ok_or(HistoryError::NoDataDir)?;
        Self::open(path)
    }

    /// A store that lives only as long as the process; used for incognito
    /// sessions and when the persistent store cannot be opened.
    pub fn ephemeral() -> Self {
        debug!(target: "history", "using ephemeral history");
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, HistoryError> {
        self.inner.lock().map_err(|_| HistoryError::Poisoned)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().ok()?.log.as_ref().map(|l| l.path.clone())
    }

    pub fn is_persistent(&self) -> bool {
        self.lock().map(|g| g.log.is_some()).unwrap_or(false)
    }

    /// Appends a record and returns the index assigned to it. Memory is only
    /// updated after the line reached the disk.
    pub fn add(&self, address: &str, visited_at: DateTime<Local>) -> Result<i32, HistoryError> {
        if address.is_empty() {
            return Err(HistoryError::EmptyAddress);
        }
        let mut inner = self.lock()?;
        let index = i32::try_from(inner.next_index).map_err(|_| HistoryError::Exhausted)?;
        let record = HistoryRecord {
            index,
            address: address.to_string(),
            visited_at,
        };
        inner.next_index = i64::from(index) + 1;
        // The index is spent even if the append fails: part of the line, or
        // all of it, may already be on disk.
        if let Some(log) = inner.log.as_mut() {
            log.append(&LogEntry::Visit(record.clone()))?;
        }
        inner.records.insert(index, record);
        debug!(target: "history", index, "added history entry");
        Ok(index)
    }

    pub fn get(&self, index: i32) -> Result<HistoryRecord, HistoryError> {
        let inner = self.lock()?;
        inner
            .records
            .get(&index)
            .cloned()
            .ok_or(HistoryError::NotFound(index))
    }

    /// All live records, ascending by index.
    pub fn get_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let inner = self.lock()?;
        Ok(inner.records.values().cloned().collect())
    }

    pub fn count(&self) -> Result<i32, HistoryError> {
        let inner = self.lock()?;
        i32::try_from(inner.records.len()).map_err(|_| HistoryError::Exhausted)
    }

    /// Removes one record. Deleting an index that does not exist is a no-op.
    pub fn delete(&self, index: i32) -> Result<(), HistoryError> {
        let mut inner = self.lock()?;
        if !inner.records.contains_key(&index) {
            debug!(target: "history", index, "delete of absent entry ignored");
            return Ok(());
        }
        if let Some(log) = inner.log.as_mut() {
            log.append(&LogEntry::Forget { entry_index: index })?;
        }
        inner.records.remove(&index);
        inner.tombstones += 1;
        debug!(target: "history", index, "deleted history entry");
        Ok(())
    }

    pub fn delete_all(&self) -> Result<(), HistoryError> {
        let mut inner = self.lock()?;
        let next_index = inner.next_index;
        if let Some(log) = inner.log.as_mut() {
            log.rewrite(next_index, std::iter::empty())?;
        }
        inner.records.clear();
        inner.tombstones = 0;
        debug!(target: "history", "cleared history");
        Ok(())
    }

    /// Addresses starting with `prefix`, in index order.
    pub fn match_prefix(&self, prefix: &str) -> Result<Vec<String>, HistoryError> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .values()
            .filter(|r| r.address.starts_with(prefix))
            .map(|r| r.address.clone())
            .collect())
    }

    pub fn record_before(&self, before: Option<i32>) -> Result<Option<HistoryRecord>, HistoryError> {
        let inner = self.lock()?;
        let found = match before {
            None => inner.records.values().next_back(),
            Some(b) => inner.records.range(..b).next_back().map(|(_, r)| r),
        };
        Ok(found.cloned())
    }

    pub fn record_after(&self, after: i32) -> Result<Option<HistoryRecord>, HistoryError> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .range((Bound::Excluded(after), Bound::Unbounded))
            .next()
            .map(|(_, r)| r.clone()))
    }

    /// Rewrites the log without tombstones.
    pub fn compact(&self) -> Result<(), HistoryError> {
        self.lock()?.compact()
    }

    pub fn flush(&self) -> Result<(), HistoryError> {
        let inner = self.lock()?;
        if let Some(log) = inner.log.as_ref() {
            log.file
                .sync_all()
                .map_err(|e| HistoryError::io(&log.path, e))?;
        }
        Ok(())
    }

    pub fn close(self) -> Result<(), HistoryError> {
        self.flush()?;
        debug!(target: "history", "closed history");
        Ok(())
    }
}

impl HistoryLog for HistoryStore {
    fn add(&self, address: &str, visited_at: DateTime<Local>) -> Result<i32, HistoryError> {
        HistoryStore::add(self, address, visited_at)
    }
    fn record_before(&self, before: Option<i32>) -> Result<Option<HistoryRecord>, HistoryError> {
        HistoryStore::record_before(self, before)
    }
    fn record_after(&self, after: i32) -> Result<Option<HistoryRecord>, HistoryError> {
        HistoryStore::record_after(self, after)
    }
    fn match_prefix(&self, prefix: &str) -> Result<Vec<String>, HistoryError> {
        HistoryStore::match_prefix(self, prefix)
    }
}

pub fn default_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join("webline").join("history.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Local> {
        DateTime::from_timestamp(secs, 0).unwrap().with_timezone(&Local)
    }

    #[test]
    fn add_get_delete_scenario() {
        let store = HistoryStore::ephemeral();
        store.add("http://example.com", at(1)).unwrap();
        store.add("http://example.org", at(2)).unwrap();
        assert_eq!(store.count().unwrap(), 2);

        let first = store.get(0).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.address, "http://example.com");
        assert_eq!(
            store.match_prefix("http://example.").unwrap(),
            vec!["http://example.com", "http://example.org"]
        );

        store.delete(0).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(matches!(store.get(0), Err(HistoryError::NotFound(0))));
    }

    #[test]
    fn get_all_is_ordered_and_matches_count() {
        let store = HistoryStore::ephemeral();
        assert!(store.get_all().unwrap().is_empty());
        for i in 0..5 {
            store.add(&format!("site{i}.net"), at(i)).unwrap();
        }
        let all = store.get_all().unwrap();
        assert_eq!(all.len() as i32, store.count().unwrap());
        assert!(all.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn deleting_absent_index_is_noop() {
        let store = HistoryStore::ephemeral();
        store.add("a.com", at(1)).unwrap();
        store.delete(42).unwrap();
        store.delete(0).unwrap();
        store.delete(0).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn indices_are_not_reused_after_delete() {
        let store = HistoryStore::ephemeral();
        store.add("a.com", at(1)).unwrap();
        store.add("b.com", at(2)).unwrap();
        store.delete(1).unwrap();
        assert_eq!(store.add("c.com", at(3)).unwrap(), 2);
        assert_eq!(store.get(0).unwrap().address, "a.com");
    }

    #[test]
    fn delete_all_empties_store() {
        let store = HistoryStore::ephemeral();
        store.add("a.com", at(1)).unwrap();
        store.add("b.com", at(2)).unwrap();
        store.delete_all().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get_all().unwrap().is_empty());
        assert_eq!(store.add("c.com", at(3)).unwrap(), 2);
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let store = HistoryStore::ephemeral();
        store.add("a.com", at(1)).unwrap();
        store.add("b.com", at(2)).unwrap();
        assert_eq!(store.match_prefix("").unwrap().len(), 2);
        assert!(store.match_prefix("zzz").unwrap().is_empty());
    }

    #[test]
    fn empty_address_is_rejected() {
        let store = HistoryStore::ephemeral();
        assert!(matches!(store.add("", at(1)), Err(HistoryError::EmptyAddress)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn neighbour_lookups_skip_deleted_entries() {
        let store = HistoryStore::ephemeral();
        for a in ["a.com", "b.com", "c.com", "d.com"] {
            store.add(a, at(0)).unwrap();
        }
        store.delete(2).unwrap();
        assert_eq!(store.record_before(None).unwrap().unwrap().index, 3);
        assert_eq!(store.record_before(Some(3)).unwrap().unwrap().index, 1);
        assert!(store.record_before(Some(0)).unwrap().is_none());
        assert_eq!(store.record_after(1).unwrap().unwrap().index, 3);
        assert!(store.record_after(3).unwrap().is_none());
    }

    #[test]
    fn failed_append_does_not_hand_out_its_index_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let store = HistoryStore::open(&path).unwrap();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.log.as_mut().unwrap().file = File::open(&path).unwrap();
        }
        assert!(store.add("a.com", at(1)).unwrap_err().is_storage());
        assert_eq!(store.count().unwrap(), 0);
        {
            let mut inner = store.inner.lock().unwrap();
            inner.log.as_mut().unwrap().file =
                OpenOptions::new().append(true).open(&path).unwrap();
        }
        assert_eq!(store.add("b.com", at(2)).unwrap(), 1);
        drop(store);

        let reopened = HistoryStore::open(&path).unwrap();
        let all = reopened.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].index, 1);
        assert_eq!(all[0].address, "b.com");
    }

    #[test]
    fn not_found_is_not_a_storage_error() {
        assert!(!HistoryError::NotFound(3).is_storage());
        assert!(HistoryError::Exhausted.is_storage());
    }

    #[test]
    fn log_entries_use_entry_index_column() {
        let rec = HistoryRecord {
            index: 7,
            address: "a.com".into(),
            visited_at: at(5),
        };
        let line = serde_json::to_string(&LogEntry::Visit(rec)).unwrap();
        assert!(line.contains("\"op\":\"visit\""));
        assert!(line.contains("\"entry_index\":7"));
        assert!(!line.contains("\"index\""));
    }
}
