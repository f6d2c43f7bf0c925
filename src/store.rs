use crate::error::StoreError;
use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    fs,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
        PoisonError,
    },
};

pub const DEFAULT_DATA_DIR: &str = ".lucky-grid";
const STORE_FILE: &str = "store.json";

pub const SPEND_KEY: &str = "lucky_grid_spent";
pub const HISTORY_KEY: &str = "lucky_grid_history";

/// Durable key -> string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local store. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file holding every key. Each `set` rewrites the whole file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = ensure_store(dir.as_ref())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = read_entries(&self.path)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = match read_entries(&self.path) {
            Ok(entries) => entries,
            Err(StoreError::Json(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "store file is corrupt; starting a fresh one"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        write_entries(&self.path, &entries)
    }
}

fn ensure_store(dir: &Path) -> Result<PathBuf, StoreError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let file_path = dir.join(STORE_FILE);
    if !file_path.exists() {
        let mut file = fs::File::create(&file_path)?;
        file.write_all(b"{}")?;
    }
    Ok(file_path)
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    let data = fs::read(path)?;
    if data.is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_slice(&data)?)
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(entries)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn encode_spend(spend: u64) -> String {
    spend.to_string()
}

pub fn decode_spend(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

/// Missing spend is 0; unreadable or unparsable spend is logged and treated as 0.
pub fn load_spend<S: KeyValueStore>(store: &S) -> u64 {
    match store.get(SPEND_KEY) {
        Ok(None) => 0,
        Ok(Some(raw)) => decode_spend(&raw).unwrap_or_else(|| {
            tracing::warn!(%raw, "stored spend is not a number; resetting to 0");
            0
        }),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read stored spend; resetting to 0");
            0
        }
    }
}

pub fn save_spend<S: KeyValueStore>(store: &mut S, spend: u64) {
    if let Err(e) = store.set(SPEND_KEY, &encode_spend(spend)) {
        tracing::error!(error = %e, spend, "failed to persist spend");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{
        SystemTime,
        UNIX_EPOCH,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("lucky-grid-{name}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn spend_round_trips_through_store() {
        let mut store = MemoryStore::new();
        save_spend(&mut store, 345);
        assert_eq!(store.get(SPEND_KEY).unwrap().as_deref(), Some("345"));
        assert_eq!(load_spend(&store), 345);
    }

    #[test]
    fn garbage_spend_falls_back_to_zero() {
        let store = MemoryStore::with_entries([(SPEND_KEY, "lots")]);
        assert_eq!(load_spend(&store), 0);
        let store = MemoryStore::with_entries([(SPEND_KEY, "-5")]);
        assert_eq!(load_spend(&store), 0);
        let store = MemoryStore::with_entries([(SPEND_KEY, " 40\n")]);
        assert_eq!(load_spend(&store), 40);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = scratch_dir("reopen");
        let mut store = FileStore::open(&dir).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "two").unwrap();

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("two"));
        assert_eq!(reopened.get("c").unwrap(), None);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_recovers_from_corrupt_file() {
        let dir = scratch_dir("corrupt");
        let mut store = FileStore::open(&dir).unwrap();
        fs::write(store.path(), b"not json").unwrap();

        assert!(matches!(store.get("a"), Err(StoreError::Json(_))));
        assert_eq!(load_spend(&store), 0);

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
