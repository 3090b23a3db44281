use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::DayEvent;

const EVENTS_MARKER: &str = "\n=== EVENTS ===\n";
const BOOK_FILE: &str = "events.book";

pub const BOOK_SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    TomlDecode(toml::de::Error),
    TomlEncode(toml::ser::Error),
    JsonDecode(serde_json::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "io error: {err}"),
            StoreError::TomlDecode(err) => write!(f, "failed to parse book header: {err}"),
            StoreError::TomlEncode(err) => write!(f, "failed to encode book header: {err}"),
            StoreError::JsonDecode(err) => write!(f, "failed to parse event line: {err}"),
            StoreError::JsonEncode(err) => write!(f, "failed to encode event line: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub trait EventStore {
    fn load(&mut self) -> Result<Vec<DayEvent>, StoreError>;
    fn save(&mut self, events: &[DayEvent]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookHeader {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
}

impl BookHeader {
    fn new() -> Self {
        Self {
            schema_version: BOOK_SCHEMA_VERSION,
            created_at: Utc::now(),
        }
    }
}

pub struct FileStore {
    path: PathBuf,
    header: BookHeader,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            header: BookHeader::new(),
        }
    }
}

impl EventStore for FileStore {
    fn load(&mut self) -> Result<Vec<DayEvent>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Io(err)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let (header_blob, events_blob) = match raw.split_once(EVENTS_MARKER) {
            Some((header, events)) => (header, events),
            None => (raw.as_str(), ""),
        };

        self.header = toml::from_str(header_blob).map_err(StoreError::TomlDecode)?;
        let mut events = Vec::new();
        for line in events_blob.lines() {
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line).map_err(StoreError::JsonDecode)?);
        }

        Ok(events)
    }

    fn save(&mut self, events: &[DayEvent]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StoreError::Io)?;
            }
        }

        let header = toml::to_string_pretty(&self.header).map_err(StoreError::TomlEncode)?;
        let mut file = fs::File::create(&self.path).map_err(StoreError::Io)?;
        file.write_all(header.as_bytes()).map_err(StoreError::Io)?;
        file.write_all(EVENTS_MARKER.as_bytes())
            .map_err(StoreError::Io)?;

        for event in events {
            let line = serde_json::to_string(event).map_err(StoreError::JsonEncode)?;
            file.write_all(line.as_bytes()).map_err(StoreError::Io)?;
            file.write_all(b"\n").map_err(StoreError::Io)?;
        }

        Ok(())
    }
}

pub fn resolve_book_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return absolutize(path);
    }

    if let Some(path) = env::var_os("DAYMARK_BOOK") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return absolutize(path);
        }
    }

    data_dir().join(BOOK_FILE)
}

fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(path) = env::var_os("LOCALAPPDATA") {
            return PathBuf::from(path).join("daymark");
        }
    }

    if let Some(path) = env::var_os("XDG_DATA_HOME") {
        return PathBuf::from(path).join("daymark");
    }

    if let Some(path) = env::var_os("HOME") {
        return PathBuf::from(path)
            .join(".local")
            .join("share")
            .join("daymark");
    }

    PathBuf::from(".daymark")
}

fn absolutize(path: PathBuf) -> PathBuf {
    let path = if path.is_absolute() {
        path
    } else if let Ok(cwd) = env::current_dir() {
        cwd.join(path)
    } else {
        path
    };

    if path.exists() {
        fs::canonicalize(&path).unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::session::DayEvent;

    use super::{resolve_book_path, EventStore, FileStore, StoreError, BOOK_SCHEMA_VERSION};

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }

    fn event(key: &str, title: &str) -> DayEvent {
        DayEvent {
            id: "a1B2c3D4".to_string(),
            key: key.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn round_trips_header_and_events() {
        let path = temp_file("daymark_storage_roundtrip.book");
        let mut store = FileStore::open(path.clone());
        store
            .save(&[event("2025-08-25", "Dentist"), event("2025-08-26", "Groceries")])
            .expect("save should succeed");

        let mut reopened = FileStore::open(path.clone());
        let events = reopened.load().expect("load should succeed");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key, "2025-08-25");
        assert_eq!(events[0].title, "Dentist");
        assert_eq!(events[1].title, "Groceries");
        assert_eq!(reopened.header.schema_version, BOOK_SCHEMA_VERSION);
        assert_eq!(reopened.header.created_at, store.header.created_at);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_loads_an_empty_book() {
        let path = temp_file("daymark_storage_missing.book");
        let mut store = FileStore::open(path);
        let events = store.load().expect("load should succeed");
        assert!(events.is_empty());
        assert_eq!(store.header.schema_version, BOOK_SCHEMA_VERSION);
    }

    #[test]
    fn blank_lines_between_events_are_skipped() {
        let path = temp_file("daymark_storage_blanks.book");
        let raw = concat!(
            "schema_version = 1\n",
            "created_at = \"2025-08-25T12:00:00Z\"\n",
            "\n=== EVENTS ===\n",
            "{\"id\":\"a1B2c3D4\",\"key\":\"2025-08-25\",\"title\":\"Dentist\"}\n",
            "\n",
            "   \n",
            "{\"id\":\"e5F6g7H8\",\"key\":\"2025-08-26\",\"title\":\"Groceries\"}\n",
        );
        fs::write(&path, raw).expect("write should succeed");

        let mut store = FileStore::open(path.clone());
        let events = store.load().expect("load should succeed");
        assert_eq!(events.len(), 2);
        assert_eq!(store.header.schema_version, 1);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn header_without_marker_is_an_eventless_book() {
        let path = temp_file("daymark_storage_headeronly.book");
        let raw = "schema_version = 1\ncreated_at = \"2025-08-25T12:00:00Z\"\n";
        fs::write(&path, raw).expect("write should succeed");

        let mut store = FileStore::open(path.clone());
        let events = store.load().expect("load should succeed");
        assert!(events.is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_header_surfaces_a_decode_error() {
        let path = temp_file("daymark_storage_corrupt.book");
        fs::write(&path, "schema_version = = 1\n=== EVENTS ===\n").expect("write should succeed");

        let mut store = FileStore::open(path.clone());
        assert!(matches!(store.load(), Err(StoreError::TomlDecode(_))));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = temp_file("daymark_storage_nested");
        let path = dir.join("deep").join("events.book");
        let mut store = FileStore::open(path.clone());
        store.save(&[event("2025-08-25", "Dentist")]).expect("save should succeed");
        assert!(path.exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn explicit_book_path_wins_and_becomes_absolute() {
        let resolved = resolve_book_path(Some(PathBuf::from("notes/my.book")));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("notes/my.book"));
    }

    #[test]
    fn default_book_path_falls_back_to_the_data_dir() {
        if std::env::var_os("DAYMARK_BOOK").is_some() {
            return;
        }
        let resolved = resolve_book_path(None);
        assert_eq!(
            resolved.file_name().and_then(|name| name.to_str()),
            Some("events.book")
        );
    }
}
