//! Station registry
//!
//! Stations are loaded once at startup from a JSON file of the form
//! `{"stations": [...]}`. The only mutation is [`StationRegistry::update_station`],
//! used to persist a lazily created playlist id.

use crate::error::{Error, Result};
use crate::models::{is_valid_station_id, Station, MAX_STATION_ID_LEN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read access to the configured stations, plus playlist id write-back
pub trait StationRegistry: Send + Sync {
    fn get_by_id(&self, id: &str) -> Result<Station>;

    fn get_all(&self) -> Vec<Station>;

    /// Replaces the station with the same id and persists the registry.
    fn update_station(&self, station: &Station) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StationFile {
    stations: Vec<Station>,
}

/// Registry backed by a JSON station file
#[derive(Debug)]
pub struct JsonStationRegistry {
    path: Option<PathBuf>,
    stations: Mutex<Vec<Station>>,
}

impl JsonStationRegistry {
    /// Loads the station file at `path`.
    ///
    /// Duplicate ids and ids that cannot name a log file or table are rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::registry(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: StationFile = serde_json::from_str(&raw).map_err(|e| {
            Error::registry(format!("cannot parse {}: {}", path.display(), e))
        })?;

        let mut seen = std::collections::HashSet::new();
        for station in &file.stations {
            if !is_valid_station_id(&station.id) {
                return Err(Error::registry(format!(
                    "invalid station id '{}': expected 1 to {} characters of [A-Za-z0-9_-]",
                    station.id, MAX_STATION_ID_LEN
                )));
            }
            if !seen.insert(station.id.as_str()) {
                return Err(Error::registry(format!("duplicate station id '{}'", station.id)));
            }
        }

        tracing::info!(
            path = %path.display(),
            stations = file.stations.len(),
            "Loaded station registry"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            stations: Mutex::new(file.stations),
        })
    }

    /// Registry that lives only in memory, updates are not persisted
    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            path: None,
            stations: Mutex::new(stations),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Station>>> {
        self.stations
            .lock()
            .map_err(|_| Error::registry("station registry lock poisoned"))
    }

    fn save(&self, stations: &[Station]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = StationFile {
            stations: stations.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), "Station registry saved");
        Ok(())
    }
}

impl StationRegistry for JsonStationRegistry {
    fn get_by_id(&self, id: &str) -> Result<Station> {
        self.lock()?
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| Error::StationNotFound(id.to_string()))
    }

    fn get_all(&self) -> Vec<Station> {
        match self.lock() {
            Ok(stations) => stations.clone(),
            Err(_) => Vec::new(),
        }
    }

    fn update_station(&self, station: &Station) -> Result<()> {
        let mut stations = self.lock()?;
        let slot = stations
            .iter_mut()
            .find(|s| s.id == station.id)
            .ok_or_else(|| Error::StationNotFound(station.id.clone()))?;
        *slot = station.clone();
        self.save(&stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FILE: &str = r#"{
      "stations": [
        {"id": "fip", "name": "FIP", "url": "https://x/fip", "type": "html",
         "artistTag": ".artist", "titleTag": ".title"},
        {"id": "txt", "name": "Text", "url": "https://x/t", "type": "plaintext",
         "regex": "(?P<artist>.+) - (?P<title>.+)"}
      ]
    }"#;

    fn write_registry(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("stations.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_and_lookup() {
        let dir = TempDir::new().unwrap();
        let registry = JsonStationRegistry::load(write_registry(&dir, FILE)).unwrap();

        assert_eq!(registry.get_all().len(), 2);
        assert_eq!(registry.get_by_id("fip").unwrap().name, "FIP");
        assert!(matches!(
            registry.get_by_id("nope"),
            Err(Error::StationNotFound(_))
        ));
    }

    #[test]
    fn test_update_persists_playlist_id() {
        let dir = TempDir::new().unwrap();
        let path = write_registry(&dir, FILE);
        let registry = JsonStationRegistry::load(&path).unwrap();

        let mut fip = registry.get_by_id("fip").unwrap();
        fip.playlist_id = Some("pl-123".into());
        registry.update_station(&fip).unwrap();

        let reloaded = JsonStationRegistry::load(&path).unwrap();
        assert_eq!(
            reloaded.get_by_id("fip").unwrap().destination_playlist(),
            Some("pl-123")
        );
        assert_eq!(reloaded.get_by_id("txt").unwrap().playlist_id, None);
    }

    #[test]
    fn test_update_unknown_station() {
        let registry = JsonStationRegistry::from_stations(vec![]);
        let station = Station::html("x", "X", "u", "a", "b");
        assert!(matches!(
            registry.update_station(&station),
            Err(Error::StationNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_bad_files() {
        let dir = TempDir::new().unwrap();
        assert!(JsonStationRegistry::load(dir.path().join("missing.json")).is_err());

        let dup = r#"{"stations": [
            {"id": "a", "name": "A", "url": "u", "type": "plaintext", "regex": "x"},
            {"id": "a", "name": "B", "url": "u", "type": "plaintext", "regex": "y"}
        ]}"#;
        assert!(matches!(
            JsonStationRegistry::load(write_registry(&dir, dup)),
            Err(Error::Registry(_))
        ));
    }

    #[test]
    fn test_rejects_ids_storage_cannot_use() {
        let dir = TempDir::new().unwrap();
        let long_id = "s".repeat(MAX_STATION_ID_LEN + 1);
        for id in ["radio.fr", "", "a b", long_id.as_str()] {
            let content = format!(
                r#"{{"stations": [{{"id": "{}", "name": "A", "url": "u", "type": "plaintext", "regex": "x"}}]}}"#,
                id
            );
            match JsonStationRegistry::load(write_registry(&dir, &content)) {
                Err(Error::Registry(msg)) => assert!(msg.contains("invalid station id"), "{}", msg),
                other => panic!("{:?} accepted: {:?}", id, other.map(|r| r.get_all())),
            }
        }

        let longest = "s".repeat(MAX_STATION_ID_LEN);
        let content = format!(
            r#"{{"stations": [{{"id": "{}", "name": "A", "url": "u", "type": "plaintext", "regex": "x"}}]}}"#,
            longest
        );
        let registry = JsonStationRegistry::load(write_registry(&dir, &content)).unwrap();
        assert!(registry.get_by_id(&longest).is_ok());
    }
}
