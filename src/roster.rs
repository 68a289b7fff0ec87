//! Roster persistence.
//!
//! A roster file is a JSON mapping from uuid string to player entry, the
//! shape the service loads once at startup. Loading is all-or-nothing per
//! file (unreadable or unparsable files fail), but applying is per-entry:
//! a bad uuid or a failed add skips that entry with a warning instead of
//! aborting the rest.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::host::HostServer;
use crate::registry::FakePlayerRegistry;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse roster file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One fake player as persisted on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEntry {
    pub xuid: String,
    pub gamertag: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<String>,
}

/// BTreeMap keeps application order deterministic across loads
pub type Roster = BTreeMap<String, RosterEntry>;

/// Read and parse a roster file
pub fn load(path: &Path) -> Result<Roster, RosterError> {
    let contents = std::fs::read_to_string(path)?;
    let roster = serde_json::from_str(&contents)?;
    Ok(roster)
}

/// Serialize a roster back to its on-disk form
pub fn save(path: &Path, roster: &Roster) -> Result<(), RosterError> {
    let contents = serde_json::to_string_pretty(roster)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Add one fake player per roster entry. Malformed uuids and failed adds are
/// skipped with a warning; returns the number of players actually added.
pub fn apply(
    registry: &mut FakePlayerRegistry,
    host: &mut dyn HostServer,
    roster: &Roster,
) -> usize {
    let mut added = 0;
    for (uuid_str, entry) in roster {
        let uuid = match Uuid::parse_str(uuid_str) {
            Ok(uuid) => uuid,
            Err(e) => {
                warn!(uuid = %uuid_str, error = %e, "skipping roster entry with malformed uuid");
                registry.metrics().record_roster_skip();
                continue;
            }
        };
        match registry.add(
            host,
            uuid,
            entry.xuid.clone(),
            entry.gamertag.clone(),
            entry.extra_data.clone(),
            &entry.behaviours,
        ) {
            Ok(entity) => {
                info!(%uuid, %entity, gamertag = %entry.gamertag, "roster player added");
                added += 1;
            }
            Err(e) => {
                warn!(%uuid, gamertag = %entry.gamertag, error = %e, "skipping roster entry");
                registry.metrics().record_roster_skip();
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::BehaviourCatalog;
    use crate::host::InMemoryHost;
    use crate::metrics::ServiceMetrics;
    use std::io::Write;
    use std::sync::Arc;

    fn registry() -> FakePlayerRegistry {
        FakePlayerRegistry::new(
            BehaviourCatalog::with_defaults(),
            4,
            Arc::new(ServiceMetrics::new()),
        )
    }

    fn entry(gamertag: &str, behaviours: &[&str]) -> RosterEntry {
        RosterEntry {
            xuid: format!("x-{gamertag}"),
            gamertag: gamertag.to_string(),
            extra_data: serde_json::Map::new(),
            behaviours: behaviours.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_roster_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.json");

        let uuid = Uuid::new_v4();
        let mut roster = Roster::new();
        roster.insert(uuid.to_string(), entry("Bot1", &["wander"]));
        save(&path, &roster).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, roster);

        let mut reg = registry();
        let mut host = InMemoryHost::new();
        assert_eq!(apply(&mut reg, &mut host, &loaded), 1);

        let entity = reg.entities()[0];
        let player = reg.player(entity).unwrap();
        assert_eq!(player.session().uuid(), uuid);
        assert_eq!(player.behaviour_names(), vec!["wander"]);
    }

    #[test]
    fn test_load_accepts_original_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "5d3bd2bf-8bf4-403d-9bd5-8d1bbd565ab6": {{
                    "xuid": "x1",
                    "gamertag": "Bot1",
                    "extra_data": {{"DeviceModel": "phantom"}},
                    "behaviours": ["wander", "idle"]
                }},
                "d4b0e950-2f4b-42a8-ba5f-74d32e53b1eb": {{
                    "xuid": "x2",
                    "gamertag": "Bot2"
                }}
            }}"#
        )
        .unwrap();

        let roster = load(file.path()).unwrap();
        assert_eq!(roster.len(), 2);

        let first = &roster["5d3bd2bf-8bf4-403d-9bd5-8d1bbd565ab6"];
        assert_eq!(first.behaviours, vec!["wander", "idle"]);
        assert_eq!(
            first.extra_data["DeviceModel"],
            serde_json::Value::String("phantom".to_string())
        );

        // Optional fields default to empty
        let second = &roster["d4b0e950-2f4b-42a8-ba5f-74d32e53b1eb"];
        assert!(second.behaviours.is_empty());
        assert!(second.extra_data.is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load(Path::new("/nonexistent/players.json"));
        assert!(matches!(result, Err(RosterError::Io(_))));
    }

    #[test]
    fn test_load_malformed_json_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = load(file.path());
        assert!(matches!(result, Err(RosterError::Parse(_))));
    }

    #[test]
    fn test_apply_skips_bad_entries() {
        let mut roster = Roster::new();
        roster.insert("not-a-uuid".to_string(), entry("Broken", &[]));
        roster.insert(Uuid::new_v4().to_string(), entry("Good", &[]));
        roster.insert(
            Uuid::new_v4().to_string(),
            entry("BadBehaviour", &["no-such-behaviour"]),
        );

        let mut reg = registry();
        let mut host = InMemoryHost::new();

        let added = apply(&mut reg, &mut host, &roster);

        assert_eq!(added, 1);
        assert_eq!(reg.player_count(), 1);
        // Both the malformed uuid and the unknown behaviour count as skips
        assert_eq!(
            reg.metrics()
                .roster_entries_skipped
                .load(std::sync::atomic::Ordering::Relaxed),
            2
        );
    }

    #[test]
    fn test_apply_order_is_deterministic() {
        let mut roster = Roster::new();
        // BTreeMap sorts keys, so insertion order here is irrelevant
        roster.insert(
            "ffffffff-0000-0000-0000-000000000000".to_string(),
            entry("Last", &[]),
        );
        roster.insert(
            "00000000-0000-0000-0000-000000000001".to_string(),
            entry("First", &[]),
        );

        let mut reg = registry();
        let mut host = InMemoryHost::new();
        apply(&mut reg, &mut host, &roster);

        let entities = reg.entities();
        assert_eq!(
            reg.player(entities[0]).unwrap().session().identity().display_name,
            "First"
        );
        assert_eq!(
            reg.player(entities[1]).unwrap().session().identity().display_name,
            "Last"
        );
    }
}
