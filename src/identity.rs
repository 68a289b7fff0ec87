use serde_json::{Map, Value};
use uuid::Uuid;

/// Skin id used when the host supplies raw skin bytes without one
pub const DEFAULT_SKIN_ID: &str = "Standard_Custom";

/// Skin resource attached to a fake player's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skin {
    pub skin_id: String,
    pub data: Vec<u8>,
}

impl Skin {
    pub fn new(skin_id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            skin_id: skin_id.into(),
            data,
        }
    }

    /// Wrap raw skin bytes under the standard skin id
    pub fn standard(data: Vec<u8>) -> Self {
        Self::new(DEFAULT_SKIN_ID, data)
    }
}

/// Immutable description of a fake player, fixed at creation.
///
/// Owned by the session for its whole lifetime; the registry builds one per
/// `add` call and never mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uuid: Uuid,
    /// External auth id (xuid in the roster format)
    pub xuid: String,
    pub display_name: String,
    pub skin: Skin,
    pub locale: String,
    /// Extra protocol metadata forwarded verbatim to the host
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(
        uuid: Uuid,
        xuid: impl Into<String>,
        display_name: impl Into<String>,
        skin: Skin,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            uuid,
            xuid: xuid.into(),
            display_name: display_name.into(),
            skin,
            locale: "en_US".to_string(),
            extra,
        }
    }
}

/// Handle to a live entity in the host's entity table.
///
/// Plain id, not an owning reference: the host may tear the entity down at
/// any time and lookups through a stale handle simply miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}
