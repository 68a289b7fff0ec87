//! Collaborator contract consumed from the host game server.
//!
//! The core never talks to a real network or entity system; everything it
//! needs from the embedding server goes through [`HostServer`]. The trait is
//! the privileged construction interface for sessions: the host must allow
//! trusted extensions to register a connection and drive the login milestones
//! that a real client would trigger over the wire.

use hashbrown::HashMap;
use uuid::Uuid;

use crate::identity::{EntityHandle, Identity};

/// Typed failures raised by the host's synchronous collaborator hooks
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("session already registered for uuid {0}")]
    DuplicateSession(Uuid),
    #[error("no live entity for {0}")]
    EntityUnavailable(EntityHandle),
    #[error("host rejected the operation: {0}")]
    Rejected(String),
}

/// Services the host game server must provide, all synchronous.
///
/// Handshake hooks mirror the milestones a real client connection would hit:
/// `on_login_success` creates the live player entity, `on_resource_packs_done`
/// acknowledges the pack sequence, `on_spawn` reveals the world. The spawn
/// hook reads the entity's view distance, so it must be set beforehand.
pub trait HostServer {
    /// Register a fake connection in the host's session table.
    /// Fails if the raw uuid is already present there.
    fn register_session(&mut self, identity: &Identity) -> Result<(), HostError>;

    /// Drop a fake connection from the host's session table
    fn deregister_session(&mut self, uuid: Uuid);

    /// Login milestone; yields the live entity backing the player
    fn on_login_success(&mut self, identity: &Identity) -> Result<EntityHandle, HostError>;

    /// Resource-pack acknowledgement milestone
    fn on_resource_packs_done(&mut self, entity: EntityHandle) -> Result<(), HostError>;

    /// Set the chunk view distance on the backing entity
    fn set_view_distance(&mut self, entity: EntityHandle, chunks: u8) -> Result<(), HostError>;

    /// Spawn milestone; reveals world chunks and nearby entities
    fn on_spawn(&mut self, entity: EntityHandle) -> Result<(), HostError>;

    /// Broadcast a disconnect to the rest of the server
    fn notify_disconnect(&mut self, entity: EntityHandle, reason: &str);

    /// Tear the live entity down
    fn despawn_entity(&mut self, entity: EntityHandle);

    /// Raw skin bytes for newly created identities
    fn skin_data(&self) -> Vec<u8>;

    /// Move an entity by a world-space delta (behaviour surface)
    fn move_entity(&mut self, entity: EntityHandle, delta: (f64, f64, f64))
        -> Result<(), HostError>;

    /// Say something in chat as the entity (behaviour surface)
    fn send_chat(&mut self, entity: EntityHandle, message: &str) -> Result<(), HostError>;
}

/// One hook invocation, recorded by [`InMemoryHost`] for order assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RegisterSession(Uuid),
    DeregisterSession(Uuid),
    LoginSuccess(Uuid),
    ResourcePacksDone(EntityHandle),
    SetViewDistance(EntityHandle, u8),
    Spawn(EntityHandle),
    Disconnect(EntityHandle, String),
    Despawn(EntityHandle),
}

/// Live entity state tracked by [`InMemoryHost`]
#[derive(Debug, Clone)]
pub struct HostEntity {
    pub uuid: Uuid,
    pub position: (f64, f64, f64),
    pub view_distance: u8,
}

/// Reference host implementation: an entity table plus a call log.
///
/// Stands in for the real game server in the service binary and in tests;
/// the call log lets tests assert hook ordering (view distance before spawn,
/// deregistration on rollback).
#[derive(Debug, Default)]
pub struct InMemoryHost {
    sessions: HashMap<Uuid, ()>,
    entities: HashMap<EntityHandle, HostEntity>,
    next_entity_id: u64,
    pub calls: Vec<HostCall>,
    pub chat_log: Vec<(EntityHandle, String)>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&HostEntity> {
        self.entities.get(&handle)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl HostServer for InMemoryHost {
    fn register_session(&mut self, identity: &Identity) -> Result<(), HostError> {
        if self.sessions.contains_key(&identity.uuid) {
            return Err(HostError::DuplicateSession(identity.uuid));
        }
        self.sessions.insert(identity.uuid, ());
        self.calls.push(HostCall::RegisterSession(identity.uuid));
        Ok(())
    }

    fn deregister_session(&mut self, uuid: Uuid) {
        self.sessions.remove(&uuid);
        self.calls.push(HostCall::DeregisterSession(uuid));
    }

    fn on_login_success(&mut self, identity: &Identity) -> Result<EntityHandle, HostError> {
        self.next_entity_id += 1;
        let handle = EntityHandle(self.next_entity_id);
        self.entities.insert(
            handle,
            HostEntity {
                uuid: identity.uuid,
                position: (0.0, 64.0, 0.0),
                view_distance: 0,
            },
        );
        self.calls.push(HostCall::LoginSuccess(identity.uuid));
        Ok(handle)
    }

    fn on_resource_packs_done(&mut self, entity: EntityHandle) -> Result<(), HostError> {
        if !self.entities.contains_key(&entity) {
            return Err(HostError::EntityUnavailable(entity));
        }
        self.calls.push(HostCall::ResourcePacksDone(entity));
        Ok(())
    }

    fn set_view_distance(&mut self, entity: EntityHandle, chunks: u8) -> Result<(), HostError> {
        let e = self
            .entities
            .get_mut(&entity)
            .ok_or(HostError::EntityUnavailable(entity))?;
        e.view_distance = chunks;
        self.calls.push(HostCall::SetViewDistance(entity, chunks));
        Ok(())
    }

    fn on_spawn(&mut self, entity: EntityHandle) -> Result<(), HostError> {
        let e = self
            .entities
            .get(&entity)
            .ok_or(HostError::EntityUnavailable(entity))?;
        if e.view_distance == 0 {
            return Err(HostError::Rejected(
                "spawn with zero view distance".to_string(),
            ));
        }
        self.calls.push(HostCall::Spawn(entity));
        Ok(())
    }

    fn notify_disconnect(&mut self, entity: EntityHandle, reason: &str) {
        self.calls
            .push(HostCall::Disconnect(entity, reason.to_string()));
    }

    fn despawn_entity(&mut self, entity: EntityHandle) {
        self.entities.remove(&entity);
        self.calls.push(HostCall::Despawn(entity));
    }

    fn skin_data(&self) -> Vec<u8> {
        // 64x64 RGBA, all zero - enough for a valid-looking skin blob
        vec![0u8; 64 * 64 * 4]
    }

    fn move_entity(
        &mut self,
        entity: EntityHandle,
        delta: (f64, f64, f64),
    ) -> Result<(), HostError> {
        let e = self
            .entities
            .get_mut(&entity)
            .ok_or(HostError::EntityUnavailable(entity))?;
        e.position.0 += delta.0;
        e.position.1 += delta.1;
        e.position.2 += delta.2;
        Ok(())
    }

    fn send_chat(&mut self, entity: EntityHandle, message: &str) -> Result<(), HostError> {
        if !self.entities.contains_key(&entity) {
            return Err(HostError::EntityUnavailable(entity));
        }
        self.chat_log.push((entity, message.to_string()));
        Ok(())
    }
}
