//! Fake-session protocol state machine.
//!
//! A [`FakeSession`] stands in for a real client connection. It registers
//! with the host's session table like any other connection, then walks the
//! login milestones programmatically instead of waiting for wire packets:
//! `Created -> LoginSuccess -> ResourcePacksDone -> Spawned`, strictly
//! forward, with `Disconnected` reachable from anywhere. All outgoing
//! traffic goes into a [`transport::DiscardSink`].

pub mod transport;

use tracing::debug;
use uuid::Uuid;

use crate::host::{HostError, HostServer};
use crate::identity::{EntityHandle, Identity};
use crate::session::transport::{DiscardSink, OutboundPacket, PacketSink};

/// Protocol milestone the session has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    LoginSuccess,
    ResourcePacksDone,
    Spawned,
    Disconnected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::LoginSuccess => "login-success",
            SessionState::ResourcePacksDone => "resource-packs-done",
            SessionState::Spawned => "spawned",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Session creation and handshake failures
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("host rejected session registration: {0}")]
    CreationRejected(#[source] HostError),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    #[error("handshake stage '{stage}' failed: {source}")]
    Handshake {
        stage: &'static str,
        #[source]
        source: HostError,
    },
}

/// Emulated client connection for one fake player
#[derive(Debug)]
pub struct FakeSession {
    state: SessionState,
    identity: Identity,
    entity: Option<EntityHandle>,
    view_distance_applied: bool,
    transport: DiscardSink,
}

impl FakeSession {
    /// Allocate a session and register it in the host's session table.
    ///
    /// Fails if the host already tracks a connection for this raw uuid.
    pub fn create(
        identity: Identity,
        host: &mut dyn HostServer,
    ) -> Result<FakeSession, SessionError> {
        host.register_session(&identity)
            .map_err(SessionError::CreationRejected)?;
        debug!(uuid = %identity.uuid, name = %identity.display_name, "fake session registered");
        Ok(FakeSession {
            state: SessionState::Created,
            identity,
            entity: None,
            view_distance_applied: false,
            transport: DiscardSink::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn uuid(&self) -> Uuid {
        self.identity.uuid
    }

    /// The live entity backing this session, present from login success on
    pub fn entity(&self) -> Option<EntityHandle> {
        self.entity
    }

    pub fn transport(&self) -> &DiscardSink {
        &self.transport
    }

    fn expect_state(&self, from: SessionState, to: SessionState) -> Result<(), SessionError> {
        if self.state != from {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        Ok(())
    }

    /// Created -> LoginSuccess. The host creates the live player entity here,
    /// exactly as it would on receiving a real login packet.
    pub fn advance_to_login_success(
        &mut self,
        host: &mut dyn HostServer,
    ) -> Result<EntityHandle, SessionError> {
        self.expect_state(SessionState::Created, SessionState::LoginSuccess)?;
        let entity = host
            .on_login_success(&self.identity)
            .map_err(|source| SessionError::Handshake {
                stage: "login_success",
                source,
            })?;
        self.entity = Some(entity);
        self.state = SessionState::LoginSuccess;
        Ok(entity)
    }

    /// LoginSuccess -> ResourcePacksDone
    pub fn advance_to_resource_packs_done(
        &mut self,
        host: &mut dyn HostServer,
    ) -> Result<(), SessionError> {
        self.expect_state(SessionState::LoginSuccess, SessionState::ResourcePacksDone)?;
        let entity = self.entity_or_unavailable("resource_packs_done")?;
        host.on_resource_packs_done(entity)
            .map_err(|source| SessionError::Handshake {
                stage: "resource_packs_done",
                source,
            })?;
        self.state = SessionState::ResourcePacksDone;
        Ok(())
    }

    /// Set the view distance on the backing entity. Must happen before
    /// [`advance_to_spawned`](Self::advance_to_spawned): the spawn hook uses
    /// it to compute which chunks and entities to reveal.
    pub fn apply_view_distance(
        &mut self,
        host: &mut dyn HostServer,
        chunks: u8,
    ) -> Result<(), SessionError> {
        let entity = self.entity_or_unavailable("set_view_distance")?;
        host.set_view_distance(entity, chunks)
            .map_err(|source| SessionError::Handshake {
                stage: "set_view_distance",
                source,
            })?;
        self.view_distance_applied = true;
        Ok(())
    }

    /// ResourcePacksDone -> Spawned.
    ///
    /// Panics if the view distance was never applied; that ordering is an
    /// internal contract of the caller, not a runtime condition.
    pub fn advance_to_spawned(&mut self, host: &mut dyn HostServer) -> Result<(), SessionError> {
        self.expect_state(SessionState::ResourcePacksDone, SessionState::Spawned)?;
        assert!(
            self.view_distance_applied,
            "view distance must be applied before spawning a fake session"
        );
        let entity = self.entity_or_unavailable("spawn")?;
        host.on_spawn(entity)
            .map_err(|source| SessionError::Handshake {
                stage: "spawn",
                source,
            })?;
        self.state = SessionState::Spawned;
        debug!(uuid = %self.identity.uuid, %entity, "fake session spawned");
        Ok(())
    }

    /// Emit the per-tick presence packet a live client would generate
    /// traffic for. Only a spawned session has presence; every other state
    /// stays silent.
    pub fn keep_alive(&mut self, tick: u64) {
        if self.state == SessionState::Spawned {
            self.transport.send(&OutboundPacket::KeepAlive { tick });
        }
    }

    /// Transition to `Disconnected` from any state, emitting a disconnect
    /// packet into the sink and releasing the entity and session slots.
    /// Idempotent: a second call finds the session already disconnected and
    /// does nothing.
    pub fn disconnect(&mut self, host: &mut dyn HostServer, reason: &str) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.transport.send(&OutboundPacket::Disconnect {
            reason: reason.to_string(),
        });
        if let Some(entity) = self.entity.take() {
            host.notify_disconnect(entity, reason);
            host.despawn_entity(entity);
        }
        host.deregister_session(self.identity.uuid);
        self.state = SessionState::Disconnected;
        debug!(uuid = %self.identity.uuid, reason, "fake session disconnected");
    }

    /// Roll back a half-built session after a failed handshake step:
    /// deregister from the host and tear down the entity if one was created.
    /// No disconnect notification is emitted; the player never fully joined.
    pub fn abort(&mut self, host: &mut dyn HostServer) {
        if self.state == SessionState::Disconnected {
            return;
        }
        if let Some(entity) = self.entity.take() {
            host.despawn_entity(entity);
        }
        host.deregister_session(self.identity.uuid);
        self.state = SessionState::Disconnected;
        debug!(uuid = %self.identity.uuid, "fake session aborted");
    }

    fn entity_or_unavailable(&self, stage: &'static str) -> Result<EntityHandle, SessionError> {
        self.entity.ok_or(SessionError::Handshake {
            stage,
            source: HostError::Rejected("no backing entity".to_string()),
        })
    }
}
