//! Fake-player registry and lifecycle.
//!
//! One registry per service instance owns every active [`FakePlayer`], keyed
//! by identity uuid with insertion order preserved. All mutation happens on
//! the host's single simulation thread; `add` is atomic (full handshake or
//! rolled back), `remove` always deletes the entry before anything can
//! observe it, and `tick_all` drives every player in add order.

use std::sync::Arc;

use hashbrown::HashMap;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::behaviour::{Behaviour, BehaviourCatalog, UnknownBehaviourError};
use crate::host::HostServer;
use crate::identity::{EntityHandle, Identity, Skin};
use crate::listener::{FakePlayerListener, ListenerBus, ListenerId};
use crate::metrics::ServiceMetrics;
use crate::player::FakePlayer;
use crate::session::{FakeSession, SessionError};

/// Reason string sent when a player is removed explicitly
const REMOVE_REASON: &str = "Removed";
/// Reason string sent when the whole service shuts down
const SHUTDOWN_REASON: &str = "Server shutdown";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a fake player with uuid {0} already exists")]
    DuplicateIdentity(Uuid),
    #[error("{0} is not a registered fake player")]
    NotAFakePlayer(EntityHandle),
    #[error(transparent)]
    UnknownBehaviour(#[from] UnknownBehaviourError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Owner of all active fake players
pub struct FakePlayerRegistry {
    active: HashMap<Uuid, FakePlayer>,
    /// Insertion order of `active` keys; also the tick and backfill order
    order: Vec<Uuid>,
    by_entity: HashMap<EntityHandle, Uuid>,
    catalog: BehaviourCatalog,
    listeners: ListenerBus,
    view_distance: u8,
    tick: u64,
    metrics: Arc<ServiceMetrics>,
}

impl FakePlayerRegistry {
    pub fn new(catalog: BehaviourCatalog, view_distance: u8, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            active: HashMap::new(),
            order: Vec::new(),
            by_entity: HashMap::new(),
            catalog,
            listeners: ListenerBus::new(),
            view_distance,
            tick: 0,
            metrics,
        }
    }

    pub fn catalog(&self) -> &BehaviourCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut BehaviourCatalog {
        &mut self.catalog
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    pub fn player_count(&self) -> usize {
        self.active.len()
    }

    /// Pure lookup: is this entity one of ours?
    pub fn is_fake(&self, entity: EntityHandle) -> bool {
        self.by_entity.contains_key(&entity)
    }

    pub fn player(&self, entity: EntityHandle) -> Option<&FakePlayer> {
        let uuid = self.by_entity.get(&entity)?;
        self.active.get(uuid)
    }

    /// Entity handles of all active fake players, in add order
    pub fn entities(&self) -> Vec<EntityHandle> {
        self.order
            .iter()
            .filter_map(|uuid| self.active.get(uuid))
            .map(FakePlayer::entity)
            .collect()
    }

    /// Create a fake player and walk it through the full login sequence.
    ///
    /// Duplicate uuids and unknown behaviour names are rejected before any
    /// session state exists; a handshake failure rolls the half-built
    /// session back out of the host before the error surfaces.
    pub fn add(
        &mut self,
        host: &mut dyn HostServer,
        uuid: Uuid,
        xuid: impl Into<String>,
        gamertag: impl Into<String>,
        extra: Map<String, Value>,
        behaviour_names: &[String],
    ) -> Result<EntityHandle, RegistryError> {
        if self.active.contains_key(&uuid) {
            return Err(RegistryError::DuplicateIdentity(uuid));
        }

        // Resolve every behaviour before the session exists so an unknown
        // name cannot leave partial state behind
        let mut behaviours: Vec<Box<dyn Behaviour>> = Vec::with_capacity(behaviour_names.len());
        for name in behaviour_names {
            behaviours.push(self.catalog.create(name)?);
        }

        let gamertag = gamertag.into();
        let identity = Identity::new(
            uuid,
            xuid,
            gamertag.clone(),
            Skin::standard(host.skin_data()),
            extra,
        );

        let mut session = FakeSession::create(identity, host)?;
        let entity = match self.run_handshake(&mut session, host) {
            Ok(entity) => entity,
            Err(e) => {
                session.abort(host);
                return Err(e.into());
            }
        };

        let mut player = FakePlayer::new(entity, session);
        for behaviour in behaviours {
            player.attach(behaviour);
        }

        self.active.insert(uuid, player);
        self.order.push(uuid);
        self.by_entity.insert(entity, uuid);
        self.metrics.record_add();
        info!(%uuid, %entity, name = %gamertag, "fake player joined");

        self.listeners.notify_add(entity);
        Ok(entity)
    }

    fn run_handshake(
        &self,
        session: &mut FakeSession,
        host: &mut dyn HostServer,
    ) -> Result<EntityHandle, SessionError> {
        let entity = session.advance_to_login_success(host)?;
        session.advance_to_resource_packs_done(host)?;
        session.apply_view_distance(host, self.view_distance)?;
        session.advance_to_spawned(host)?;
        Ok(entity)
    }

    /// Remove a fake player. The registry entry is gone before the
    /// disconnect runs or any listener hears about it.
    pub fn remove(
        &mut self,
        host: &mut dyn HostServer,
        entity: EntityHandle,
        disconnect: bool,
    ) -> Result<(), RegistryError> {
        self.remove_with_reason(host, entity, disconnect, REMOVE_REASON)
    }

    fn remove_with_reason(
        &mut self,
        host: &mut dyn HostServer,
        entity: EntityHandle,
        disconnect: bool,
        reason: &str,
    ) -> Result<(), RegistryError> {
        let uuid = self
            .by_entity
            .remove(&entity)
            .ok_or(RegistryError::NotAFakePlayer(entity))?;
        let mut player = match self.active.remove(&uuid) {
            Some(player) => player,
            // by_entity and active are updated together; a missing entry
            // here would mean the maps diverged
            None => return Err(RegistryError::NotAFakePlayer(entity)),
        };
        self.order.retain(|u| *u != uuid);

        if disconnect {
            player.session_mut().disconnect(host, reason);
        }
        self.metrics.record_remove();
        info!(%uuid, %entity, "fake player removed");

        self.listeners.notify_remove(entity);
        Ok(())
    }

    /// Run one tick for every active fake player, in add order. A player
    /// whose behaviours fail never stops the players after it.
    pub fn tick_all(&mut self, host: &mut dyn HostServer) {
        self.tick += 1;
        let tick = self.tick;
        let mut errors = 0u64;
        // Snapshot the order: behaviours cannot mutate the registry, but a
        // plain iterator over `order` would alias the &mut self borrow
        let uuids: Vec<Uuid> = self.order.clone();
        for uuid in uuids {
            if let Some(player) = self.active.get_mut(&uuid) {
                errors += player.tick(host, tick) as u64;
            }
        }
        self.metrics.record_tick(errors);
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Register a lifecycle listener and backfill `on_player_add` for every
    /// player already active, in add order
    pub fn register_listener(&mut self, listener: Box<dyn FakePlayerListener>) -> ListenerId {
        let id = self.listeners.register(listener);
        for entity in self.entities() {
            self.listeners.backfill(id, entity);
        }
        id
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    /// Teardown: disconnect and remove every active player
    pub fn shutdown(&mut self, host: &mut dyn HostServer) {
        let entities = self.entities();
        debug!(players = entities.len(), "registry shutting down");
        for entity in entities {
            // Entries come straight from the registry; removal cannot miss
            if let Err(e) = self.remove_with_reason(host, entity, true, SHUTDOWN_REASON) {
                tracing::warn!(%entity, error = %e, "failed to remove player during shutdown");
            }
        }
    }
}
