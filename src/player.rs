//! A fake player: live entity handle, its emulated session, and the ordered
//! behaviours that drive it.

use smallvec::SmallVec;
use tracing::warn;

use crate::behaviour::{Behaviour, BehaviourCatalog, TickContext, UnknownBehaviourError};
use crate::host::HostServer;
use crate::identity::EntityHandle;
use crate::session::FakeSession;

/// One active fake player.
///
/// Owns its session and its behaviour instances; behaviours run every tick
/// in attachment order.
pub struct FakePlayer {
    entity: EntityHandle,
    session: FakeSession,
    behaviours: SmallVec<[Box<dyn Behaviour>; 4]>,
}

impl FakePlayer {
    pub fn new(entity: EntityHandle, session: FakeSession) -> Self {
        Self {
            entity,
            session,
            behaviours: SmallVec::new(),
        }
    }

    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    pub fn session(&self) -> &FakeSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FakeSession {
        &mut self.session
    }

    /// Resolve `name` through the catalog and append the fresh instance to
    /// the tick order
    pub fn add_behaviour(
        &mut self,
        catalog: &BehaviourCatalog,
        name: &str,
    ) -> Result<(), UnknownBehaviourError> {
        let behaviour = catalog.create(name)?;
        self.behaviours.push(behaviour);
        Ok(())
    }

    /// Append an already-constructed behaviour instance
    pub fn attach(&mut self, behaviour: Box<dyn Behaviour>) {
        self.behaviours.push(behaviour);
    }

    pub fn behaviour_names(&self) -> Vec<&'static str> {
        self.behaviours.iter().map(|b| b.name()).collect()
    }

    pub fn behaviour_count(&self) -> usize {
        self.behaviours.len()
    }

    /// Emit the session's per-tick presence, then run every attached
    /// behaviour once, in attachment order.
    ///
    /// A failing behaviour is logged and skipped for this tick; it never
    /// stops the ones after it. Returns the number of behaviour errors.
    pub fn tick(&mut self, host: &mut dyn HostServer, tick: u64) -> usize {
        self.session.keep_alive(tick);
        let mut errors = 0;
        for behaviour in self.behaviours.iter_mut() {
            let mut ctx = TickContext {
                entity: self.entity,
                tick,
                host,
            };
            if let Err(e) = behaviour.on_tick(&mut ctx) {
                warn!(
                    entity = %self.entity,
                    behaviour = behaviour.name(),
                    error = %e,
                    "behaviour tick failed"
                );
                errors += 1;
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::BehaviourError;
    use crate::host::InMemoryHost;
    use crate::identity::{Identity, Skin};
    use serde_json::Map;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    struct Recorder {
        label: &'static str,
        log: Arc<std::sync::Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl Behaviour for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn on_tick(&mut self, _ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
            self.log.lock().unwrap().push(self.label);
            if self.fail {
                Err(BehaviourError::Failed("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn make_player(host: &mut InMemoryHost) -> FakePlayer {
        let identity = Identity::new(
            Uuid::new_v4(),
            "x",
            "Bot",
            Skin::standard(vec![0; 4]),
            Map::new(),
        );
        let mut session = FakeSession::create(identity, host).unwrap();
        let entity = session.advance_to_login_success(host).unwrap();
        session.advance_to_resource_packs_done(host).unwrap();
        session.apply_view_distance(host, 4).unwrap();
        session.advance_to_spawned(host).unwrap();
        FakePlayer::new(entity, session)
    }

    #[test]
    fn test_tick_runs_in_attachment_order() {
        let mut host = InMemoryHost::new();
        let mut player = make_player(&mut host);
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            player.attach(Box::new(Recorder {
                label,
                log: log.clone(),
                fail: false,
            }));
        }

        player.tick(&mut host, 0);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_behaviour_does_not_stop_later_ones() {
        let mut host = InMemoryHost::new();
        let mut player = make_player(&mut host);
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        player.attach(Box::new(Recorder {
            label: "bad",
            log: log.clone(),
            fail: true,
        }));
        player.attach(Box::new(Recorder {
            label: "good",
            log: log.clone(),
            fail: false,
        }));

        let errors = player.tick(&mut host, 0);

        assert_eq!(errors, 1);
        assert_eq!(*log.lock().unwrap(), vec!["bad", "good"]);
    }

    #[test]
    fn test_tick_emits_presence_packet() {
        let mut host = InMemoryHost::new();
        let mut player = make_player(&mut host);

        player.tick(&mut host, 1);
        player.tick(&mut host, 2);

        // One keep-alive per tick even with no behaviours attached
        assert_eq!(player.session().transport().packets_discarded(), 2);
    }

    #[test]
    fn test_add_behaviour_resolves_through_catalog() {
        let mut host = InMemoryHost::new();
        let mut player = make_player(&mut host);
        let catalog = BehaviourCatalog::with_defaults();

        player.add_behaviour(&catalog, "wander").unwrap();
        player.add_behaviour(&catalog, "idle").unwrap();

        assert_eq!(player.behaviour_names(), vec!["wander", "idle"]);
        assert!(player.add_behaviour(&catalog, "nope").is_err());
        // Failed resolution attached nothing
        assert_eq!(player.behaviour_count(), 2);
    }

    #[test]
    fn test_same_name_twice_yields_two_instances() {
        let mut host = InMemoryHost::new();
        let mut player = make_player(&mut host);

        let created = Arc::new(AtomicU64::new(0));
        let mut catalog = BehaviourCatalog::new();
        let counter = created.clone();
        catalog.register("probe", move || {
            counter.fetch_add(1, Ordering::Relaxed);
            Box::new(crate::behaviour::defaults::Idle)
        });

        player.add_behaviour(&catalog, "probe").unwrap();
        player.add_behaviour(&catalog, "probe").unwrap();

        assert_eq!(created.load(Ordering::Relaxed), 2);
        assert_eq!(player.behaviour_count(), 2);
    }
}
