//! Phantom Players
//!
//! Spawns and drives fake players: server-visible player entities with no
//! real network client behind them. A fake session walks the same login
//! milestones a real connection would (login success, resource packs done,
//! spawn) against the host server's collaborator hooks, with all outgoing
//! traffic discarded by a no-op transport. Pluggable behaviours give the
//! resulting players autonomous per-tick actions.
//!
//! The core is synchronous and single-threaded; an external driver (the
//! service binary here) calls [`registry::FakePlayerRegistry::tick_all`]
//! once per server tick.

pub mod behaviour;
pub mod config;
pub mod host;
pub mod identity;
pub mod listener;
pub mod metrics;
pub mod player;
pub mod registry;
pub mod roster;
pub mod session;
