//! Default behaviour set registered into every catalog built with
//! [`BehaviourCatalog::with_defaults`](super::BehaviourCatalog::with_defaults).

use rand::Rng;

use crate::behaviour::{Behaviour, BehaviourCatalog, BehaviourError, TickContext};

/// Ticks between wander direction changes
const WANDER_RETARGET_TICKS: u64 = 40;
/// Horizontal wander speed in blocks per tick
const WANDER_SPEED: f64 = 0.1;
/// Side length of the patrol square, in ticks per edge
const PATROL_EDGE_TICKS: u32 = 60;
/// Patrol speed in blocks per tick
const PATROL_SPEED: f64 = 0.08;

pub(super) fn register_defaults(catalog: &mut BehaviourCatalog) {
    catalog.register("idle", || Box::new(Idle));
    catalog.register("wander", || Box::new(Wander::new()));
    catalog.register("patrol", || Box::new(Patrol::new()));
}

/// Does nothing; useful as a placeholder attachment
pub struct Idle;

impl Behaviour for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn on_tick(&mut self, _ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
        Ok(())
    }
}

/// Random horizontal drift, re-rolling direction every few seconds
pub struct Wander {
    direction: (f64, f64),
    ticks_until_retarget: u64,
}

impl Wander {
    pub fn new() -> Self {
        Self {
            direction: (0.0, 0.0),
            ticks_until_retarget: 0,
        }
    }

    fn retarget(&mut self) {
        let mut rng = rand::thread_rng();
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        self.direction = (angle.cos(), angle.sin());
        self.ticks_until_retarget =
            WANDER_RETARGET_TICKS + rng.gen_range(0..WANDER_RETARGET_TICKS);
    }
}

impl Default for Wander {
    fn default() -> Self {
        Self::new()
    }
}

impl Behaviour for Wander {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
        if self.ticks_until_retarget == 0 {
            self.retarget();
        }
        self.ticks_until_retarget -= 1;

        let delta = (
            self.direction.0 * WANDER_SPEED,
            0.0,
            self.direction.1 * WANDER_SPEED,
        );
        ctx.host.move_entity(ctx.entity, delta)?;
        Ok(())
    }
}

/// Walks a fixed square path, one edge at a time
pub struct Patrol {
    step: u32,
}

impl Patrol {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    fn edge_direction(edge: u32) -> (f64, f64) {
        match edge % 4 {
            0 => (1.0, 0.0),
            1 => (0.0, 1.0),
            2 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        }
    }
}

impl Default for Patrol {
    fn default() -> Self {
        Self::new()
    }
}

impl Behaviour for Patrol {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
        let edge = self.step / PATROL_EDGE_TICKS;
        let (dx, dz) = Self::edge_direction(edge);
        self.step = (self.step + 1) % (PATROL_EDGE_TICKS * 4);

        ctx.host
            .move_entity(ctx.entity, (dx * PATROL_SPEED, 0.0, dz * PATROL_SPEED))?;
        Ok(())
    }
}
