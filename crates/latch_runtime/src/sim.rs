//! Fixed-tick mover simulation driving the grid
//!
//! Stands in for the host engine: entities move every tick, report their moves,
//! and the grid is refreshed before any query of that tick runs.

use crate::settings::Settings;
use anyhow::Result;
use latch_spatial::glam::Vec2;
use latch_spatial::{EntityIdAllocator, EntityProxy, GridEntity, SpatialGrid};
use std::time::Duration;

/// Fixed-step clock. The step length is derived from the tick rate, so the
/// elapsed time is exact for any tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    rate_hz: u32,
    tick: u64,
}

impl TickClock {
    /// A zero rate is raised to 1 Hz.
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seconds per tick
    pub fn dt(&self) -> f32 {
        (self.rate_hz as f32).recip()
    }

    /// Moves to the next tick and returns its number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        let rate = u64::from(self.rate_hz);
        let whole = self.tick / rate;
        let rest = self.tick % rate;
        Duration::from_secs(whole) + Duration::from_nanos(rest * 1_000_000_000 / rate)
    }
}

/// SplitMix64 stream keyed on the run seed and a mover's spawn index, so
/// growing the mover count leaves the earlier movers untouched.
struct SpawnRng(u64);

impl SpawnRng {
    fn for_mover(seed: u64, index: u64) -> Self {
        Self(seed ^ index.wrapping_mul(0xD1B5_4A32_D192_ED03))
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`, from the top 24 bits
    fn unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.unit()
    }
}

struct Mover {
    entity: GridEntity,
    velocity: Vec2,
}

/// Per-tick outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub moves_applied: usize,
    pub in_grid: usize,
    pub watch_hits: usize,
}

pub struct Simulation {
    grid: SpatialGrid<GridEntity>,
    movers: Vec<Mover>,
    clock: TickClock,
    settings: Settings,
}

impl Simulation {
    pub fn new(settings: Settings) -> Result<Self> {
        let mut grid = SpatialGrid::from_config(&settings.grid)?;
        let mut ids = EntityIdAllocator::new();
        let sim = &settings.simulation;

        let origin = grid.origin();
        let end = grid.end();
        let movers: Vec<Mover> = (0..sim.entity_count as u64)
            .map(|index| {
                let mut rng = SpawnRng::for_mover(sim.seed, index);
                let position = Vec2::new(rng.range(origin.x, end.x), rng.range(origin.y, end.y));
                let radius = rng.range(sim.min_radius, sim.max_radius);
                let heading = rng.range(0.0, std::f32::consts::TAU);
                let speed = rng.range(0.0, sim.max_speed);
                Mover {
                    entity: GridEntity::new(ids.allocate(), position, radius),
                    velocity: Vec2::from_angle(heading) * speed,
                }
            })
            .collect();

        for mover in &movers {
            grid.add_entity(&mover.entity);
        }
        tracing::info!(
            "Spawned {} movers, {} inside the grid",
            movers.len(),
            grid.len()
        );

        Ok(Self {
            grid,
            movers,
            clock: TickClock::new(settings.simulation.tick_rate_hz),
            settings,
        })
    }

    pub fn grid(&self) -> &SpatialGrid<GridEntity> {
        &self.grid
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Advance one tick: move everything, apply move notifications, then query the
    /// watched region.
    pub fn step(&mut self) -> TickReport {
        let dt = self.clock.dt();
        let margin = Vec2::splat(self.settings.simulation.wrap_margin.max(0.0));
        let low = self.grid.origin() - margin;
        let high = self.grid.end() + margin;

        for mover in &self.movers {
            let next = wrap(mover.entity.position() + mover.velocity * dt, low, high);
            mover.entity.set_position(next);
        }
        let moves_applied = self.grid.process_moves();
        let tick = self.clock.advance();

        let watch = &self.settings.watch;
        let min_radius = watch.min_radius;
        let watch_hits = self
            .grid
            .query(
                watch.center - watch.half_size,
                watch.center + watch.half_size,
                |_, radius| radius >= min_radius,
            )
            .count();

        TickReport {
            tick,
            moves_applied,
            in_grid: self.grid.len(),
            watch_hits,
        }
    }
}

fn wrap(p: Vec2, low: Vec2, high: Vec2) -> Vec2 {
    let size = high - low;
    low + (p - low).rem_euclid(size)
}
