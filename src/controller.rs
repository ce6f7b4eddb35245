/*
 * Controller Module
 *
 * NodeField owns one complete animation: the world, the spawn schedule, the
 * engine and the two timers that drive them. A fixed-period tick timer
 * renders the current world and then simulates the next tick; a chain of
 * one-shot timers fires the spawn steps.
 *
 * Restarting cancels both timers before the world is touched, so a tick or
 * spawn from the previous run can never land on the new world.
 */

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::clock::{Clock, SystemClock};
use crate::debug::DebugInfo;
use crate::params::SimulationParams;
use crate::scene::{Renderer, Scene};
use crate::scheduler::{Scheduler, Task, TimerHandle};
use crate::simulation::Engine;
use crate::spawner::Spawner;
use crate::world::{Bounds, World};

/// How often the per-tick summary is logged
const SUMMARY_INTERVAL: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

pub struct NodeField<C: Clock = SystemClock, R: Rng = SmallRng> {
    params: SimulationParams,
    world: World,
    spawner: Spawner,
    engine: Engine,
    scheduler: Scheduler,
    tick_timer: Option<TimerHandle>,
    spawn_timer: Option<TimerHandle>,
    state: LoopState,
    clock: C,
    rng: R,
    debug_info: DebugInfo,
    skipped_baseline: u64,
}

impl NodeField<SystemClock, SmallRng> {
    /// A field on the wall clock with an entropy-seeded generator.
    pub fn with_system_clock(params: SimulationParams, bounds: Bounds) -> Self {
        Self::new(params, bounds, SystemClock::new(), SmallRng::from_entropy())
    }
}

impl<C: Clock, R: Rng> NodeField<C, R> {
    pub fn new(params: SimulationParams, bounds: Bounds, clock: C, rng: R) -> Self {
        let world = World::new(bounds);
        let engine = Engine::new(&params, &world);
        let spawner = Spawner::new(&params.spawn_steps);

        Self {
            params,
            world,
            spawner,
            engine,
            scheduler: Scheduler::new(),
            tick_timer: None,
            spawn_timer: None,
            state: LoopState::Idle,
            clock,
            rng,
            debug_info: DebugInfo::default(),
            skipped_baseline: 0,
        }
    }

    /// Starts from an empty world. Starting a running field restarts it.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            self.restart();
        } else {
            self.begin();
        }
    }

    pub fn restart(&mut self) {
        self.cancel_timers();
        self.begin();
    }

    // Cancel both timers and freeze the world as it is
    pub fn stop(&mut self) {
        self.cancel_timers();
        self.state = LoopState::Idle;
        tracing::info!(ticks = self.debug_info.ticks, "node field stopped");
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.tick_timer.take() {
            self.scheduler.cancel(handle);
        }
        if let Some(handle) = self.spawn_timer.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn begin(&mut self) {
        for range in self.params.inverted_ranges() {
            tracing::warn!(range, "configured range has min above max");
        }

        self.world.clear();
        self.spawner.reset(&self.params.spawn_steps);
        self.engine = Engine::new(&self.params, &self.world);
        self.debug_info = DebugInfo::default();
        self.skipped_baseline = self.scheduler.skipped_periods();

        // Same due time: the first spawn step fires before the first tick
        let now = self.clock.now_ms();
        self.spawn_timer = Some(self.scheduler.schedule_once(now, Task::Spawn));
        self.tick_timer = Some(self.scheduler.schedule_every(now, self.params.tick_period(), Task::Tick));
        self.state = LoopState::Running;

        tracing::info!(
            width = self.world.bounds.width(),
            height = self.world.bounds.height(),
            spawn_steps = self.params.spawn_steps.len(),
            tick_period_ms = self.params.tick_period(),
            "node field started"
        );
    }

    /// Fires every timer that is due. Returns the number of ticks run.
    pub fn pump<T: Renderer + ?Sized>(&mut self, renderer: &mut T) -> usize {
        let now = self.clock.now_ms();
        let mut ticks = 0;

        while let Some(fired) = self.scheduler.pop_due(now) {
            match fired.task {
                Task::Spawn if self.spawn_timer == Some(fired.handle) => {
                    self.spawn_timer = None;
                    self.run_spawn_step(now);
                }
                Task::Tick if self.tick_timer == Some(fired.handle) => {
                    self.run_tick(now, renderer);
                    ticks += 1;
                }
                task => {
                    self.debug_info.stale_timers += 1;
                    tracing::warn!(?task, "ignoring timer from a previous run");
                }
            }
        }

        self.debug_info.skipped_ticks = self.scheduler.skipped_periods() - self.skipped_baseline;
        ticks
    }

    /// Runs one tick right now, outside the timer schedule. Does nothing
    /// unless the field is running.
    pub fn tick<T: Renderer + ?Sized>(&mut self, renderer: &mut T) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        let now = self.clock.now_ms();
        self.run_tick(now, renderer);
        true
    }

    fn run_tick<T: Renderer + ?Sized>(&mut self, now: f64, renderer: &mut T) {
        renderer.render(&Scene::capture(&self.world, &self.params, now));
        self.engine.step(&mut self.world, &self.params, now, &mut self.rng);

        self.debug_info.ticks += 1;
        self.debug_info.refresh(&self.world);
        if self.debug_info.ticks % SUMMARY_INTERVAL == 0 {
            let info = &self.debug_info;
            tracing::debug!(
                ticks = info.ticks,
                skipped = info.skipped_ticks,
                nodes = info.nodes(),
                emitting = info.emitting,
                waves = info.waves,
                connections = info.connections(),
                "tick summary"
            );
        }
    }

    fn run_spawn_step(&mut self, now: f64) {
        let Some(outcome) = self.spawner.spawn_next(&mut self.world, now, &mut self.rng) else {
            return;
        };

        tracing::debug!(
            spawned = outcome.spawned,
            total = self.world.nodes().len(),
            remaining_steps = self.spawner.remaining(),
            "spawn step fired"
        );

        if let Some(delay) = outcome.next_delay {
            self.spawn_timer = Some(self.scheduler.schedule_once(now + delay, Task::Spawn));
        }
    }

    /// Replaces the parameters. A new tick rate takes effect immediately;
    /// a new spawn schedule takes effect on the next restart.
    pub fn set_params(&mut self, params: SimulationParams) {
        let period_changed = params.tick_period() != self.params.tick_period();
        self.params = params;

        if period_changed && self.state == LoopState::Running {
            if let Some(handle) = self.tick_timer.take() {
                self.scheduler.cancel(handle);
            }
            let next = self.clock.now_ms() + self.params.tick_period();
            self.tick_timer = Some(self.scheduler.schedule_every(next, self.params.tick_period(), Task::Tick));
        }
    }

    // New bounds apply to the running world; callers usually restart after
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.world.bounds = bounds;
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn spawn_steps_remaining(&self) -> usize {
        self.spawner.remaining()
    }
}
