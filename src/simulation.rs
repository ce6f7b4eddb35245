/*
 * Simulation Module
 *
 * This module advances the node field by one tick. A tick runs four passes
 * in a fixed order:
 * 1. Connection timers: finish fades, delete faded-out connections
 * 2. Motion: move every node and bounce it off the world edges
 * 3. Lifecycle: hiding -> spawning -> silent <-> emitting
 * 4. Connections: form lines between nearby nodes, dissolve distant ones
 *
 * Pairs are always visited in ascending (i, j) order, so when two new
 * connections compete for a node's last free slot the lower pair wins.
 */

use rand::Rng;

use crate::connection::{Connection, ConnectionState, PairKey};
use crate::node::{lerp_ms, Node, NodeState, Wave};
use crate::params::SimulationParams;
use crate::spatial_grid::SpatialGrid;
use crate::world::{NodeId, World};

pub struct Engine {
    // Only built once the grid path is used
    spatial_grid: Option<SpatialGrid>,
    // Scratch buffer, one flag per node
    eligible: Vec<bool>,
}

impl Engine {
    pub fn new(params: &SimulationParams, world: &World) -> Self {
        Self {
            spatial_grid: params
                .spatial_grid
                .then(|| SpatialGrid::new(params.connection.max_distance, world.bounds)),
            eligible: Vec::new(),
        }
    }

    /// Runs one tick at time `now`.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        params: &SimulationParams,
        now: f64,
        rng: &mut R,
    ) {
        if params.connections_enabled {
            advance_connection_timers(world, params, now);
        } else {
            world.connections.clear();
        }

        let bounds = world.bounds;
        self.eligible.clear();
        for node in world.nodes_mut() {
            let radius = node.radius(&params.node);
            node.advance(&params.node);
            node.bounce(&bounds, radius);

            self.eligible.push(advance_lifecycle(node, params, now, &mut *rng));
        }

        if !params.connections_enabled {
            for node in world.nodes_mut() {
                node.connections = 0;
            }
            return;
        }

        let use_grid = params.spatial_grid && params.connection.max_distance > 0.0;
        if use_grid {
            self.update_connections_with_grid(world, params, now);
        } else {
            update_connections(world, params, &self.eligible, now);
        }
    }

    fn update_connections_with_grid(&mut self, world: &mut World, params: &SimulationParams, now: f64) {
        let max_distance = params.connection.max_distance;
        let grid = self
            .spatial_grid
            .get_or_insert_with(|| SpatialGrid::new(max_distance, world.bounds));
        grid.resize(max_distance, world.bounds);
        let eligible = &self.eligible;
        grid.rebuild(world.nodes(), |i| eligible[i]);

        // Pairs outside the grid neighbourhood can only matter if they are
        // already connected, so dissolution is checked from the map
        let (nodes, connections) = world.parts_mut();
        for (key, connection) in connections.iter_mut() {
            let (a, b) = (key.lo().0, key.hi().0);
            if !(eligible[a] && eligible[b]) {
                continue;
            }
            let d = nodes[a].distance(&nodes[b]);
            if !in_band(d, params) && connection.state == ConnectionState::Connected {
                connection.enter(ConnectionState::Disconnecting, now);
                tracing::trace!(a, b, "connection dissolving");
            }
        }

        for (i, j) in grid.candidate_pairs() {
            try_connect(world, params, i, j, now);
        }
    }
}

// Promote finished fade-ins and delete finished fade-outs. Deletions are
// collected first and swept afterwards.
pub fn advance_connection_timers(world: &mut World, params: &SimulationParams, now: f64) {
    let fade = params.connection.fade;
    let mut expired = Vec::new();

    for (key, connection) in world.connections.iter_mut() {
        let elapsed = now - connection.t;
        match connection.state {
            ConnectionState::Connecting if elapsed >= fade => {
                connection.enter(ConnectionState::Connected, now);
            }
            ConnectionState::Disconnecting if elapsed >= fade => {
                expired.push(*key);
            }
            _ => {}
        }
    }

    for key in expired {
        world.connections.remove(&key);
        for id in [key.lo(), key.hi()] {
            let node = world.node_mut(id);
            node.connections = node.connections.saturating_sub(1);
        }
    }
}

/// Steps one node through its lifecycle. Returns whether the node may take
/// part in connection formation this tick.
pub fn advance_lifecycle<R: Rng + ?Sized>(
    node: &mut Node,
    params: &SimulationParams,
    now: f64,
    rng: &mut R,
) -> bool {
    let elapsed = now - node.t;

    match node.state {
        NodeState::Hiding => {
            if elapsed >= node.hide_duration() {
                node.enter(NodeState::Spawning, now);
            }
            false
        }
        NodeState::Spawning => {
            if elapsed >= params.node.spawn_fade {
                node.silence = rng.gen::<f64>();
                node.enter(NodeState::Silent, now);
            }
            false
        }
        NodeState::Silent => {
            let wait = lerp_ms(params.wave.min_wait, params.wave.max_wait, node.silence);
            if params.waves_enabled && elapsed >= wait {
                emit_burst(node, params, now, rng);
                node.enter(NodeState::Emitting, now);
            }
            true
        }
        NodeState::Emitting => {
            let duration = params.wave.duration;
            node.waves.retain(|wave| wave.is_alive(now, duration));

            if node.waves.is_empty() {
                node.silence = rng.gen::<f64>();
                node.enter(NodeState::Silent, now);
            }
            true
        }
    }
}

// Queue a ripple of rings, each a third of a ring's lifetime behind the last
fn emit_burst<R: Rng + ?Sized>(node: &mut Node, params: &SimulationParams, now: f64, rng: &mut R) {
    let min = params.wave.min_count as f64;
    let max = params.wave.max_count as f64;
    let count = lerp_ms(min, max, rng.gen::<f64>()).floor().max(0.0) as usize;
    let stagger = params.wave.duration / 3.0;

    node.waves.extend((0..count).map(|k| Wave { t: now, delay: stagger * k as f64 }));
}

#[inline]
fn in_band(d: f32, params: &SimulationParams) -> bool {
    d >= params.connection.min_distance && d <= params.connection.max_distance
}

/// Brute-force pairwise scan over every eligible pair.
pub fn update_connections(world: &mut World, params: &SimulationParams, eligible: &[bool], now: f64) {
    let count = world.nodes().len();

    for i in 0..count {
        if !eligible[i] {
            continue;
        }
        for j in (i + 1)..count {
            if !eligible[j] {
                continue;
            }

            if !try_connect(world, params, i, j, now) {
                let key = PairKey::new(NodeId(i), NodeId(j));
                if let Some(connection) = world.connections.get_mut(&key) {
                    if connection.state == ConnectionState::Connected {
                        connection.enter(ConnectionState::Disconnecting, now);
                        tracing::trace!(a = i, b = j, "connection dissolving");
                    }
                }
            }
        }
    }
}

// Create a connection if the pair is in range, unconnected and both ends
// have a free slot. Returns whether the pair is in range at all.
fn try_connect(world: &mut World, params: &SimulationParams, i: usize, j: usize, now: f64) -> bool {
    let (nodes, connections) = world.parts_mut();
    let d = nodes[i].distance(&nodes[j]);
    if !in_band(d, params) {
        return false;
    }

    let key = PairKey::new(NodeId(i), NodeId(j));
    let cap = params.connection.max_per_node;
    let free = nodes[i].connections < cap && nodes[j].connections < cap;

    if free && !connections.contains_key(&key) {
        connections.insert(key, Connection::new(key, now));
        nodes[i].connections += 1;
        nodes[j].connections += 1;
        tracing::trace!(a = i, b = j, distance = d, "connection forming");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Bounds;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn still_params() -> SimulationParams {
        let mut params = SimulationParams::default();
        params.node.min_velocity = 0.0;
        params.node.max_velocity = 0.0;
        params.connection.min_distance = 10.0;
        params.connection.max_distance = 50.0;
        params.connection.fade = 100.0;
        params.connection.max_per_node = 2;
        params
    }

    fn silent_node(x: f32, y: f32) -> Node {
        let mut node = Node::new(x, y, 0.0, 0.0, 0.0, 0.0, 0.0);
        node.state = NodeState::Silent;
        // Never emits during these tests
        node.silence = 1.0;
        node
    }

    fn world_with(nodes: Vec<Node>) -> World {
        let mut world = World::new(Bounds::new(500.0, 500.0));
        for node in nodes {
            world.push_node(node);
        }
        world
    }

    #[test]
    fn hiding_node_becomes_spawning_after_hide_duration() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = SimulationParams::default();
        let mut node = Node::new(0.0, 0.0, 0.0, 0.0, 0.0, 300.0, 1000.0);

        assert!(!advance_lifecycle(&mut node, &params, 1299.0, &mut rng));
        assert_eq!(node.state, NodeState::Hiding);

        assert!(!advance_lifecycle(&mut node, &params, 1300.0, &mut rng));
        assert_eq!(node.state, NodeState::Spawning);
        assert_eq!(node.t, 1300.0);
        assert_eq!(node.hide_duration(), 300.0);
    }

    #[test]
    fn spawning_node_settles_after_fade() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = SimulationParams::default();
        let mut node = Node::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        node.enter(NodeState::Spawning, 0.0);

        advance_lifecycle(&mut node, &params, params.node.spawn_fade - 1.0, &mut rng);
        assert_eq!(node.state, NodeState::Spawning);

        // The tick that settles the node still does not let it connect
        assert!(!advance_lifecycle(&mut node, &params, params.node.spawn_fade, &mut rng));
        assert_eq!(node.state, NodeState::Silent);
        assert!((0.0..1.0).contains(&node.silence));
    }

    #[test]
    fn silent_node_emits_staggered_burst() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut params = SimulationParams::default();
        params.wave.min_wait = 100.0;
        params.wave.max_wait = 100.0;
        params.wave.min_count = 3;
        params.wave.max_count = 3;
        params.wave.duration = 900.0;

        let mut node = silent_node(0.0, 0.0);
        node.t = 0.0;
        assert!(advance_lifecycle(&mut node, &params, 99.0, &mut rng));
        assert_eq!(node.state, NodeState::Silent);

        advance_lifecycle(&mut node, &params, 100.0, &mut rng);
        assert_eq!(node.state, NodeState::Emitting);
        let delays: Vec<f64> = node.waves.iter().map(|w| w.delay).collect();
        assert_eq!(delays, vec![0.0, 300.0, 600.0]);
        assert!(node.waves.iter().all(|w| w.t == 100.0));
    }

    #[test]
    fn waves_disabled_keeps_node_silent() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut params = SimulationParams::default();
        params.waves_enabled = false;
        let mut node = silent_node(0.0, 0.0);
        advance_lifecycle(&mut node, &params, 1.0e9, &mut rng);
        assert_eq!(node.state, NodeState::Silent);
        assert!(node.waves.is_empty());
    }

    #[test]
    fn emitting_node_drops_expired_waves_then_goes_silent() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut params = SimulationParams::default();
        params.wave.duration = 300.0;

        let mut node = silent_node(0.0, 0.0);
        node.enter(NodeState::Emitting, 0.0);
        node.waves = vec![Wave { t: 0.0, delay: 0.0 }, Wave { t: 0.0, delay: 100.0 }];

        advance_lifecycle(&mut node, &params, 350.0, &mut rng);
        assert_eq!(node.state, NodeState::Emitting);
        assert_eq!(node.waves, vec![Wave { t: 0.0, delay: 100.0 }]);

        advance_lifecycle(&mut node, &params, 400.0, &mut rng);
        assert_eq!(node.state, NodeState::Emitting);

        advance_lifecycle(&mut node, &params, 401.0, &mut rng);
        assert_eq!(node.state, NodeState::Silent);
        assert!(node.waves.is_empty());
        assert_eq!(node.t, 401.0);
    }

    #[test]
    fn empty_burst_returns_to_silent_next_tick() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut params = SimulationParams::default();
        params.wave.min_count = 0;
        params.wave.max_count = 0;
        params.wave.min_wait = 0.0;
        params.wave.max_wait = 0.0;

        let mut node = silent_node(0.0, 0.0);
        advance_lifecycle(&mut node, &params, 10.0, &mut rng);
        assert_eq!(node.state, NodeState::Emitting);
        advance_lifecycle(&mut node, &params, 20.0, &mut rng);
        assert_eq!(node.state, NodeState::Silent);
    }

    #[test]
    fn nodes_in_band_connect_and_count() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut world = world_with(vec![silent_node(0.0, 0.0), silent_node(20.0, 0.0)]);
        let mut engine = Engine::new(&params, &world);

        engine.step(&mut world, &params, 0.0, &mut rng);

        let conn = world.connection(NodeId(0), NodeId(1)).unwrap();
        assert_eq!(conn.state, ConnectionState::Connecting);
        assert_eq!(world.node(NodeId(0)).connections, 1);
        assert_eq!(world.node(NodeId(1)).connections, 1);
    }

    #[test]
    fn nodes_exactly_max_distance_apart_connect() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut world = world_with(vec![
            silent_node(0.0, 0.0),
            silent_node(50.0, 0.0),
            silent_node(0.0, 50.5),
        ]);
        let mut engine = Engine::new(&params, &world);

        engine.step(&mut world, &params, 0.0, &mut rng);
        assert!(world.connection(NodeId(0), NodeId(1)).is_some());
        assert!(world.connection(NodeId(0), NodeId(2)).is_none());
    }

    #[test]
    fn tiny_connection_distance_runs_on_both_paths() {
        let mut params = still_params();
        params.connection.min_distance = 0.0;
        params.connection.max_distance = 0.05;

        for spatial_grid in [false, true] {
            params.spatial_grid = spatial_grid;
            let mut rng = SmallRng::seed_from_u64(0);
            let mut world = World::new(Bounds::new(960.0, 540.0));
            world.push_node(silent_node(0.0, 0.0));
            world.push_node(silent_node(0.04, 0.0));
            world.push_node(silent_node(400.0, 200.0));
            let mut engine = Engine::new(&params, &world);

            engine.step(&mut world, &params, 0.0, &mut rng);
            assert_eq!(world.connections.len(), 1, "spatial_grid = {spatial_grid}");
            assert!(world.connection(NodeId(0), NodeId(1)).is_some());
        }
    }

    #[test]
    fn too_close_nodes_do_not_connect() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut world = world_with(vec![silent_node(0.0, 0.0), silent_node(5.0, 0.0)]);
        let mut engine = Engine::new(&params, &world);

        engine.step(&mut world, &params, 0.0, &mut rng);
        assert!(world.connections.is_empty());
    }

    #[test]
    fn hiding_and_spawning_nodes_are_never_connected() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut hidden = Node::new(20.0, 0.0, 0.0, 0.0, 0.0, 1.0e9, 0.0);
        hidden.state = NodeState::Hiding;
        let mut appearing = Node::new(0.0, 20.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        appearing.enter(NodeState::Spawning, 0.0);

        let mut world = world_with(vec![silent_node(0.0, 0.0), hidden, appearing]);
        let mut engine = Engine::new(&params, &world);
        engine.step(&mut world, &params, 10.0, &mut rng);

        assert!(world.connections.is_empty());
        assert!(world.nodes().iter().all(|n| n.connections == 0));
    }

    #[test]
    fn cap_goes_to_lowest_pairs_first() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        // Node 0 has three neighbours in range but room for two
        let mut world = world_with(vec![
            silent_node(0.0, 0.0),
            silent_node(20.0, 0.0),
            silent_node(-20.0, 0.0),
            silent_node(0.0, 20.0),
        ]);
        let mut engine = Engine::new(&params, &world);
        engine.step(&mut world, &params, 0.0, &mut rng);

        assert!(world.connection(NodeId(0), NodeId(1)).is_some());
        assert!(world.connection(NodeId(0), NodeId(2)).is_some());
        assert!(world.connection(NodeId(0), NodeId(3)).is_none());
        assert_eq!(world.node(NodeId(0)).connections, 2);
        assert!(world.nodes().iter().all(|n| n.connections <= params.connection.max_per_node));
    }

    #[test]
    fn connection_fades_in_then_dissolves_when_apart() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut world = world_with(vec![silent_node(0.0, 0.0), silent_node(20.0, 0.0)]);
        let mut engine = Engine::new(&params, &world);

        engine.step(&mut world, &params, 0.0, &mut rng);
        engine.step(&mut world, &params, 100.0, &mut rng);
        assert_eq!(world.connection(NodeId(0), NodeId(1)).unwrap().state, ConnectionState::Connected);

        world.node_mut(NodeId(1)).x = 80.0;
        engine.step(&mut world, &params, 140.0, &mut rng);
        let conn = world.connection(NodeId(0), NodeId(1)).unwrap();
        assert_eq!(conn.state, ConnectionState::Disconnecting);
        assert_eq!(conn.t, 140.0);
        // Still counted while fading out
        assert_eq!(world.node(NodeId(0)).connections, 1);

        engine.step(&mut world, &params, 239.0, &mut rng);
        assert!(world.connection(NodeId(0), NodeId(1)).is_some());

        engine.step(&mut world, &params, 240.0, &mut rng);
        assert!(world.connection(NodeId(0), NodeId(1)).is_none());
        assert_eq!(world.node(NodeId(0)).connections, 0);
        assert_eq!(world.node(NodeId(1)).connections, 0);
    }

    #[test]
    fn connecting_connection_survives_leaving_the_band() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = still_params();
        let mut world = world_with(vec![silent_node(0.0, 0.0), silent_node(20.0, 0.0)]);
        let mut engine = Engine::new(&params, &world);

        engine.step(&mut world, &params, 0.0, &mut rng);
        world.node_mut(NodeId(1)).x = 80.0;
        engine.step(&mut world, &params, 50.0, &mut rng);
        assert_eq!(world.connection(NodeId(0), NodeId(1)).unwrap().state, ConnectionState::Connecting);

        // Promoted first, then dissolved in the same tick
        engine.step(&mut world, &params, 100.0, &mut rng);
        assert_eq!(world.connection(NodeId(0), NodeId(1)).unwrap().state, ConnectionState::Disconnecting);
    }

    #[test]
    fn disabling_connections_drops_everything() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut params = still_params();
        let mut world = world_with(vec![silent_node(0.0, 0.0), silent_node(20.0, 0.0)]);
        let mut engine = Engine::new(&params, &world);
        engine.step(&mut world, &params, 0.0, &mut rng);
        assert_eq!(world.connections.len(), 1);

        params.connections_enabled = false;
        engine.step(&mut world, &params, 10.0, &mut rng);
        assert!(world.connections.is_empty());
        assert!(world.nodes().iter().all(|n| n.connections == 0));
    }

    #[test]
    fn grid_and_brute_force_agree() {
        let mut params = SimulationParams::default();
        params.spawn_steps = vec![crate::params::SpawnStep::new(0.0, 1.0, 120)];
        params.node.spawn_fade = 0.0;
        params.wave.min_wait = 200.0;
        params.wave.max_wait = 800.0;
        params.wave.duration = 300.0;
        params.connection.max_per_node = 2;

        let mut grid_params = params.clone();
        grid_params.spatial_grid = true;

        let build = || {
            let mut rng = SmallRng::seed_from_u64(99);
            let mut world = World::new(Bounds::new(400.0, 300.0));
            let mut spawner = crate::spawner::Spawner::new(&params.spawn_steps);
            spawner.spawn_next(&mut world, 0.0, &mut rng);
            (world, rng)
        };

        let (mut brute_world, mut brute_rng) = build();
        let (mut grid_world, mut grid_rng) = build();
        let mut brute = Engine::new(&params, &brute_world);
        let mut grid = Engine::new(&grid_params, &grid_world);

        for tick in 0..400 {
            let now = tick as f64 * 40.0;
            brute.step(&mut brute_world, &params, now, &mut brute_rng);
            grid.step(&mut grid_world, &grid_params, now, &mut grid_rng);
        }

        assert!(!brute_world.connections.is_empty());
        assert_eq!(brute_world.connections, grid_world.connections);
        let brute_counts: Vec<u32> = brute_world.nodes().iter().map(|n| n.connections).collect();
        let grid_counts: Vec<u32> = grid_world.nodes().iter().map(|n| n.connections).collect();
        assert_eq!(brute_counts, grid_counts);
    }
}
