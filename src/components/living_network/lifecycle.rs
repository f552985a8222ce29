//! Runtime spawn, destroy and ephemeral cross-link policies.
//!
//! Each process owns a time accumulator advanced by `dt × churn` and fires
//! once per interval crossed, so a long frame can fire several times.

use glam::Vec2;
use log::trace;
use rand::Rng;

use super::config::LifecycleConfig;
use super::graph::Graph;
use super::rng::SceneRng;
use super::types::{BufferSlot, Edge, EdgeId, Fade, Layer, Node, NodeId, NodeKind};

/// Picks a cluster index given each cluster's live population.
pub type ClusterPicker = fn(&[usize], &mut SceneRng) -> usize;

/// Picks an index into destroy candidates sorted oldest first.
pub type VictimPicker = fn(usize, &LifecycleConfig, &mut SceneRng) -> usize;

/// Roulette selection weighted by `max_population − population + 1`, so
/// smaller clusters are favored.
pub fn inverse_population(populations: &[usize], rng: &mut SceneRng) -> usize {
	let max = populations.iter().copied().max().unwrap_or(0).max(1);
	let weights: Vec<usize> = populations.iter().map(|&s| max - s + 1).collect();
	let total: usize = weights.iter().sum();
	let mut r = rng.next_f64() * total as f64;
	for (i, &w) in weights.iter().enumerate() {
		r -= w as f64;
		if r <= 0.0 {
			return i;
		}
	}
	0
}

/// Uniform pick among the oldest `destroy_oldest_k` candidates.
pub fn oldest_biased(candidates: usize, cfg: &LifecycleConfig, rng: &mut SceneRng) -> usize {
	rng.random_range(0..cfg.destroy_oldest_k.clamp(1, candidates.max(1)))
}

#[derive(Clone, Copy, Debug)]
pub struct Policies {
	pub pick_cluster: ClusterPicker,
	pub pick_victim: VictimPicker,
}

impl Default for Policies {
	fn default() -> Self {
		Self {
			pick_cluster: inverse_population,
			pick_victim: oldest_biased,
		}
	}
}

/// What one round of accumulator processing did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifecycleReport {
	pub spawned: usize,
	pub destroyed: usize,
	pub linked: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
	pub policies: Policies,
	spawn_accum: f32,
	destroy_accum: f32,
	link_accum: f32,
}

impl Lifecycle {
	pub fn new(policies: Policies) -> Self {
		Self {
			policies,
			..Self::default()
		}
	}

	pub fn advance(
		&mut self,
		graph: &mut Graph,
		cfg: &LifecycleConfig,
		rng: &mut SceneRng,
		dt: f32,
		churn: f32,
	) -> LifecycleReport {
		let step = dt * churn;
		let mut report = LifecycleReport::default();

		self.spawn_accum += step;
		while self.spawn_accum >= cfg.spawn_interval {
			self.spawn_accum -= cfg.spawn_interval;
			report.spawned += usize::from(self.spawn_node(graph, cfg, rng).is_some());
		}

		self.destroy_accum += step;
		while self.destroy_accum >= cfg.destroy_interval {
			self.destroy_accum -= cfg.destroy_interval;
			report.destroyed += usize::from(self.destroy_node(graph, cfg, rng).is_some());
		}

		self.link_accum += step;
		while self.link_accum >= cfg.cross_link_interval {
			self.link_accum -= cfg.cross_link_interval;
			report.linked += usize::from(spawn_cross_link(graph, cfg, rng).is_some());
		}

		report
	}

	/// Adds a regular node near a cluster's live centroid and wires it to its
	/// nearest live cluster mates. Skipped when the dynamic layer is full.
	pub fn spawn_node(
		&self,
		graph: &mut Graph,
		cfg: &LifecycleConfig,
		rng: &mut SceneRng,
	) -> Option<NodeId> {
		let (dynamic_nodes, _) = graph.dynamic_counts();
		if dynamic_nodes >= cfg.max_dynamic_nodes || graph.clusters.is_empty() {
			trace!("spawn skipped: {dynamic_nodes} dynamic nodes");
			return None;
		}

		let populations = graph.cluster_populations();
		let ci = (self.policies.pick_cluster)(&populations, rng).min(graph.clusters.len() - 1);
		let center = graph.clusters[ci].centroid;
		let angle = rng.angle();
		let dist = rng.range(cfg.spawn_radius.0, cfg.spawn_radius.1);
		let xy = center + Vec2::from_angle(angle) * dist;
		let z = rng.centered(cfg.spawn_depth);
		let size = rng.range(cfg.node_size.0, cfg.node_size.1);
		let base_opacity = rng.range(cfg.node_opacity.0, cfg.node_opacity.1);
		let fade_in = rng.range(cfg.node_fade_in.0, cfg.node_fade_in.1);
		let fade_out = rng.range(cfg.node_fade_out.0, cfg.node_fade_out.1);

		let id = graph.add_node(Node {
			position: xy.extend(z),
			velocity: Vec2::ZERO,
			kind: NodeKind::Regular,
			cluster: Some(ci),
			size,
			base_opacity,
			life: Fade::newborn(fade_in, fade_out),
			slot: BufferSlot::unassigned(Layer::DynamicPoints),
		});

		let mut nearby: Vec<(NodeId, f32)> = graph
			.nodes
			.iter()
			.enumerate()
			.filter(|&(i, n)| i != id && n.cluster == Some(ci) && n.life.is_live())
			.map(|(i, n)| (i, n.xy().distance_squared(xy)))
			.collect();
		nearby.sort_by(|a, b| a.1.total_cmp(&b.1));

		let wanted = rng.random_range(cfg.spawn_edges.0..=cfg.spawn_edges.1);
		let mut linked = 0;
		for (other, _) in nearby {
			if linked >= wanted {
				break;
			}
			if graph.are_adjacent(id, other) {
				continue;
			}
			let (_, dynamic_edges) = graph.dynamic_counts();
			if dynamic_edges >= cfg.max_dynamic_edges {
				break;
			}
			let edge = Edge {
				a: id,
				b: other,
				life: Fade::newborn(
					rng.range(cfg.edge_fade_in.0, cfg.edge_fade_in.1),
					rng.range(cfg.edge_fade_out.0, cfg.edge_fade_out.1),
				),
				max_age: None,
				highlight: cfg.edge_highlight,
				slot: BufferSlot::unassigned(Layer::DynamicEdges),
			};
			if graph.add_edge(edge).is_some() {
				linked += 1;
			}
		}

		trace!("spawned node {id} in cluster {ci} with {linked} edges");
		Some(id)
	}

	/// Starts the fade-out of an old regular node, unless that would take the
	/// live regular population to the floor.
	pub fn destroy_node(
		&self,
		graph: &mut Graph,
		cfg: &LifecycleConfig,
		rng: &mut SceneRng,
	) -> Option<NodeId> {
		let population = graph
			.nodes
			.iter()
			.filter(|n| n.kind == NodeKind::Regular && n.life.is_live())
			.count();
		if population <= cfg.population_floor + 1 {
			trace!("destroy skipped: population {population} at floor");
			return None;
		}

		let mut candidates = destroy_candidates(graph, cfg);
		if candidates.is_empty() {
			return None;
		}
		candidates.sort_by(|&a, &b| graph.nodes[b].life.age.total_cmp(&graph.nodes[a].life.age));
		let pick = (self.policies.pick_victim)(candidates.len(), cfg, rng).min(candidates.len() - 1);
		let victim = candidates[pick];
		graph.begin_node_death(victim).then(|| {
			trace!("node {victim} dying at age {}", graph.nodes[victim].life.age);
			victim
		})
	}
}

/// Live regular nodes old enough to be destroyed, in index order.
pub fn destroy_candidates(graph: &Graph, cfg: &LifecycleConfig) -> Vec<NodeId> {
	graph
		.nodes
		.iter()
		.enumerate()
		.filter(|(_, n)| {
			n.kind == NodeKind::Regular && n.life.is_live() && n.life.age > cfg.destroy_min_age
		})
		.map(|(i, _)| i)
		.collect()
}

/// Links two live clustered nodes from different clusters with a short-lived,
/// highlighted edge.
pub fn spawn_cross_link(
	graph: &mut Graph,
	cfg: &LifecycleConfig,
	rng: &mut SceneRng,
) -> Option<EdgeId> {
	let (_, dynamic_edges) = graph.dynamic_counts();
	if dynamic_edges >= cfg.max_dynamic_edges {
		return None;
	}

	let live: Vec<(NodeId, usize)> = graph
		.nodes
		.iter()
		.enumerate()
		.filter(|(_, n)| n.life.is_live())
		.filter_map(|(i, n)| n.cluster.map(|c| (i, c)))
		.collect();
	if live.len() < 2 {
		return None;
	}

	let (a, cluster) = live[rng.index(live.len())];
	let others: Vec<NodeId> = live
		.iter()
		.filter(|&&(_, c)| c != cluster)
		.map(|&(i, _)| i)
		.collect();
	if others.is_empty() {
		return None;
	}
	let b = others[rng.index(others.len())];
	if graph.are_adjacent(a, b) {
		return None;
	}

	let fade_in = rng.range(cfg.link_fade_in.0, cfg.link_fade_in.1);
	let fade_out = rng.range(cfg.link_fade_out.0, cfg.link_fade_out.1);
	let lifetime = rng.range(cfg.link_lifetime.0, cfg.link_lifetime.1);
	let id = graph.add_edge(Edge {
		a,
		b,
		life: Fade::newborn(fade_in, fade_out),
		max_age: Some(lifetime),
		highlight: cfg.link_highlight,
		slot: BufferSlot::unassigned(Layer::DynamicEdges),
	})?;
	trace!("cross-link {id}: {a} <-> {b} for {lifetime:.1}s");
	Some(id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::living_network::builder;
	use crate::components::living_network::config::SceneConfig;

	fn setup() -> (Graph, SceneConfig, SceneRng) {
		let config = SceneConfig::default();
		let mut rng = SceneRng::new(config.seed);
		let graph = builder::build(&config, &mut rng);
		(graph, config, rng)
	}

	fn live_regulars(graph: &Graph) -> usize {
		graph
			.nodes
			.iter()
			.filter(|n| n.kind == NodeKind::Regular && n.life.is_live())
			.count()
	}

	#[test]
	fn inverse_population_favors_small_clusters() {
		let mut rng = SceneRng::new(9);
		let mut hits = [0usize; 3];
		for _ in 0..3000 {
			hits[inverse_population(&[20, 20, 2], &mut rng)] += 1;
		}
		assert!(hits[2] > hits[0] && hits[2] > hits[1]);
	}

	#[test]
	fn inverse_population_handles_empty_clusters() {
		let mut rng = SceneRng::new(9);
		for _ in 0..100 {
			assert!(inverse_population(&[0, 0], &mut rng) < 2);
		}
	}

	#[test]
	fn oldest_biased_stays_in_window() {
		let cfg = LifecycleConfig::default();
		let mut rng = SceneRng::new(5);
		for _ in 0..500 {
			assert!(oldest_biased(100, &cfg, &mut rng) < cfg.destroy_oldest_k);
			assert!(oldest_biased(3, &cfg, &mut rng) < 3);
		}
	}

	#[test]
	fn spawned_node_connects_to_its_cluster() {
		let (mut graph, config, mut rng) = setup();
		let lifecycle = Lifecycle::default();
		let id = lifecycle
			.spawn_node(&mut graph, &config.lifecycle, &mut rng)
			.expect("capacity available");
		let node = &graph.nodes[id];
		assert_eq!(node.kind, NodeKind::Regular);
		assert_eq!(node.slot.layer, Layer::DynamicPoints);
		let degree = graph.neighbors(id).len();
		assert!((2..=4).contains(&degree));
		for &j in graph.neighbors(id) {
			assert_eq!(graph.nodes[j].cluster, node.cluster);
		}
		assert!(graph.is_consistent());
	}

	#[test]
	fn spawn_depth_bounds_node_depth() {
		let (mut graph, mut config, mut rng) = setup();
		let lifecycle = Lifecycle::default();
		for _ in 0..20 {
			let id = lifecycle
				.spawn_node(&mut graph, &config.lifecycle, &mut rng)
				.expect("capacity available");
			assert!(graph.nodes[id].position.z.abs() <= config.lifecycle.spawn_depth);
		}
		config.lifecycle.spawn_depth = 0.0;
		let flat = lifecycle
			.spawn_node(&mut graph, &config.lifecycle, &mut rng)
			.expect("capacity available");
		assert_eq!(graph.nodes[flat].position.z, 0.0);
	}

	#[test]
	fn spawn_respects_node_capacity() {
		let (mut graph, mut config, mut rng) = setup();
		config.lifecycle.max_dynamic_nodes = 3;
		let lifecycle = Lifecycle::default();
		for _ in 0..10 {
			lifecycle.spawn_node(&mut graph, &config.lifecycle, &mut rng);
		}
		assert_eq!(graph.dynamic_counts().0, 3);
	}

	#[test]
	fn spawn_respects_edge_capacity() {
		let (mut graph, mut config, mut rng) = setup();
		config.lifecycle.max_dynamic_edges = 5;
		let lifecycle = Lifecycle::default();
		for _ in 0..10 {
			lifecycle.spawn_node(&mut graph, &config.lifecycle, &mut rng);
			spawn_cross_link(&mut graph, &config.lifecycle, &mut rng);
		}
		assert!(graph.dynamic_counts().1 <= 5);
	}

	#[test]
	fn fresh_nodes_are_never_destroyed() {
		let (mut graph, config, mut rng) = setup();
		let lifecycle = Lifecycle::default();
		let fresh = lifecycle
			.spawn_node(&mut graph, &config.lifecycle, &mut rng)
			.expect("capacity available");
		graph.age_all(config.lifecycle.destroy_min_age * 0.5);
		for _ in 0..20 {
			let victim = lifecycle.destroy_node(&mut graph, &config.lifecycle, &mut rng);
			assert_ne!(victim, Some(fresh));
		}
		assert!(!destroy_candidates(&graph, &config.lifecycle).contains(&fresh));
		assert!(!graph.nodes[fresh].life.dying);
	}

	fn last_cluster(populations: &[usize], _rng: &mut SceneRng) -> usize {
		populations.len() - 1
	}

	fn oldest_only(_candidates: usize, _cfg: &LifecycleConfig, _rng: &mut SceneRng) -> usize {
		0
	}

	#[test]
	fn replacement_policies_are_honored() {
		let (mut graph, config, mut rng) = setup();
		for (i, node) in graph.nodes.iter_mut().enumerate() {
			node.life.age = 10.0 + i as f32;
		}
		let lifecycle = Lifecycle::new(Policies {
			pick_cluster: last_cluster,
			pick_victim: oldest_only,
		});
		let last = graph.clusters.len() - 1;
		for _ in 0..5 {
			let id = lifecycle
				.spawn_node(&mut graph, &config.lifecycle, &mut rng)
				.expect("capacity available");
			assert_eq!(graph.nodes[id].cluster, Some(last));
		}

		let oldest = destroy_candidates(&graph, &config.lifecycle)
			.into_iter()
			.max_by(|&a, &b| graph.nodes[a].life.age.total_cmp(&graph.nodes[b].life.age))
			.unwrap();
		let victim = lifecycle.destroy_node(&mut graph, &config.lifecycle, &mut rng);
		assert_eq!(victim, Some(oldest));
	}

	#[test]
	fn destroy_picks_among_oldest() {
		let (mut graph, config, mut rng) = setup();
		for (i, node) in graph.nodes.iter_mut().enumerate() {
			node.life.age = 10.0 + i as f32;
		}
		let mut sorted = destroy_candidates(&graph, &config.lifecycle);
		sorted.sort_by(|&a, &b| graph.nodes[b].life.age.total_cmp(&graph.nodes[a].life.age));
		let oldest = &sorted[..config.lifecycle.destroy_oldest_k];
		let victim = Lifecycle::default()
			.destroy_node(&mut graph, &config.lifecycle, &mut rng)
			.expect("population above floor");
		assert!(oldest.contains(&victim));
	}

	#[test]
	fn destroy_never_reaches_population_floor() {
		let (mut graph, config, mut rng) = setup();
		let lifecycle = Lifecycle::default();
		for _ in 0..200 {
			lifecycle.destroy_node(&mut graph, &config.lifecycle, &mut rng);
			assert!(live_regulars(&graph) > config.lifecycle.population_floor);
		}
		assert_eq!(live_regulars(&graph), config.lifecycle.population_floor + 1);
	}

	#[test]
	fn destroying_a_node_kills_its_edges() {
		let (mut graph, config, mut rng) = setup();
		let victim = Lifecycle::default()
			.destroy_node(&mut graph, &config.lifecycle, &mut rng)
			.expect("population above floor");
		for edge in graph.edges.iter().filter(|e| e.touches(victim)) {
			assert!(edge.life.dying);
			assert_eq!(edge.life.death_age, edge.life.age);
		}
	}

	#[test]
	fn cross_links_join_different_clusters() {
		let (mut graph, config, mut rng) = setup();
		let mut made = 0;
		for _ in 0..20 {
			if let Some(id) = spawn_cross_link(&mut graph, &config.lifecycle, &mut rng) {
				let edge = &graph.edges[id];
				assert_ne!(graph.nodes[edge.a].cluster, graph.nodes[edge.b].cluster);
				let lifetime = edge.max_age.expect("cross-links are finite");
				assert!(lifetime >= config.lifecycle.link_lifetime.0);
				assert!(lifetime < config.lifecycle.link_lifetime.1);
				assert_eq!(edge.highlight, config.lifecycle.link_highlight);
				made += 1;
			}
		}
		assert!(made > 0);
		assert!(graph.is_consistent());
	}

	#[test]
	fn accumulators_fire_per_interval_crossed() {
		let (mut graph, config, mut rng) = setup();
		let mut lifecycle = Lifecycle::default();
		let cfg = config.lifecycle;
		// One long frame crosses the spawn interval three times.
		let dt = cfg.spawn_interval * 3.0 + 0.01;
		let report = lifecycle.advance(&mut graph, &cfg, &mut rng, dt, 1.0);
		assert_eq!(report.spawned, 3);
		let none = lifecycle.advance(&mut graph, &cfg, &mut rng, 0.0, 1.0);
		assert_eq!(none, LifecycleReport::default());
	}

	#[test]
	fn churn_scales_accumulators() {
		let (mut graph, config, mut rng) = setup();
		let mut lifecycle = Lifecycle::default();
		let cfg = config.lifecycle;
		let report = lifecycle.advance(&mut graph, &cfg, &mut rng, cfg.spawn_interval / 2.0, 2.0);
		assert_eq!(report.spawned, 1);
	}
}
