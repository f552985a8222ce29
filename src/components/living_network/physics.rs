//! Per-frame force integration.
//!
//! Clustered nodes feel three forces: their cluster's drift, a pull toward
//! the centroid of their live neighbors, and a weaker pull toward the live
//! cluster centroid. The neighbor pull dominates, so adding a cross-cluster
//! edge drags both endpoints toward each other, and severing it lets the
//! same-cluster neighbors pull the node home again.
//!
//! Bridge and peripheral nodes only feel a reduced neighbor pull.

use glam::Vec2;

use super::config::PhysicsConfig;
use super::graph::Graph;
use super::rng::SceneRng;
use super::types::NodeId;

#[derive(Clone, Debug, Default)]
pub struct Physics {
	drift_timer: f32,
}

impl Physics {
	pub fn step(&mut self, graph: &mut Graph, cfg: &PhysicsConfig, rng: &mut SceneRng, dt: f32) {
		for i in 0..graph.nodes.len() {
			if !graph.nodes[i].life.is_live() {
				continue;
			}
			match graph.nodes[i].cluster {
				Some(ci) => integrate_clustered(graph, cfg, i, ci, dt),
				None => integrate_unclustered(graph, cfg, i, dt),
			}
		}

		graph.recompute_centroids();

		self.drift_timer += dt;
		if self.drift_timer > cfg.drift_interval {
			self.drift_timer = 0.0;
			for cluster in graph.clusters.iter_mut() {
				let turn = rng.centered(cfg.drift_max_turn);
				cluster.drift = Vec2::from_angle(turn).rotate(cluster.drift);
			}
		}
	}
}

/// Pull toward the live-neighbor centroid, zero inside the dead-zone.
fn neighbor_pull(graph: &Graph, cfg: &PhysicsConfig, i: NodeId) -> Vec2 {
	let Some(target) = graph.neighbor_centroid(i) else {
		return Vec2::ZERO;
	};
	let to = target - graph.nodes[i].xy();
	let d = to.length();
	if d > cfg.edge_dead_zone {
		to * cfg.edge_attract * (d / cfg.edge_falloff)
	} else {
		Vec2::ZERO
	}
}

fn integrate_clustered(graph: &mut Graph, cfg: &PhysicsConfig, i: NodeId, ci: usize, dt: f32) {
	let Some(cluster) = graph.clusters.get(ci) else {
		return;
	};
	let drift = cluster.drift;
	let to_center = cluster.centroid - graph.nodes[i].xy();
	let dist = to_center.length();
	let gravity = if dist > cfg.cluster_dead_zone {
		to_center * cfg.cluster_attract * (dist / cfg.cluster_falloff)
	} else {
		Vec2::ZERO
	};
	let force = drift + neighbor_pull(graph, cfg, i) + gravity;

	let node = &mut graph.nodes[i];
	node.velocity = (node.velocity + force * dt) * cfg.damping;
	node.position += (node.velocity * dt).extend(0.0);
}

fn integrate_unclustered(graph: &mut Graph, cfg: &PhysicsConfig, i: NodeId, dt: f32) {
	let d = graph.neighbor_centroid(i).map_or(Vec2::ZERO, |target| {
		target - graph.nodes[i].xy()
	});
	let pull = if d.length() > cfg.edge_dead_zone {
		d * cfg.edge_attract * cfg.unclustered_scale
	} else {
		Vec2::ZERO
	};

	let node = &mut graph.nodes[i];
	node.velocity += pull * dt;
	node.position += (node.velocity * dt).extend(0.0);
	node.velocity *= cfg.unclustered_damping;
}
