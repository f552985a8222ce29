//! One-shot construction of the initial clustered graph.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use log::debug;

use super::config::SceneConfig;
use super::graph::Graph;
use super::rng::SceneRng;
use super::types::{BufferSlot, Cluster, Edge, Fade, Layer, Node, NodeId, NodeKind};

const HUB_EDGE_CHANCE: f64 = 0.55;
const CHAIN_EDGE_CHANCE: f64 = 0.65;
const CROSS_EDGE_CHANCE: f64 = 0.10;
const SATELLITE_JITTER: f32 = 0.3;
const SATELLITE_DEPTH: f32 = 9.0;
const NODE_FADE_OUT: f32 = 1.5;
const PERIPHERAL_FADE_OUT: f32 = 2.0;

/// Builds the construction-time graph deterministically from `rng`.
pub fn build(config: &SceneConfig, rng: &mut SceneRng) -> Graph {
	let clusters = config
		.clusters
		.iter()
		.map(|spec| Cluster {
			anchor: spec.anchor,
			spread: spec.spread,
			centroid: spec.anchor.truncate(),
			drift: Vec2::ZERO,
		})
		.collect();
	let mut graph = Graph::new(clusters);

	let mut ranges = Vec::with_capacity(config.clusters.len());
	for (ci, spec) in config.clusters.iter().enumerate() {
		let start = graph.add_node(Node {
			position: spec.anchor,
			velocity: Vec2::ZERO,
			kind: NodeKind::Hub,
			cluster: Some(ci),
			size: 7.0,
			base_opacity: 1.0,
			life: Fade::established(NODE_FADE_OUT),
			slot: BufferSlot::unassigned(Layer::StaticPoints),
		});

		let satellites = spec.count.saturating_sub(1);
		for i in 0..satellites {
			let angle = i as f32 / satellites as f32 * TAU + rng.centered(SATELLITE_JITTER);
			let radius = spec.spread * rng.range(0.35, 1.0);
			let offset = Vec3::new(
				angle.cos() * radius,
				angle.sin() * radius,
				rng.centered(SATELLITE_DEPTH),
			);
			let size = rng.range(4.0, 7.0);
			let base_opacity = rng.range(0.6, 1.0);
			graph.add_node(Node {
				position: spec.anchor + offset,
				velocity: Vec2::ZERO,
				kind: NodeKind::Regular,
				cluster: Some(ci),
				size,
				base_opacity,
				life: Fade::established(NODE_FADE_OUT),
				slot: BufferSlot::unassigned(Layer::StaticPoints),
			});
		}
		ranges.push(start..graph.nodes.len());
	}

	let bridges: Vec<NodeId> = config
		.bridges
		.iter()
		.map(|spec| {
			graph.add_node(Node {
				position: spec.position,
				velocity: Vec2::ZERO,
				kind: NodeKind::Bridge,
				cluster: None,
				size: 10.0,
				base_opacity: 1.0,
				life: Fade::established(NODE_FADE_OUT),
				slot: BufferSlot::unassigned(Layer::BridgePoints),
			})
		})
		.collect();

	for &position in &config.peripherals {
		graph.add_node(Node {
			position,
			velocity: Vec2::ZERO,
			kind: NodeKind::Peripheral,
			cluster: None,
			size: 3.0,
			base_opacity: 0.4,
			life: Fade::established(PERIPHERAL_FADE_OUT),
			slot: BufferSlot::unassigned(Layer::PeripheralPoints),
		});
	}

	for range in &ranges {
		let (hub, end) = (range.start, range.end);
		for i in hub + 1..end {
			if rng.next_f64() < HUB_EDGE_CHANCE {
				connect(&mut graph, rng, hub, i);
			}
		}
		for i in hub + 1..end.saturating_sub(1) {
			if rng.next_f64() < CHAIN_EDGE_CHANCE {
				connect(&mut graph, rng, i, i + 1);
			}
		}
		for i in hub + 1..end {
			for j in i + 2..end {
				if rng.next_f64() < CROSS_EDGE_CHANCE {
					connect(&mut graph, rng, i, j);
				}
			}
		}
	}

	for (spec, &bridge) in config.bridges.iter().zip(&bridges) {
		let origin = graph.nodes[bridge].xy();
		for &ci in &spec.connects {
			let Some(range) = ranges.get(ci) else {
				continue;
			};
			let mut candidates: Vec<NodeId> = range
				.clone()
				.filter(|&i| graph.nodes[i].life.is_live())
				.collect();
			candidates.sort_by(|&a, &b| {
				let da = graph.nodes[a].xy().distance_squared(origin);
				let db = graph.nodes[b].xy().distance_squared(origin);
				da.total_cmp(&db)
			});
			for &target in candidates.iter().take(config.bridge_fan_out) {
				connect(&mut graph, rng, bridge, target);
			}
		}
	}

	for (k, &a) in bridges.iter().enumerate() {
		for &b in &bridges[k + 1..] {
			connect(&mut graph, rng, a, b);
		}
	}

	let magnitude = config.physics.drift_magnitude;
	for cluster in graph.clusters.iter_mut() {
		cluster.drift = Vec2::from_angle(rng.angle()) * magnitude;
	}
	graph.recompute_centroids();

	debug!(
		"built network: {} clusters, {} nodes, {} edges",
		graph.clusters.len(),
		graph.nodes.len(),
		graph.edges.len()
	);
	graph
}

fn connect(graph: &mut Graph, rng: &mut SceneRng, a: NodeId, b: NodeId) {
	if a == b || graph.are_adjacent(a, b) {
		return;
	}
	let touches_bridge = [a, b]
		.iter()
		.any(|&i| graph.nodes[i].kind == NodeKind::Bridge);
	let layer = if touches_bridge {
		Layer::BridgeEdges
	} else {
		Layer::StaticEdges
	};
	graph.add_edge(Edge {
		a,
		b,
		life: Fade::established(rng.range(1.0, 1.5)),
		max_age: None,
		highlight: 0.0,
		slot: BufferSlot::unassigned(layer),
	});
}

#[cfg(test)]
mod tests {
	use super::*;

	fn built() -> Graph {
		let config = SceneConfig::default();
		build(&config, &mut SceneRng::new(config.seed))
	}

	#[test]
	fn node_counts_follow_config() {
		let config = SceneConfig::default();
		let graph = built();
		let clustered: usize = config.clusters.iter().map(|c| c.count).sum();
		assert_eq!(
			graph.nodes.len(),
			clustered + config.bridges.len() + config.peripherals.len()
		);
		let hubs = graph.nodes.iter().filter(|n| n.kind == NodeKind::Hub).count();
		assert_eq!(hubs, config.clusters.len());
	}

	#[test]
	fn hubs_sit_on_anchors() {
		let config = SceneConfig::default();
		let graph = built();
		for (ci, spec) in config.clusters.iter().enumerate() {
			let hub = graph
				.nodes
				.iter()
				.find(|n| n.kind == NodeKind::Hub && n.cluster == Some(ci))
				.map(|n| n.position);
			assert_eq!(hub, Some(spec.anchor));
		}
	}

	#[test]
	fn satellites_stay_within_spread() {
		let config = SceneConfig::default();
		let graph = built();
		for node in graph.nodes.iter().filter(|n| n.kind == NodeKind::Regular) {
			let spec = &config.clusters[node.cluster.unwrap()];
			let r = node.xy().distance(spec.anchor.truncate());
			assert!(r >= spec.spread * 0.35 - 1e-3 && r <= spec.spread + 1e-3);
		}
	}

	#[test]
	fn peripherals_are_isolated() {
		let graph = built();
		for (i, node) in graph.nodes.iter().enumerate() {
			if node.kind == NodeKind::Peripheral {
				assert!(graph.neighbors(i).is_empty());
				assert_eq!(node.cluster, None);
			}
		}
	}

	#[test]
	fn bridges_form_a_triangle_and_reach_their_clusters() {
		let config = SceneConfig::default();
		let graph = built();
		let bridges: Vec<NodeId> = (0..graph.nodes.len())
			.filter(|&i| graph.nodes[i].kind == NodeKind::Bridge)
			.collect();
		assert_eq!(bridges.len(), 3);
		for &a in &bridges {
			for &b in &bridges {
				if a != b {
					assert!(graph.are_adjacent(a, b));
				}
			}
		}
		for (spec, &b) in config.bridges.iter().zip(&bridges) {
			for &ci in &spec.connects {
				let linked = graph
					.neighbors(b)
					.iter()
					.filter(|&&j| graph.nodes[j].cluster == Some(ci))
					.count();
				assert_eq!(linked, config.bridge_fan_out);
			}
		}
	}

	#[test]
	fn bridge_edges_use_bridge_layer() {
		let graph = built();
		for edge in &graph.edges {
			let touches = [edge.a, edge.b]
				.iter()
				.any(|&i| graph.nodes[i].kind == NodeKind::Bridge);
			assert_eq!(edge.slot.layer == Layer::BridgeEdges, touches);
		}
	}

	#[test]
	fn construction_is_deterministic_and_consistent() {
		let a = built();
		let b = built();
		assert_eq!(a.edges.len(), b.edges.len());
		for (x, y) in a.nodes.iter().zip(&b.nodes) {
			assert_eq!(x.position, y.position);
		}
		for (x, y) in a.edges.iter().zip(&b.edges) {
			assert_eq!((x.a, x.b), (y.a, y.b));
		}
		assert!(a.is_consistent());
	}

	#[test]
	fn drift_has_configured_magnitude() {
		let config = SceneConfig::default();
		let graph = built();
		for cluster in &graph.clusters {
			assert!((cluster.drift.length() - config.physics.drift_magnitude).abs() < 1e-3);
		}
	}
}
