//! Fixed-capacity draw buffers and the per-frame sync pass.
//!
//! Record layouts are `#[repr(C)]` and `Pod`, so any backend can upload
//! [`LayerBuffer::as_bytes`] directly:
//!
//! - [`PointVertex`]: `position: [f32; 3]`, `color: [f32; 4]` (rgb + alpha),
//!   `size: f32`. Stride 32 bytes.
//! - [`SegmentVertex`]: `start: [f32; 3]`, `end: [f32; 3]`,
//!   `color: [f32; 4]`. Stride 40 bytes.
//!
//! Buffers are sized once. Each sync packs the visible records of a layer at
//! the front and only the active count changes.

use bytemuck::{Pod, Zeroable};

use super::config::LifecycleConfig;
use super::graph::Graph;
use super::palette::Palette;
use super::types::{Layer, NodeKind};

/// Records below this alpha are culled from the active range.
pub const ALPHA_EPSILON: f32 = 0.01;

const STATIC_EDGE_ALPHA: f32 = 0.2;
const BRIDGE_EDGE_ALPHA: f32 = 0.35;
const DYNAMIC_EDGE_ALPHA: f32 = 0.25;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
	pub position: [f32; 3],
	pub color: [f32; 4],
	pub size: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SegmentVertex {
	pub start: [f32; 3],
	pub end: [f32; 3],
	pub color: [f32; 4],
}

/// A pre-sized buffer whose first `active` records are drawn.
#[derive(Clone, Debug)]
pub struct LayerBuffer<V> {
	data: Vec<V>,
	active: usize,
}

impl<V: Pod> LayerBuffer<V> {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			data: vec![V::zeroed(); capacity],
			active: 0,
		}
	}

	pub fn capacity(&self) -> usize {
		self.data.len()
	}

	pub fn active(&self) -> &[V] {
		&self.data[..self.active]
	}

	pub fn as_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(self.active())
	}

	fn reset(&mut self) {
		self.active = 0;
	}

	/// Writes the next record, or returns `None` when the layer is full.
	fn push(&mut self, record: V) -> Option<usize> {
		let slot = self.data.get_mut(self.active)?;
		*slot = record;
		self.active += 1;
		Some(self.active - 1)
	}
}

/// What a sync pass reclaimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
	pub reclaimed_nodes: usize,
	pub reclaimed_edges: usize,
}

#[derive(Clone, Debug)]
pub struct FrameBuffers {
	pub static_points: LayerBuffer<PointVertex>,
	pub bridge_points: LayerBuffer<PointVertex>,
	pub peripheral_points: LayerBuffer<PointVertex>,
	pub dynamic_points: LayerBuffer<PointVertex>,
	pub static_edges: LayerBuffer<SegmentVertex>,
	pub bridge_edges: LayerBuffer<SegmentVertex>,
	pub dynamic_edges: LayerBuffer<SegmentVertex>,
}

impl FrameBuffers {
	/// Sizes construction layers from the graph and dynamic layers from the
	/// configured capacities.
	pub fn for_graph(graph: &Graph, cfg: &LifecycleConfig) -> Self {
		let nodes_in = |layer: Layer| {
			graph.nodes.iter().filter(|n| n.slot.layer == layer).count()
		};
		let edges_in = |layer: Layer| {
			graph.edges.iter().filter(|e| e.slot.layer == layer).count()
		};
		Self {
			static_points: LayerBuffer::with_capacity(nodes_in(Layer::StaticPoints)),
			bridge_points: LayerBuffer::with_capacity(nodes_in(Layer::BridgePoints)),
			peripheral_points: LayerBuffer::with_capacity(nodes_in(Layer::PeripheralPoints)),
			dynamic_points: LayerBuffer::with_capacity(cfg.max_dynamic_nodes),
			static_edges: LayerBuffer::with_capacity(edges_in(Layer::StaticEdges)),
			bridge_edges: LayerBuffer::with_capacity(edges_in(Layer::BridgeEdges)),
			dynamic_edges: LayerBuffer::with_capacity(cfg.max_dynamic_edges),
		}
	}

	fn points_mut(&mut self, layer: Layer) -> Option<&mut LayerBuffer<PointVertex>> {
		match layer {
			Layer::StaticPoints => Some(&mut self.static_points),
			Layer::BridgePoints => Some(&mut self.bridge_points),
			Layer::PeripheralPoints => Some(&mut self.peripheral_points),
			Layer::DynamicPoints => Some(&mut self.dynamic_points),
			_ => None,
		}
	}

	fn segments_mut(&mut self, layer: Layer) -> Option<&mut LayerBuffer<SegmentVertex>> {
		match layer {
			Layer::StaticEdges => Some(&mut self.static_edges),
			Layer::BridgeEdges => Some(&mut self.bridge_edges),
			Layer::DynamicEdges => Some(&mut self.dynamic_edges),
			_ => None,
		}
	}

	/// Recomputes fades, reclaims fully faded entities and rewrites every
	/// layer.
	///
	/// After this returns, no dead entity is referenced from adjacency and
	/// every alive entity above [`ALPHA_EPSILON`] has a slot index.
	pub fn sync(&mut self, graph: &mut Graph, palette: &Palette) -> SyncStats {
		let mut stats = SyncStats::default();
		for layer in [
			&mut self.static_points,
			&mut self.bridge_points,
			&mut self.peripheral_points,
			&mut self.dynamic_points,
		] {
			layer.reset();
		}
		for layer in [&mut self.static_edges, &mut self.bridge_edges, &mut self.dynamic_edges] {
			layer.reset();
		}

		for i in 0..graph.nodes.len() {
			let node = &graph.nodes[i];
			if !node.life.alive {
				continue;
			}
			if node.life.is_spent() {
				stats.reclaimed_edges += graph.reclaim_node(i);
				stats.reclaimed_nodes += 1;
				continue;
			}
			let alpha = node.life.alpha(node.base_opacity);
			let tint = match node.kind {
				NodeKind::Regular | NodeKind::Hub => palette.cluster_tint(node.cluster),
				NodeKind::Bridge => palette.bridge,
				NodeKind::Peripheral => palette.peripheral,
			};
			let record = PointVertex {
				position: node.position.to_array(),
				color: tint.with_alpha(alpha),
				size: node.size,
			};
			let layer = node.slot.layer;
			let index = if alpha < ALPHA_EPSILON {
				None
			} else {
				self.points_mut(layer).and_then(|buf| buf.push(record))
			};
			graph.nodes[i].slot.index = index;
		}

		for i in 0..graph.edges.len() {
			let edge = &graph.edges[i];
			if !edge.life.alive {
				continue;
			}
			if edge.life.is_spent() {
				graph.reclaim_edge(i);
				stats.reclaimed_edges += 1;
				continue;
			}
			let (Some(a), Some(b)) = (graph.nodes.get(edge.a), graph.nodes.get(edge.b)) else {
				continue;
			};
			let layer = edge.slot.layer;
			let (base, rest) = match layer {
				Layer::BridgeEdges => (BRIDGE_EDGE_ALPHA, palette.bridge_edge),
				Layer::DynamicEdges => (DYNAMIC_EDGE_ALPHA, palette.edge),
				_ => (STATIC_EDGE_ALPHA, palette.edge),
			};
			let alpha = edge.life.alpha(base);
			let color = if edge.highlight > 0.0 && edge.life.age < edge.highlight {
				palette.edge_highlight.mix(rest, edge.life.age / edge.highlight)
			} else {
				rest
			};
			let record = SegmentVertex {
				start: a.position.to_array(),
				end: b.position.to_array(),
				color: color.with_alpha(alpha),
			};
			let index = if alpha < ALPHA_EPSILON {
				None
			} else {
				self.segments_mut(layer).and_then(|buf| buf.push(record))
			};
			graph.edges[i].slot.index = index;
		}

		stats
	}
}
