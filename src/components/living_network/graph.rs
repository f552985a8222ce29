//! Append-only node and edge arenas with a symmetric adjacency map.
//!
//! Entities are addressed by their index for their whole existence. Death is
//! a tombstone (`alive = false`); slots are never removed or reused.

use glam::Vec2;

use super::types::{Cluster, Edge, EdgeId, Node, NodeId};

/// Node and edge storage is only grown through [`Graph::add_node`] and
/// [`Graph::add_edge`]; outside the engine the arenas are read-only.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub(super) nodes: Vec<Node>,
	pub(super) edges: Vec<Edge>,
	pub(super) clusters: Vec<Cluster>,
	adjacency: Vec<Vec<NodeId>>,
	/// Edges still holding a reference to each node.
	incident: Vec<Vec<EdgeId>>,
	dynamic_nodes: usize,
	dynamic_edges: usize,
}

impl Graph {
	pub fn new(clusters: Vec<Cluster>) -> Self {
		Self {
			clusters,
			..Self::default()
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn clusters(&self) -> &[Cluster] {
		&self.clusters
	}

	pub fn add_node(&mut self, node: Node) -> NodeId {
		let id = self.nodes.len();
		if node.life.alive && node.slot.layer.is_dynamic() {
			self.dynamic_nodes += 1;
		}
		self.nodes.push(node);
		self.adjacency.push(Vec::new());
		self.incident.push(Vec::new());
		id
	}

	/// Inserts `edge` unless its endpoints are already connected.
	///
	/// Inserting an existing undirected pair, a self-loop or an edge to a
	/// missing or reclaimed node is a no-op that returns `None`.
	pub fn add_edge(&mut self, edge: Edge) -> Option<EdgeId> {
		let (a, b) = (edge.a, edge.b);
		let alive = |id: NodeId| self.nodes.get(id).is_some_and(|n| n.life.alive);
		if a == b || !alive(a) || !alive(b) || self.are_adjacent(a, b) {
			return None;
		}
		let id = self.edges.len();
		if edge.life.alive && edge.slot.layer.is_dynamic() {
			self.dynamic_edges += 1;
		}
		self.edges.push(edge);
		self.adjacency[a].push(b);
		self.adjacency[b].push(a);
		self.incident[a].push(id);
		self.incident[b].push(id);
		Some(id)
	}

	pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
		self.adjacency.get(a).is_some_and(|list| list.contains(&b))
	}

	pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
		self.adjacency
			.get(node)
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	/// Mean position of the node's alive, non-dying neighbors.
	pub fn neighbor_centroid(&self, node: NodeId) -> Option<Vec2> {
		let mut sum = Vec2::ZERO;
		let mut count = 0usize;
		for &j in self.neighbors(node) {
			// Stale references are skipped rather than trusted.
			let Some(neighbor) = self.nodes.get(j) else {
				continue;
			};
			if neighbor.life.is_live() {
				sum += neighbor.xy();
				count += 1;
			}
		}
		(count > 0).then(|| sum / count as f32)
	}

	/// Live member count per cluster.
	pub fn cluster_populations(&self) -> Vec<usize> {
		let mut sizes = vec![0; self.clusters.len()];
		for node in self.nodes.iter().filter(|n| n.life.is_live()) {
			if let Some(size) = node.cluster.and_then(|c| sizes.get_mut(c)) {
				*size += 1;
			}
		}
		sizes
	}

	pub fn recompute_centroids(&mut self) {
		let mut sums = vec![(Vec2::ZERO, 0usize); self.clusters.len()];
		for node in self.nodes.iter().filter(|n| n.life.is_live()) {
			if let Some(slot) = node.cluster.and_then(|c| sums.get_mut(c)) {
				slot.0 += node.xy();
				slot.1 += 1;
			}
		}
		for (cluster, (sum, count)) in self.clusters.iter_mut().zip(sums) {
			cluster.centroid = if count > 0 {
				sum / count as f32
			} else {
				cluster.anchor.truncate()
			};
		}
	}

	pub fn age_all(&mut self, dt: f32) {
		for node in self.nodes.iter_mut().filter(|n| n.life.alive) {
			node.life.age += dt;
		}
		for edge in self.edges.iter_mut().filter(|e| e.life.alive) {
			edge.life.age += dt;
		}
	}

	/// Marks live edges past their maximum lifetime as dying.
	pub fn expire_edges(&mut self) -> usize {
		let mut expired = 0;
		for edge in self.edges.iter_mut() {
			if edge.life.is_live() && edge.is_expired() && edge.life.begin_dying() {
				expired += 1;
			}
		}
		expired
	}

	/// Starts the node's fade-out together with every live edge touching it.
	pub fn begin_node_death(&mut self, node: NodeId) -> bool {
		let Some(n) = self.nodes.get_mut(node) else {
			return false;
		};
		if !n.life.begin_dying() {
			return false;
		}
		for &e in &self.incident[node] {
			self.edges[e].life.begin_dying();
		}
		true
	}

	/// Flips a node to dead and purges every reference to it.
	///
	/// Edges still attached are reclaimed with it so no alive edge can point
	/// at a dead endpoint. Returns how many such edges were reclaimed.
	pub fn reclaim_node(&mut self, node: NodeId) -> usize {
		let Some(n) = self.nodes.get_mut(node) else {
			return 0;
		};
		if !n.life.alive {
			return 0;
		}
		n.life.alive = false;
		n.slot.index = None;
		if n.slot.layer.is_dynamic() {
			self.dynamic_nodes -= 1;
		}
		let mut edges = 0;
		for e in std::mem::take(&mut self.incident[node]) {
			edges += usize::from(self.reclaim_edge(e));
		}
		for j in std::mem::take(&mut self.adjacency[node]) {
			if let Some(list) = self.adjacency.get_mut(j) {
				list.retain(|&x| x != node);
			}
		}
		edges
	}

	/// Flips an edge to dead and removes its pair from both adjacency lists.
	pub fn reclaim_edge(&mut self, edge: EdgeId) -> bool {
		let Some(e) = self.edges.get_mut(edge) else {
			return false;
		};
		if !e.life.alive {
			return false;
		}
		e.life.alive = false;
		e.slot.index = None;
		if e.slot.layer.is_dynamic() {
			self.dynamic_edges -= 1;
		}
		let (a, b) = (e.a, e.b);
		if let Some(list) = self.adjacency.get_mut(a) {
			list.retain(|&x| x != b);
		}
		if let Some(list) = self.adjacency.get_mut(b) {
			list.retain(|&x| x != a);
		}
		for end in [a, b] {
			if let Some(list) = self.incident.get_mut(end) {
				list.retain(|&x| x != edge);
			}
		}
		true
	}

	/// Alive entities currently occupying the dynamic layers.
	pub fn dynamic_counts(&self) -> (usize, usize) {
		(self.dynamic_nodes, self.dynamic_edges)
	}

	/// Checks the adjacency invariants: every alive edge is listed on both
	/// sides, no pair appears twice, and no list names a missing pair.
	pub fn is_consistent(&self) -> bool {
		let mut listed = 0usize;
		for (a, list) in self.adjacency.iter().enumerate() {
			for (k, &b) in list.iter().enumerate() {
				if list[..k].contains(&b) || !self.neighbors(b).contains(&a) {
					return false;
				}
				listed += 1;
			}
		}
		let mut alive = 0usize;
		for edge in self.edges.iter().filter(|e| e.life.alive) {
			if !self.are_adjacent(edge.a, edge.b) || !self.are_adjacent(edge.b, edge.a) {
				return false;
			}
			alive += 1;
		}
		listed == alive * 2
	}
}
