use glam::{Vec2, Vec3};

pub type NodeId = usize;
pub type EdgeId = usize;

/// Role of a node. All kinds share one layout and are dispatched by match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Regular,
	Hub,
	Bridge,
	Peripheral,
}

/// Draw buffer an entity is written into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
	StaticPoints,
	BridgePoints,
	PeripheralPoints,
	DynamicPoints,
	StaticEdges,
	BridgeEdges,
	DynamicEdges,
}

impl Layer {
	pub fn is_dynamic(self) -> bool {
		matches!(self, Layer::DynamicPoints | Layer::DynamicEdges)
	}
}

/// An entity's place in the draw buffers.
///
/// `layer` is fixed at creation. `index` is the record the last sync wrote,
/// or `None` when the entity was culled or is dead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSlot {
	pub layer: Layer,
	pub index: Option<usize>,
}

impl BufferSlot {
	pub fn unassigned(layer: Layer) -> Self {
		Self { layer, index: None }
	}
}

/// Birth, fade-in, dying and fade-out bookkeeping shared by nodes and edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
	pub alive: bool,
	/// Seconds since creation.
	pub age: f32,
	pub fade_in: f32,
	pub dying: bool,
	/// Age at which dying began.
	pub death_age: f32,
	pub fade_out: f32,
}

/// Age given to construction-time entities so they start fully visible.
pub const ESTABLISHED_AGE: f32 = 10.0;
const ESTABLISHED_FADE_IN: f32 = 0.01;

impl Fade {
	pub fn newborn(fade_in: f32, fade_out: f32) -> Self {
		Self {
			alive: true,
			age: 0.0,
			fade_in,
			dying: false,
			death_age: 0.0,
			fade_out,
		}
	}

	pub fn established(fade_out: f32) -> Self {
		Self {
			age: ESTABLISHED_AGE,
			..Self::newborn(ESTABLISHED_FADE_IN, fade_out)
		}
	}

	/// Alive and not dying.
	pub fn is_live(&self) -> bool {
		self.alive && !self.dying
	}

	/// Starts the fade-out. Returns false if already dying or dead.
	pub fn begin_dying(&mut self) -> bool {
		if !self.is_live() {
			return false;
		}
		self.dying = true;
		self.death_age = self.age;
		true
	}

	pub fn fade_in_factor(&self) -> f32 {
		if self.fade_in <= 0.0 {
			return 1.0;
		}
		(self.age / self.fade_in).min(1.0)
	}

	/// Fraction of the fade-out elapsed, in `[0, 1]`; zero unless dying.
	pub fn death_progress(&self) -> f32 {
		if !self.dying {
			return 0.0;
		}
		if self.fade_out <= 0.0 {
			return 1.0;
		}
		((self.age - self.death_age) / self.fade_out).clamp(0.0, 1.0)
	}

	pub fn is_spent(&self) -> bool {
		self.dying && self.death_progress() >= 1.0
	}

	/// Composed visibility for an entity of the given base opacity.
	pub fn alpha(&self, base: f32) -> f32 {
		base * self.fade_in_factor() * (1.0 - self.death_progress())
	}
}

#[derive(Clone, Debug)]
pub struct Node {
	pub position: Vec3,
	pub velocity: Vec2,
	pub kind: NodeKind,
	pub cluster: Option<usize>,
	pub size: f32,
	pub base_opacity: f32,
	pub life: Fade,
	pub slot: BufferSlot,
}

impl Node {
	pub fn xy(&self) -> Vec2 {
		self.position.truncate()
	}
}

#[derive(Clone, Debug)]
pub struct Edge {
	pub a: NodeId,
	pub b: NodeId,
	pub life: Fade,
	/// Age at which the edge severs itself; `None` lives until an endpoint dies.
	pub max_age: Option<f32>,
	/// Seconds of highlight color after creation; zero for none.
	pub highlight: f32,
	pub slot: BufferSlot,
}

impl Edge {
	pub fn touches(&self, node: NodeId) -> bool {
		self.a == node || self.b == node
	}

	/// True once the edge has outlived its maximum lifetime.
	pub fn is_expired(&self) -> bool {
		self.max_age.is_some_and(|max| self.life.age >= max)
	}
}

#[derive(Clone, Debug)]
pub struct Cluster {
	pub anchor: Vec3,
	pub spread: f32,
	/// Mean position of live members, or the anchor when there are none.
	pub centroid: Vec2,
	pub drift: Vec2,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn alpha_rises_during_fade_in() {
		let mut fade = Fade::newborn(0.5, 1.0);
		let mut last = fade.alpha(1.0);
		for _ in 0..20 {
			fade.age += 0.05;
			let alpha = fade.alpha(1.0);
			assert!(alpha >= last);
			last = alpha;
		}
		assert_eq!(last, 1.0);
	}

	#[test]
	fn alpha_falls_during_fade_out() {
		let mut fade = Fade::established(1.0);
		assert!(fade.begin_dying());
		let mut last = fade.alpha(0.8);
		for _ in 0..30 {
			fade.age += 0.05;
			let alpha = fade.alpha(0.8);
			assert!(alpha <= last);
			last = alpha;
		}
		assert_eq!(last, 0.0);
		assert!(fade.is_spent());
	}

	#[test]
	fn dying_is_terminal() {
		let mut fade = Fade::established(1.0);
		fade.age = 12.0;
		assert!(fade.begin_dying());
		assert!(!fade.begin_dying());
		assert_eq!(fade.death_age, 12.0);
		assert!(fade.dying);
	}

	#[test]
	fn infinite_edges_never_expire() {
		let edge = Edge {
			a: 0,
			b: 1,
			life: Fade {
				age: 1.0e6,
				..Fade::newborn(0.1, 0.1)
			},
			max_age: None,
			highlight: 0.0,
			slot: BufferSlot::unassigned(Layer::StaticEdges),
		};
		assert!(!edge.is_expired());
	}
}
