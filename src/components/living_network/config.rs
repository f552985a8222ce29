use glam::{Vec2, Vec3};

/// One cluster: hub anchor, target population and satellite spread.
#[derive(Clone, Copy, Debug)]
pub struct ClusterSpec {
	pub anchor: Vec3,
	pub count: usize,
	pub spread: f32,
}

/// A bridge node at a fixed position linking two clusters.
#[derive(Clone, Copy, Debug)]
pub struct BridgeSpec {
	pub position: Vec3,
	pub connects: [usize; 2],
}

#[derive(Clone, Copy, Debug)]
pub struct PhysicsConfig {
	pub edge_attract: f32,
	/// Distance divisor for the neighbor-centroid pull.
	pub edge_falloff: f32,
	pub edge_dead_zone: f32,
	pub cluster_attract: f32,
	pub cluster_falloff: f32,
	pub cluster_dead_zone: f32,
	pub damping: f32,
	/// Strength multiplier for bridge and peripheral nodes.
	pub unclustered_scale: f32,
	pub unclustered_damping: f32,
	pub drift_magnitude: f32,
	/// Wall time between drift rotations, in seconds.
	pub drift_interval: f32,
	/// Drift rotates by an angle in `[-max, max)` radians.
	pub drift_max_turn: f32,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			edge_attract: 1.5,
			edge_falloff: 60.0,
			edge_dead_zone: 5.0,
			cluster_attract: 0.5,
			cluster_falloff: 80.0,
			cluster_dead_zone: 10.0,
			damping: 0.88,
			unclustered_scale: 0.3,
			unclustered_damping: 0.98,
			drift_magnitude: 30.0,
			drift_interval: 5.0,
			drift_max_turn: std::f32::consts::PI * 0.3,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct LifecycleConfig {
	pub spawn_interval: f32,
	pub destroy_interval: f32,
	pub cross_link_interval: f32,
	pub max_dynamic_nodes: usize,
	pub max_dynamic_edges: usize,
	pub spawn_radius: (f32, f32),
	/// Spawned nodes get a depth uniformly in `±spawn_depth`.
	pub spawn_depth: f32,
	pub spawn_edges: (usize, usize),
	/// Nodes younger than this are never chosen for destruction.
	pub destroy_min_age: f32,
	/// Destruction picks uniformly among this many oldest candidates.
	pub destroy_oldest_k: usize,
	/// Destruction is skipped unless it leaves more live regular nodes than this.
	pub population_floor: usize,
	pub node_fade_in: (f32, f32),
	pub node_fade_out: (f32, f32),
	pub node_opacity: (f32, f32),
	pub node_size: (f32, f32),
	pub edge_fade_in: (f32, f32),
	pub edge_fade_out: (f32, f32),
	pub edge_highlight: f32,
	pub link_fade_in: (f32, f32),
	pub link_fade_out: (f32, f32),
	pub link_lifetime: (f32, f32),
	pub link_highlight: f32,
}

impl Default for LifecycleConfig {
	fn default() -> Self {
		Self {
			spawn_interval: 0.8,
			destroy_interval: 1.2,
			cross_link_interval: 2.5,
			max_dynamic_nodes: 150,
			max_dynamic_edges: 400,
			spawn_radius: (25.0, 70.0),
			spawn_depth: 9.0,
			spawn_edges: (2, 4),
			destroy_min_age: 3.0,
			destroy_oldest_k: 8,
			population_floor: 5,
			node_fade_in: (0.4, 0.8),
			node_fade_out: (0.6, 1.0),
			node_opacity: (0.5, 1.0),
			node_size: (4.0, 7.0),
			edge_fade_in: (0.3, 0.6),
			edge_fade_out: (0.5, 0.8),
			edge_highlight: 1.5,
			link_fade_in: (0.5, 1.0),
			link_fade_out: (1.0, 1.5),
			link_lifetime: (6.0, 14.0),
			link_highlight: 2.0,
		}
	}
}

#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
	pub max_dt: f32,
	pub first_dt: f32,
	pub base_opacity: f32,
	/// Fraction of the base opacity removed at full exposure.
	pub exposure_dim: f32,
	/// Extra churn added at full exposure.
	pub churn_ceiling: f32,
	/// Scroll distance, in viewport heights, that maps to full exposure.
	pub exposure_span: f32,
	pub parallax_smoothing: f32,
	pub parallax_span: Vec2,
	pub camera_distance: f32,
	pub fov_degrees: f32,
	pub near: f32,
	pub far: f32,
	pub max_pixel_ratio: f64,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			max_dt: 0.1,
			first_dt: 0.016,
			base_opacity: 0.4,
			exposure_dim: 0.5,
			churn_ceiling: 10.0,
			exposure_span: 2.0,
			parallax_smoothing: 0.04,
			parallax_span: Vec2::new(30.0, 22.0),
			camera_distance: 500.0,
			fov_degrees: 32.0,
			near: 1.0,
			far: 1200.0,
			max_pixel_ratio: 2.0,
		}
	}
}

/// Complete tuning for one scene instance.
#[derive(Clone, Debug)]
pub struct SceneConfig {
	pub seed: u32,
	pub clusters: Vec<ClusterSpec>,
	pub bridges: Vec<BridgeSpec>,
	/// Nearest cluster members each bridge links to, per assigned cluster.
	pub bridge_fan_out: usize,
	pub peripherals: Vec<Vec3>,
	pub physics: PhysicsConfig,
	pub lifecycle: LifecycleConfig,
	pub driver: DriverConfig,
}

impl Default for SceneConfig {
	fn default() -> Self {
		Self {
			seed: 42,
			clusters: vec![
				ClusterSpec {
					anchor: Vec3::new(-150.0, 90.0, -8.0),
					count: 11,
					spread: 60.0,
				},
				ClusterSpec {
					anchor: Vec3::new(140.0, 50.0, 6.0),
					count: 11,
					spread: 58.0,
				},
				ClusterSpec {
					anchor: Vec3::new(-30.0, -110.0, -4.0),
					count: 10,
					spread: 52.0,
				},
			],
			bridges: vec![
				BridgeSpec {
					position: Vec3::new(-5.0, 78.0, 22.0),
					connects: [0, 1],
				},
				BridgeSpec {
					position: Vec3::new(75.0, -35.0, 28.0),
					connects: [1, 2],
				},
				BridgeSpec {
					position: Vec3::new(-115.0, -10.0, 18.0),
					connects: [0, 2],
				},
			],
			bridge_fan_out: 3,
			peripherals: vec![
				Vec3::new(-210.0, 160.0, -35.0),
				Vec3::new(-90.0, 175.0, -28.0),
				Vec3::new(220.0, 120.0, -32.0),
				Vec3::new(210.0, -15.0, -30.0),
				Vec3::new(30.0, -180.0, -28.0),
				Vec3::new(-150.0, -170.0, -38.0),
				Vec3::new(230.0, -90.0, -25.0),
				Vec3::new(-230.0, -60.0, -30.0),
			],
			physics: PhysicsConfig::default(),
			lifecycle: LifecycleConfig::default(),
			driver: DriverConfig::default(),
		}
	}
}
