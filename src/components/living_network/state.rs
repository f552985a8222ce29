//! Frame driver: owns the whole simulation and runs the phases of one frame
//! in a fixed order.

use glam::Vec2;

use super::buffers::{FrameBuffers, SyncStats};
use super::builder;
use super::config::SceneConfig;
use super::graph::Graph;
use super::lifecycle::{Lifecycle, LifecycleReport, Policies};
use super::palette::{Palette, Theme};
use super::physics::Physics;
use super::render::{Camera, DrawSink};
use super::rng::SceneRng;

/// What one frame did, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
	pub dt: f32,
	pub expired: usize,
	pub lifecycle: LifecycleReport,
	pub sync: SyncStats,
}

pub struct NetworkState {
	pub config: SceneConfig,
	pub graph: Graph,
	pub buffers: FrameBuffers,
	pub palette: Palette,
	pub theme: Theme,
	pub width: f64,
	pub height: f64,
	rng: SceneRng,
	physics: Physics,
	lifecycle: Lifecycle,
	pointer: Vec2,
	parallax: Vec2,
	exposure: f32,
	prev_time: Option<f64>,
}

impl NetworkState {
	pub fn new(config: SceneConfig, theme: Theme, width: f64, height: f64) -> Self {
		let mut rng = SceneRng::new(config.seed);
		let mut graph = builder::build(&config, &mut rng);
		let mut buffers = FrameBuffers::for_graph(&graph, &config.lifecycle);
		let palette = Palette::for_theme(theme);
		buffers.sync(&mut graph, &palette);
		Self {
			config,
			graph,
			buffers,
			palette,
			theme,
			width,
			height,
			rng,
			physics: Physics::default(),
			lifecycle: Lifecycle::default(),
			pointer: Vec2::ZERO,
			parallax: Vec2::ZERO,
			exposure: 0.0,
			prev_time: None,
		}
	}

	pub fn set_policies(&mut self, policies: Policies) {
		self.lifecycle.policies = policies;
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Swaps the palette and re-tints the buffers. Returns false if unchanged.
	pub fn set_theme(&mut self, theme: Theme) -> bool {
		if theme == self.theme {
			return false;
		}
		self.theme = theme;
		self.palette = Palette::for_theme(theme);
		self.buffers.sync(&mut self.graph, &self.palette);
		true
	}

	/// Pointer position in normalized device coordinates, each axis in
	/// `[-1, 1]` with +y up.
	pub fn set_pointer(&mut self, x: f32, y: f32) {
		self.pointer = Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE);
	}

	/// Derives the exposure signal from the page scroll offset.
	pub fn set_scroll(&mut self, scroll_y: f64, viewport_height: f64) {
		let span = viewport_height * f64::from(self.config.driver.exposure_span);
		self.exposure = if span > 0.0 {
			(scroll_y.max(0.0) / span).min(1.0) as f32
		} else {
			0.0
		};
	}

	pub fn exposure(&self) -> f32 {
		self.exposure
	}

	/// Opacity the host should apply to the mount surface.
	pub fn opacity(&self) -> f32 {
		let d = &self.config.driver;
		d.base_opacity * (1.0 - self.exposure * d.exposure_dim)
	}

	/// Multiplier applied to every lifecycle accumulator.
	pub fn churn(&self) -> f32 {
		1.0 + self.exposure * self.config.driver.churn_ceiling
	}

	pub fn camera(&self) -> Camera {
		let d = &self.config.driver;
		let offset = self.parallax * d.parallax_span;
		Camera {
			eye: offset.extend(d.camera_distance),
			fov_y: d.fov_degrees.to_radians(),
			near: d.near,
			far: d.far,
		}
	}

	/// Seconds since the previous frame, capped so an idle gap cannot
	/// produce one huge step.
	fn frame_delta(&mut self, time_ms: f64) -> f32 {
		let t = time_ms * 0.001;
		let dt = match self.prev_time {
			None => self.config.driver.first_dt,
			Some(prev) => ((t - prev).max(0.0) as f32).min(self.config.driver.max_dt),
		};
		self.prev_time = Some(t);
		dt
	}

	/// Runs one scheduled frame at host time `time_ms` and draws into `sink`.
	pub fn frame(&mut self, time_ms: f64, sink: &mut dyn DrawSink) -> FrameReport {
		let dt = self.frame_delta(time_ms);
		let report = self.step(dt);
		self.draw(sink);
		report
	}

	/// Advances the simulation by `dt` seconds without drawing.
	pub fn step(&mut self, dt: f32) -> FrameReport {
		let smoothing = self.config.driver.parallax_smoothing;
		self.parallax += (self.pointer - self.parallax) * smoothing;

		self.graph.age_all(dt);
		let expired = self.graph.expire_edges();
		self.physics
			.step(&mut self.graph, &self.config.physics, &mut self.rng, dt);
		let churn = self.churn();
		let lifecycle = self.lifecycle.advance(
			&mut self.graph,
			&self.config.lifecycle,
			&mut self.rng,
			dt,
			churn,
		);
		let sync = self.buffers.sync(&mut self.graph, &self.palette);
		debug_assert!(self.graph.is_consistent());

		FrameReport {
			dt,
			expired,
			lifecycle,
			sync,
		}
	}

	pub fn draw(&self, sink: &mut dyn DrawSink) {
		sink.draw(&self.buffers, &self.camera());
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::components::living_network::types::NodeKind;

	#[derive(Default)]
	struct CountingSink {
		draws: usize,
		last_points: usize,
	}

	impl DrawSink for CountingSink {
		fn resize(&mut self, _width: f64, _height: f64, _pixel_ratio: f64) {}

		fn draw(&mut self, buffers: &FrameBuffers, _camera: &Camera) {
			self.draws += 1;
			self.last_points = buffers.static_points.active().len();
		}

		fn release(&mut self) {}
	}

	fn state() -> NetworkState {
		NetworkState::new(SceneConfig::default(), Theme::Light, 800.0, 600.0)
	}

	#[test]
	fn identical_runs_match_exactly() {
		let mut a = state();
		let mut b = state();
		let deltas = [0.016, 0.033, 0.1, 0.008, 0.05];
		for i in 0..100 {
			let dt = deltas[i % deltas.len()];
			assert_eq!(a.step(dt), b.step(dt));
		}
		assert_eq!(a.graph.nodes.len(), b.graph.nodes.len());
		for (x, y) in a.graph.nodes.iter().zip(&b.graph.nodes) {
			assert_eq!(x.position, y.position);
			assert_eq!(x.life, y.life);
		}
		for (x, y) in a.graph.edges.iter().zip(&b.graph.edges) {
			assert_eq!((x.a, x.b, x.life), (y.a, y.b, y.life));
		}
	}

	#[test]
	fn first_frame_and_gaps_use_bounded_delta() {
		let mut s = state();
		let mut sink = CountingSink::default();
		assert_eq!(s.frame(1000.0, &mut sink).dt, s.config.driver.first_dt);
		let dt = s.frame(1020.0, &mut sink).dt;
		assert!((dt - 0.02).abs() < 1e-4);
		assert_eq!(s.frame(60_000.0, &mut sink).dt, s.config.driver.max_dt);
		assert_eq!(s.frame(59_000.0, &mut sink).dt, 0.0);
		assert_eq!(sink.draws, 4);
		assert!(sink.last_points > 0);
	}

	#[test]
	fn scroll_maps_to_opacity_and_churn() {
		let mut s = state();
		s.set_scroll(0.0, 800.0);
		assert_eq!(s.churn(), 1.0);
		assert_eq!(s.opacity(), 0.4);
		s.set_scroll(800.0, 800.0);
		assert_eq!(s.exposure(), 0.5);
		assert_eq!(s.churn(), 6.0);
		s.set_scroll(10_000.0, 800.0);
		assert_eq!(s.exposure(), 1.0);
		assert_eq!(s.churn(), 11.0);
		assert!((s.opacity() - 0.2).abs() < 1e-6);
		s.set_scroll(100.0, 0.0);
		assert_eq!(s.exposure(), 0.0);
	}

	#[test]
	fn parallax_eases_toward_pointer() {
		let mut s = state();
		s.set_pointer(1.0, -1.0);
		s.step(0.016);
		let first = s.camera().eye;
		assert!(first.x > 0.0 && first.x < s.config.driver.parallax_span.x);
		for _ in 0..500 {
			s.step(0.016);
		}
		let settled = s.camera().eye;
		assert!((settled.x - s.config.driver.parallax_span.x).abs() < 0.1);
		assert!((settled.y + s.config.driver.parallax_span.y).abs() < 0.1);
		assert_eq!(settled.z, s.config.driver.camera_distance);
	}

	#[test]
	fn theme_change_retints() {
		let mut s = state();
		let before = s.buffers.bridge_points.active()[0].color;
		assert!(s.set_theme(Theme::Dark));
		assert!(!s.set_theme(Theme::Dark));
		let after = s.buffers.bridge_points.active()[0].color;
		assert_eq!(after[..3], Palette::for_theme(Theme::Dark).bridge.0);
		assert_ne!(before, after);
	}

	fn first_cluster(_populations: &[usize], _rng: &mut SceneRng) -> usize {
		0
	}

	#[test]
	fn installed_policies_steer_spawns() {
		let mut s = state();
		s.set_policies(Policies {
			pick_cluster: first_cluster,
			..Policies::default()
		});
		let before = s.graph.nodes().len();
		let mut spawned = 0;
		for _ in 0..40 {
			spawned += s.step(0.1).lifecycle.spawned;
		}
		assert!(spawned > 0);
		for node in &s.graph.nodes()[before..] {
			assert_eq!(node.cluster, Some(0));
		}
	}

	#[test]
	fn invariants_hold_under_heavy_churn() {
		let mut s = state();
		s.set_scroll(1.0e6, 800.0);
		let cfg = s.config.lifecycle;
		let mut saw_reclaim = false;
		for _ in 0..1500 {
			let report = s.step(0.1);
			saw_reclaim |= report.sync.reclaimed_nodes > 0;

			assert!(s.graph.is_consistent());
			let (nodes, edges) = s.graph.dynamic_counts();
			assert!(nodes <= cfg.max_dynamic_nodes);
			assert!(edges <= cfg.max_dynamic_edges);
			let live_dynamic = s
				.graph
				.nodes
				.iter()
				.filter(|n| n.life.alive && n.slot.layer.is_dynamic())
				.count();
			assert_eq!(nodes, live_dynamic);

			let regulars = s
				.graph
				.nodes
				.iter()
				.filter(|n| n.kind == NodeKind::Regular && n.life.is_live())
				.count();
			assert!(regulars > cfg.population_floor);

			let mut pairs = HashSet::new();
			for e in s.graph.edges.iter().filter(|e| e.life.alive) {
				assert!(pairs.insert((e.a.min(e.b), e.a.max(e.b))));
				assert!(s.graph.nodes[e.a].life.alive && s.graph.nodes[e.b].life.alive);
			}
			for n in s.graph.nodes.iter().filter(|n| !n.life.alive) {
				assert_eq!(n.slot.index, None);
			}
		}
		assert!(saw_reclaim);
	}

	#[test]
	fn links_die_only_after_their_lifetime() {
		let mut s = state();
		for _ in 0..2000 {
			s.step(0.05);
			for e in &s.graph.edges {
				if let Some(max) = e.max_age
					&& e.life.dying
					&& !s.graph.nodes[e.a].life.dying
					&& !s.graph.nodes[e.b].life.dying
				{
					assert!(e.life.death_age >= max);
				}
			}
		}
		assert!(s.graph.edges.iter().any(|e| e.max_age.is_some() && !e.life.alive));
	}
}
