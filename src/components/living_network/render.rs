use std::f64::consts::PI;

use glam::{Mat4, Vec3};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::buffers::{FrameBuffers, LayerBuffer, PointVertex, SegmentVertex};

/// Screen-space diameter, in CSS pixels, of a size-1 point at depth 1.
const SPRITE_SCALE: f64 = 1100.0;
const FILL_BRIGHTNESS: f32 = 0.85;
const OUTLINE_BOOST: f32 = 1.4;
const OUTLINE_WIDTH: f64 = 0.16;

/// Consumer of synced buffers. The canvas implementation below is one
/// backend; anything that can read the documented record layouts works.
pub trait DrawSink {
	fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64);
	fn draw(&mut self, buffers: &FrameBuffers, camera: &Camera);
	/// Frees the backing surface. Later draws are ignored.
	fn release(&mut self);
}

/// Perspective camera looking at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub eye: Vec3,
	pub fov_y: f32,
	pub near: f32,
	pub far: f32,
}

/// A world point mapped to CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Distance along the view axis.
	pub depth: f64,
}

impl Camera {
	pub fn view_projection(&self, aspect: f32) -> Mat4 {
		let projection = Mat4::perspective_rh_gl(self.fov_y, aspect, self.near, self.far);
		projection * Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y)
	}

	/// Projects `point` into a `width × height` viewport, or `None` when it is
	/// behind the near plane.
	pub fn project(&self, vp: &Mat4, point: [f32; 3], width: f64, height: f64) -> Option<Projected> {
		let clip = *vp * Vec3::from_array(point).extend(1.0);
		if clip.w <= self.near {
			return None;
		}
		let ndc = clip.truncate() / clip.w;
		Some(Projected {
			x: (f64::from(ndc.x) + 1.0) * 0.5 * width,
			y: (1.0 - f64::from(ndc.y)) * 0.5 * height,
			depth: f64::from(clip.w),
		})
	}
}

fn rgba(rgb: [f32; 3], alpha: f32) -> String {
	let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
	format!(
		"rgba({}, {}, {}, {})",
		channel(rgb[0]),
		channel(rgb[1]),
		channel(rgb[2]),
		alpha.clamp(0.0, 1.0)
	)
}

/// Draws the buffers onto a 2D canvas.
pub struct CanvasSink {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
	released: bool,
}

impl CanvasSink {
	pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")?
			.ok_or_else(|| JsValue::from_str("2d context unavailable"))?
			.dyn_into()?;
		Ok(Self {
			width: f64::from(canvas.width()),
			height: f64::from(canvas.height()),
			canvas,
			ctx,
			released: false,
		})
	}

	fn draw_segments(&self, layer: &LayerBuffer<SegmentVertex>, camera: &Camera, vp: &Mat4, width: f64) {
		self.ctx.set_line_width(width);
		for seg in layer.active() {
			let (Some(a), Some(b)) = (
				camera.project(vp, seg.start, self.width, self.height),
				camera.project(vp, seg.end, self.width, self.height),
			) else {
				continue;
			};
			let [r, g, bl, alpha] = seg.color;
			self.ctx.set_stroke_style_str(&rgba([r, g, bl], alpha));
			self.ctx.begin_path();
			self.ctx.move_to(a.x, a.y);
			self.ctx.line_to(b.x, b.y);
			self.ctx.stroke();
		}
	}

	fn draw_points(&self, layer: &LayerBuffer<PointVertex>, camera: &Camera, vp: &Mat4) {
		for point in layer.active() {
			let Some(p) = camera.project(vp, point.position, self.width, self.height) else {
				continue;
			};
			let radius = f64::from(point.size) * SPRITE_SCALE / p.depth * 0.5;
			if radius < 0.25 {
				continue;
			}
			let [r, g, b, alpha] = point.color;
			let fill = [r * FILL_BRIGHTNESS, g * FILL_BRIGHTNESS, b * FILL_BRIGHTNESS];
			let outline = (r.max(g).max(b) * OUTLINE_BOOST).min(1.0) * FILL_BRIGHTNESS;

			self.ctx.begin_path();
			let _ = self.ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
			self.ctx.set_fill_style_str(&rgba(fill, alpha));
			self.ctx.fill();
			self.ctx.set_line_width(radius * OUTLINE_WIDTH);
			self.ctx.set_stroke_style_str(&rgba([outline; 3], alpha));
			self.ctx.stroke();
		}
	}
}

impl DrawSink for CanvasSink {
	fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
		if self.released {
			return;
		}
		self.width = width;
		self.height = height;
		self.canvas.set_width((width * pixel_ratio).round() as u32);
		self.canvas.set_height((height * pixel_ratio).round() as u32);
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{width}px"));
		let _ = style.set_property("height", &format!("{height}px"));
		let _ = self
			.ctx
			.set_transform(pixel_ratio, 0.0, 0.0, pixel_ratio, 0.0, 0.0);
	}

	fn draw(&mut self, buffers: &FrameBuffers, camera: &Camera) {
		if self.released || self.width <= 0.0 || self.height <= 0.0 {
			return;
		}
		self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
		let vp = camera.view_projection((self.width / self.height) as f32);

		self.draw_segments(&buffers.static_edges, camera, &vp, 2.0);
		self.draw_segments(&buffers.bridge_edges, camera, &vp, 3.0);
		self.draw_segments(&buffers.dynamic_edges, camera, &vp, 2.0);

		self.draw_points(&buffers.peripheral_points, camera, &vp);
		self.draw_points(&buffers.static_points, camera, &vp);
		self.draw_points(&buffers.dynamic_points, camera, &vp);
		self.draw_points(&buffers.bridge_points, camera, &vp);
	}

	fn release(&mut self) {
		if self.released {
			return;
		}
		self.released = true;
		// Zero-sized canvases let the browser drop the backing store at once.
		self.canvas.set_width(0);
		self.canvas.set_height(0);
		self.canvas.remove();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn camera(eye: Vec3) -> Camera {
		Camera {
			eye,
			fov_y: 32f32.to_radians(),
			near: 1.0,
			far: 1200.0,
		}
	}

	#[test]
	fn origin_projects_to_viewport_center() {
		let cam = camera(Vec3::new(0.0, 0.0, 500.0));
		let vp = cam.view_projection(800.0 / 600.0);
		let p = cam.project(&vp, [0.0, 0.0, 0.0], 800.0, 600.0).unwrap();
		assert!((p.x - 400.0).abs() < 1e-3);
		assert!((p.y - 300.0).abs() < 1e-3);
		assert!((p.depth - 500.0).abs() < 1e-2);
	}

	#[test]
	fn up_is_up_on_screen() {
		let cam = camera(Vec3::new(0.0, 0.0, 500.0));
		let vp = cam.view_projection(1.0);
		let p = cam.project(&vp, [0.0, 100.0, 0.0], 500.0, 500.0).unwrap();
		assert!(p.y < 250.0);
	}

	#[test]
	fn points_behind_camera_are_dropped() {
		let cam = camera(Vec3::new(0.0, 0.0, 500.0));
		let vp = cam.view_projection(1.0);
		assert!(cam.project(&vp, [0.0, 0.0, 600.0], 500.0, 500.0).is_none());
	}

	#[test]
	fn rgba_clamps_channels() {
		assert_eq!(rgba([1.2, 0.5, -1.0], 2.0), "rgba(255, 128, 0, 1)");
	}
}
