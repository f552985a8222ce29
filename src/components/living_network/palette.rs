/// Page color scheme, as signalled by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
	#[default]
	Light,
	Dark,
}

impl Theme {
	/// Resolves the `data-theme` attribute, falling back to the system
	/// preference when the attribute is missing or unrecognised.
	pub fn resolve(attribute: Option<&str>, prefers_dark: bool) -> Self {
		match attribute {
			Some("dark") => Theme::Dark,
			Some("light") => Theme::Light,
			_ if prefers_dark => Theme::Dark,
			_ => Theme::Light,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
	pub const fn hex(value: u32) -> Self {
		Self([
			((value >> 16) & 0xff) as f32 / 255.0,
			((value >> 8) & 0xff) as f32 / 255.0,
			(value & 0xff) as f32 / 255.0,
		])
	}

	/// Linear blend; `t = 0` is `self`, `t = 1` is `other`.
	pub fn mix(self, other: Rgb, t: f32) -> Rgb {
		let t = t.clamp(0.0, 1.0);
		let [r, g, b] = self.0;
		let [or, og, ob] = other.0;
		Rgb([
			r + (or - r) * t,
			g + (og - g) * t,
			b + (ob - b) * t,
		])
	}

	pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
		let [r, g, b] = self.0;
		[r, g, b, alpha]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub cluster_tints: Vec<Rgb>,
	pub bridge: Rgb,
	pub edge: Rgb,
	pub bridge_edge: Rgb,
	pub peripheral: Rgb,
	pub edge_highlight: Rgb,
}

impl Palette {
	pub fn for_theme(theme: Theme) -> Self {
		match theme {
			Theme::Dark => Self {
				cluster_tints: vec![Rgb::hex(0xaabbee), Rgb::hex(0xccaaee), Rgb::hex(0x88ddcc)],
				bridge: Rgb::hex(0xa5b4fc),
				edge: Rgb::hex(0xd4d4d8),
				bridge_edge: Rgb::hex(0xa5b4fc),
				peripheral: Rgb::hex(0xa1a1aa),
				edge_highlight: Rgb::hex(0xffffff),
			},
			Theme::Light => Self {
				cluster_tints: vec![Rgb::hex(0x4466aa), Rgb::hex(0x7744aa), Rgb::hex(0x228877)],
				bridge: Rgb::hex(0x6366f1),
				edge: Rgb::hex(0x71717a),
				bridge_edge: Rgb::hex(0x6366f1),
				peripheral: Rgb::hex(0xa1a1aa),
				edge_highlight: Rgb::hex(0xe0e7ff),
			},
		}
	}

	/// Tint for a clustered node; unclustered or out-of-range falls back to
	/// the edge color.
	pub fn cluster_tint(&self, cluster: Option<usize>) -> Rgb {
		cluster
			.and_then(|c| self.cluster_tints.get(c).copied())
			.unwrap_or(self.edge)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attribute_wins_over_preference() {
		assert_eq!(Theme::resolve(Some("light"), true), Theme::Light);
		assert_eq!(Theme::resolve(Some("dark"), false), Theme::Dark);
		assert_eq!(Theme::resolve(None, true), Theme::Dark);
		assert_eq!(Theme::resolve(Some(""), false), Theme::Light);
	}

	#[test]
	fn mix_endpoints() {
		let a = Rgb::hex(0x000000);
		let b = Rgb::hex(0xffffff);
		assert_eq!(a.mix(b, 0.0), a);
		assert_eq!(a.mix(b, 1.0), b);
		assert_eq!(a.mix(b, 0.5), Rgb([0.5, 0.5, 0.5]));
	}

	#[test]
	fn unknown_cluster_uses_edge_color() {
		let palette = Palette::for_theme(Theme::Dark);
		assert_eq!(palette.cluster_tint(None), palette.edge);
		assert_eq!(palette.cluster_tint(Some(99)), palette.edge);
		assert_eq!(palette.cluster_tint(Some(1)), Rgb::hex(0xccaaee));
	}
}
