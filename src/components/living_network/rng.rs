//! Seeded pseudo-random stream shared by construction and evolution.
//!
//! Every randomized decision in the scene draws from a single [`SceneRng`],
//! so a fixed seed plus a fixed sequence of frame deltas replays the exact
//! same trajectory.

use rand::{RngCore, SeedableRng};

const MODULUS: u64 = 2_147_483_647;
const MULTIPLIER: u64 = 16_807;

/// Park–Miller minimal-standard linear congruential generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneRng {
	state: u64,
}

impl SceneRng {
	pub fn new(seed: u32) -> Self {
		let state = u64::from(seed) % MODULUS;
		Self {
			// Zero is a fixed point of the recurrence.
			state: if state == 0 { 1 } else { state },
		}
	}

	/// Next value in `[0, 1)`.
	pub fn next_f64(&mut self) -> f64 {
		self.state = (self.state * MULTIPLIER) % MODULUS;
		(self.state - 1) as f64 / (MODULUS - 1) as f64
	}

	/// Uniform value in `[lo, hi)`.
	pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
		lo + (self.next_f64() * f64::from(hi - lo)) as f32
	}

	/// Uniform value in `[-half, half)`.
	pub fn centered(&mut self, half: f32) -> f32 {
		((self.next_f64() - 0.5) * 2.0 * f64::from(half)) as f32
	}

	/// Uniform index in `0..len`. `len` must be non-zero.
	pub fn index(&mut self, len: usize) -> usize {
		((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
	}

	/// Uniform angle in `[0, 2π)`.
	pub fn angle(&mut self) -> f32 {
		(self.next_f64() * std::f64::consts::TAU) as f32
	}
}

impl RngCore for SceneRng {
	fn next_u32(&mut self) -> u32 {
		(self.next_f64() * f64::from(u32::MAX)) as u32
	}

	fn next_u64(&mut self) -> u64 {
		(u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
	}

	fn fill_bytes(&mut self, dst: &mut [u8]) {
		for chunk in dst.chunks_mut(4) {
			let bytes = self.next_u32().to_le_bytes();
			chunk.copy_from_slice(&bytes[..chunk.len()]);
		}
	}
}

impl SeedableRng for SceneRng {
	type Seed = [u8; 4];

	fn from_seed(seed: Self::Seed) -> Self {
		Self::new(u32::from_le_bytes(seed))
	}
}
