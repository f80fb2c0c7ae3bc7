use math::*;

/// Offset applied to ray origins to avoid self-intersection
pub const RAY_EPSILON: f32 = 1e-4;

/// A ray with a valid parametric interval [mint; maxt]
#[derive(Copy, Clone, Debug)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
	pub mint: f32,
	pub maxt: f32,
}

impl Ray {
	pub fn new(origin: Vec3, direction: Vec3) -> Ray {
		Ray {
			origin,
			direction,
			mint: RAY_EPSILON,
			maxt: INFINITY,
		}
	}

	pub fn with_bounds(origin: Vec3, direction: Vec3, mint: f32, maxt: f32) -> Ray {
		Ray { origin, direction, mint, maxt }
	}

	pub fn point_at(&self, t: f32) -> Vec3 {
		self.origin + self.direction * t
	}
}
