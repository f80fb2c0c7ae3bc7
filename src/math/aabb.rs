use math::*;

/// Axis-Aligned Bounding Box
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct AABB {
	pub min: Vec3,
	pub max: Vec3,
}

impl AABB {
	/// Slab test against the ray's valid interval [mint; maxt]
	#[inline(always)]
	pub fn intersect(&self, ray: &Ray) -> bool {
		let inv_dir = 1.0 / ray.direction;
		let t_min = (self.min - ray.origin) * inv_dir;
		let t_max = (self.max - ray.origin) * inv_dir;
		let t1 = Vec3::min(t_min, t_max);
		let t2 = Vec3::max(t_min, t_max);
		let t_near = t1.x.max(t1.y).max(t1.z).max(ray.mint);
		let t_far  = t2.x.min(t2.y).min(t2.z).min(ray.maxt);
		t_near <= t_far
	}

	pub fn empty() -> AABB {
		AABB { min: Vec3::thrice(INFINITY), max: Vec3::thrice(NEG_INFINITY) }
	}

	pub fn from_point(p: Vec3) -> AABB {
		AABB { min: p, max: p }
	}

	pub fn extend_point(&mut self, p: Vec3) {
		self.min = Vec3::min(self.min, p);
		self.max = Vec3::max(self.max, p);
	}

	pub fn enclose(&mut self, b: &AABB) {
		self.min = Vec3::min(self.min, b.min);
		self.max = Vec3::max(self.max, b.max);
	}

	pub fn contains(&self, b: &AABB) -> bool {
		self.min.x <= b.min.x && self.min.y <= b.min.y && self.min.z <= b.min.z
			&& self.max.x >= b.max.x && self.max.y >= b.max.y && self.max.z >= b.max.z
	}

	pub fn longuest_axis(&self) -> Axis {
		let d = self.diagonal();
		if d.x > d.y {
			if d.x > d.z { Axis::X } else { Axis::Z }
		} else {
			if d.y > d.z { Axis::Y } else { Axis::Z }
		}
	}

	pub fn diagonal(&self) -> Vec3 {
		self.max - self.min
	}

	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}
}

#[cfg(test)]
mod tests {
	use math::*;

	#[test]
	fn test_intersect_interval() {
		let b = AABB { min: Vec3::thrice(-1.0), max: Vec3::thrice(1.0) };
		let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
		assert!(b.intersect(&ray));

		// box entirely behind maxt
		let short = Ray::with_bounds(ray.origin, ray.direction, ray.mint, 2.0);
		assert!(!b.intersect(&short));

		// box entirely before mint
		let far = Ray::with_bounds(ray.origin, ray.direction, 10.0, INFINITY);
		assert!(!b.intersect(&far));

		// ray starting inside the box
		let inside = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
		assert!(b.intersect(&inside));
	}
}
