use math::Vec3;

/// Right-handed orthonormal basis -- Y is up
pub struct Frame(Vec3, Vec3, Vec3);

impl Frame {
	pub fn from_up(normal: Vec3) -> Frame {
		let tangent = if normal.x.abs() > normal.y.abs() {
			Vec3::new(normal.z, 0.0, -normal.x) / (normal.x * normal.x + normal.z * normal.z).sqrt()
		} else {
			Vec3::new(0.0, -normal.z, normal.y) / (normal.y * normal.y + normal.z * normal.z).sqrt()
		};
		let bitangent = Vec3::cross(normal, tangent);
		Frame(tangent, normal, bitangent)
	}

	#[inline(always)]
	pub fn to_world(&self, v: Vec3) -> Vec3 {
		self.0 * v.x + self.1 * v.y + self.2 * v.z
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use math::Vec3;

	#[test]
	fn test_from_up_is_orthonormal() {
		for &n in &[
			Vec3::new(0.0, 1.0, 0.0),
			Vec3::new(1.0, 0.0, 0.0),
			Vec3::new(0.3, -0.5, 0.8).normalized(),
		] {
			let f = Frame::from_up(n);
			let up = f.to_world(Vec3::new(0.0, 1.0, 0.0));
			assert!((up - n).length() < 1e-6);
			let v = f.to_world(Vec3::new(1.0, 0.0, 0.0));
			assert!(Vec3::dot(v, n).abs() < 1e-6);
			assert!((v.length() - 1.0).abs() < 1e-6);
		}
	}
}
