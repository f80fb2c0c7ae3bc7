use std::ops::{Index, Mul};
use math::{Vec3, PI};

/// row-major 4x4 matrix
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Mat4(pub(crate) [f32; 16]);

impl Mat4 {
	pub fn identity() -> Mat4 {
		Mat4([
			1.0, 0.0, 0.0, 0.0,
			0.0, 1.0, 0.0, 0.0,
			0.0, 0.0, 1.0, 0.0,
			0.0, 0.0, 0.0, 1.0,
		])
	}

	pub fn scale(v: Vec3) -> Mat4 {
		Mat4([
			v.x, 0.0, 0.0, 0.0,
			0.0, v.y, 0.0, 0.0,
			0.0, 0.0, v.z, 0.0,
			0.0, 0.0, 0.0, 1.0,
		])
	}

	pub fn translate(v: Vec3) -> Mat4 {
		Mat4([
			1.0, 0.0, 0.0, v.x,
			0.0, 1.0, 0.0, v.y,
			0.0, 0.0, 1.0, v.z,
			0.0, 0.0, 0.0, 1.0,
		])
	}

	pub fn rot_yxz(v: Vec3) -> Mat4 {
		let r = v * (PI / 180.0);
		let c = [f32::cos(r.x), f32::cos(r.y), f32::cos(r.z)];
		let s = [f32::sin(r.x), f32::sin(r.y), f32::sin(r.z)];

		Mat4([
			c[1]*c[2] - s[1]*s[0]*s[2], -c[1]*s[2] - s[1]*s[0]*c[2], -s[1]*c[0], 0.0,
			                 c[0]*s[2],                   c[0]*c[2],      -s[0], 0.0,
			s[1]*c[2] + c[1]*s[0]*s[2], -s[1]*s[2] + c[1]*s[0]*c[2],  c[1]*c[0], 0.0,
			                       0.0,                         0.0,        0.0, 1.0
		])
	}

	pub fn transform_point(&self, p: Vec3) -> Vec3 {
		let a = &self;
		Vec3 {
			x: a[(0,0)] * p.x + a[(0,1)] * p.y + a[(0,2)] * p.z + a[(0,3)],
			y: a[(1,0)] * p.x + a[(1,1)] * p.y + a[(1,2)] * p.z + a[(1,3)],
			z: a[(2,0)] * p.x + a[(2,1)] * p.y + a[(2,2)] * p.z + a[(2,3)],
		}
	}

	pub fn transform_vector(&self, p: Vec3) -> Vec3 {
		let a = &self;
		Vec3 {
			x: a[(0,0)] * p.x + a[(0,1)] * p.y + a[(0,2)] * p.z,
			y: a[(1,0)] * p.x + a[(1,1)] * p.y + a[(1,2)] * p.z,
			z: a[(2,0)] * p.x + a[(2,1)] * p.y + a[(2,2)] * p.z,
		}
	}

	pub fn look_at(pos: Vec3, look_at: Vec3, up: Vec3) -> Mat4 {
		let f = (look_at - pos).normalized();
		let r = Vec3::cross(f, up).normalized();
		let u = Vec3::cross(r, f).normalized();

		Mat4([
			r.x, u.x, f.x, pos.x,
			r.y, u.y, f.y, pos.y,
			r.z, u.z, f.z, pos.z,
			0.0, 0.0, 0.0, 1.0
		])
	}
}

impl Mul for Mat4 {
	type Output = Mat4;
	fn mul(self, rhs: Mat4) -> Mat4 {
		let a = &self.0;
		let b = &rhs.0;
		let mut result = [0.0; 16];

		for i in 0..4 {
			for t in 0..4 {
				result[i*4 + t] =
					a[i*4 + 0]*b[0*4 + t] +
					a[i*4 + 1]*b[1*4 + t] +
					a[i*4 + 2]*b[2*4 + t] +
					a[i*4 + 3]*b[3*4 + t];
			}
		}

		Mat4(result)
	}
}

impl Index<(usize, usize)> for Mat4 {
	type Output = f32;

	fn index<'a>(&'a self, coord: (usize, usize)) -> &'a f32 {
		&self.0[4 * coord.0 + coord.1]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use math::Vec3;

	#[test]
	fn test_translate_then_scale() {
		let m = Mat4::scale(Vec3::thrice(2.0)) * Mat4::translate(Vec3::new(1.0, 0.0, 0.0));
		let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0));
		assert_eq!(p, Vec3::new(4.0, 2.0, 2.0));
		// vectors ignore the translation
		let v = m.transform_vector(Vec3::new(1.0, 1.0, 1.0));
		assert_eq!(v, Vec3::thrice(2.0));
	}

	#[test]
	fn test_look_at_frames_the_target() {
		let pos = Vec3::new(0.0, 0.0, 4.0);
		let m = Mat4::look_at(pos, Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
		assert_eq!(m.transform_point(Vec3::zero()), pos);
		let forward = m.transform_vector(Vec3::new(0.0, 0.0, 1.0));
		assert!((forward - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
	}
}
