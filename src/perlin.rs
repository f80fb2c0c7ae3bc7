use rand::{Rng, XorShiftRng};

use math::*;
use sampler::seeded_rng;

const POINT_COUNT: usize = 256;

/// Gradient lattice noise: random unit gradients on the integer lattice,
/// hashed with per-axis permutation tables
pub struct Perlin {
	ranvec: Vec<Vec3>,
	perm_x: Vec<usize>,
	perm_y: Vec<usize>,
	perm_z: Vec<usize>,
}

impl Perlin {
	pub fn new(seed: u32) -> Perlin {
		let mut rng = seeded_rng(seed);
		let ranvec = (0..POINT_COUNT).map(|_| {
			Vec3::new(
				rng.gen_range(-1.0, 1.0),
				rng.gen_range(-1.0, 1.0),
				rng.gen_range(-1.0, 1.0),
			).normalized()
		}).collect();

		Perlin {
			ranvec,
			perm_x: permutation(&mut rng),
			perm_y: permutation(&mut rng),
			perm_z: permutation(&mut rng),
		}
	}

	/// Smooth noise in roughly [-1; 1], zero at lattice points
	pub fn noise(&self, p: Vec3) -> f32 {
		let u = p.x - p.x.floor();
		let v = p.y - p.y.floor();
		let w = p.z - p.z.floor();
		let i = p.x.floor() as i32;
		let j = p.y.floor() as i32;
		let k = p.z.floor() as i32;

		let mut c = [[[Vec3::zero(); 2]; 2]; 2];
		for di in 0..2usize {
			for dj in 0..2usize {
				for dk in 0..2usize {
					c[di][dj][dk] = self.ranvec[
						self.perm_x[((i + di as i32) & 255) as usize]
						^ self.perm_y[((j + dj as i32) & 255) as usize]
						^ self.perm_z[((k + dk as i32) & 255) as usize]];
				}
			}
		}
		perlin_interp(&c, u, v, w)
	}

	/// Turbulence: `depth` octaves of noise at doubling frequencies
	pub fn turb(&self, p: Vec3, depth: u32) -> f32 {
		let mut accum = 0.0;
		let mut q = p;
		let mut weight = 1.0;
		for _ in 0..depth {
			accum += weight * self.noise(q);
			weight *= 0.5;
			q = q * 2.0;
		}
		accum.abs()
	}
}

fn permutation(rng: &mut XorShiftRng) -> Vec<usize> {
	let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
	for i in (1..POINT_COUNT).rev() {
		let target = rng.gen_range(0, i + 1);
		perm.swap(i, target);
	}
	perm
}

/// Trilinear interpolation of the gradient contributions, with Hermite
/// smoothing of the interpolation weights
fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], u: f32, v: f32, w: f32) -> f32 {
	let uu = u * u * (3.0 - 2.0 * u);
	let vv = v * v * (3.0 - 2.0 * v);
	let ww = w * w * (3.0 - 2.0 * w);

	let mut accum = 0.0;
	for i in 0..2usize {
		for j in 0..2usize {
			for k in 0..2usize {
				let (fi, fj, fk) = (i as f32, j as f32, k as f32);
				let weight = Vec3::new(u - fi, v - fj, w - fk);
				accum += (fi * uu + (1.0 - fi) * (1.0 - uu))
					* (fj * vv + (1.0 - fj) * (1.0 - vv))
					* (fk * ww + (1.0 - fk) * (1.0 - ww))
					* Vec3::dot(c[i][j][k], weight);
			}
		}
	}
	accum
}

#[cfg(test)]
mod tests {
	use super::*;
	use math::Vec3;

	#[test]
	fn test_same_seed_same_noise() {
		let a = Perlin::new(7);
		let b = Perlin::new(7);
		let c = Perlin::new(8);
		let p = Vec3::new(1.3, -2.7, 0.4);
		assert_eq!(a.noise(p), b.noise(p));
		assert_ne!(a.noise(p), c.noise(p));
	}

	#[test]
	fn test_noise_is_bounded() {
		let perlin = Perlin::new(0);
		for i in 0..64 {
			let p = Vec3::new(i as f32 * 0.31, i as f32 * -0.17, i as f32 * 0.53);
			let n = perlin.noise(p);
			assert!(n.is_finite());
			assert!(n.abs() <= 1.0, "noise out of range: {}", n);
			assert!(perlin.turb(p, 7) >= 0.0);
		}
	}

	#[test]
	fn test_permutation_is_bijective() {
		let mut rng = ::sampler::seeded_rng(3);
		let perm = permutation(&mut rng);
		let mut seen = vec![false; POINT_COUNT];
		for &i in &perm {
			assert!(!seen[i]);
			seen[i] = true;
		}
	}
}
