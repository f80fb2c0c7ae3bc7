use rand::{Rng, SeedableRng, XorShiftRng};

/// Source of the random numbers consumed by integrators and the render loop.
///
/// Samplers are stateful: the render loop reseeds them per pixel so that the
/// random stream of a pixel does not depend on which worker renders it.
pub trait Sampler: Send + Sync {
	/// Number of samples taken per pixel
	fn sample_count(&self) -> u32;

	fn set_base_seed(&mut self, seed: u32);

	/// Deterministically reseed the random stream from pixel coordinates
	fn seed(&mut self, x: u32, y: u32);

	/// Reset the per-pixel state before the first sample of a pixel
	fn start_pixel(&mut self, x: u32, y: u32);

	/// Move on to the next sample of the current pixel
	fn advance(&mut self);

	/// Next random float in [0;1[
	fn next1f(&mut self) -> f32;

	/// Next pair of random floats in [0;1[²
	fn next2f(&mut self) -> (f32, f32);

	fn clone_sampler(&self) -> Box<Sampler>;
}

/// Hash two pixel coordinates into a single seed
pub fn hash2d(x: u32, y: u32) -> u32 {
	let px = 1103515245u32.wrapping_mul((x >> 1) ^ y);
	let py = 1103515245u32.wrapping_mul((y >> 1) ^ x);
	let h = 1103515245u32.wrapping_mul(px ^ (py >> 3));
	h ^ (h >> 16)
}

// XorShiftRng panics on an all-zero seed, so force a nonzero word
pub(crate) fn seeded_rng(seed: u32) -> XorShiftRng {
	let s = seed | 1;
	XorShiftRng::from_seed([
		s,
		s ^ 0x9e3779b9,
		s.wrapping_mul(0x85ebca6b) | 1,
		s ^ 0xc2b2ae35,
	])
}

/// Uncorrelated uniform sampling
#[derive(Clone)]
pub struct IndependentSampler {
	sample_count: u32,
	base_seed: u32,
	rng: XorShiftRng,
}

impl IndependentSampler {
	pub fn new(sample_count: u32) -> IndependentSampler {
		IndependentSampler {
			sample_count: sample_count.max(1),
			base_seed: 0,
			rng: seeded_rng(0),
		}
	}
}

impl Sampler for IndependentSampler {
	fn sample_count(&self) -> u32 {
		self.sample_count
	}

	fn set_base_seed(&mut self, seed: u32) {
		self.base_seed = seed;
		self.rng = seeded_rng(seed);
	}

	fn seed(&mut self, x: u32, y: u32) {
		self.rng = seeded_rng(self.base_seed ^ hash2d(x, y));
	}

	fn start_pixel(&mut self, _x: u32, _y: u32) {}

	fn advance(&mut self) {}

	fn next1f(&mut self) -> f32 {
		self.rng.gen()
	}

	fn next2f(&mut self) -> (f32, f32) {
		(self.rng.gen(), self.rng.gen())
	}

	fn clone_sampler(&self) -> Box<Sampler> {
		Box::new(self.clone())
	}
}

/// Correlated multi-jittered sampling.
///
/// Stratifies the unit square into a grid matching the sample count and
/// decorrelates strata across dimensions with hashed permutations, following
/// Kensler's "Correlated Multi-Jittered Sampling" construction. The
/// per-draw scramble key comes from a pixel-seeded RNG.
#[derive(Clone)]
pub struct CmjSampler {
	sample_count: u32,
	base_seed: u32,
	current_sample: u32,
	dim_1d: u32,
	dim_2d: u32,
	rng: XorShiftRng,
}

impl CmjSampler {
	pub fn new(sample_count: u32) -> CmjSampler {
		CmjSampler {
			sample_count: sample_count.max(1),
			base_seed: 0,
			current_sample: 0,
			dim_1d: 0,
			dim_2d: 0,
			rng: seeded_rng(0),
		}
	}

	fn scramble(&mut self) -> u32 {
		self.rng.gen_range(0, 32768)
	}
}

impl Sampler for CmjSampler {
	fn sample_count(&self) -> u32 {
		self.sample_count
	}

	fn set_base_seed(&mut self, seed: u32) {
		self.base_seed = seed;
		self.rng = seeded_rng(seed);
	}

	fn seed(&mut self, x: u32, y: u32) {
		self.rng = seeded_rng(self.base_seed ^ hash2d(x, y));
	}

	fn start_pixel(&mut self, _x: u32, _y: u32) {
		self.current_sample = 0;
		self.dim_1d = 0;
		self.dim_2d = 0;
	}

	fn advance(&mut self) {
		self.current_sample += 1;
	}

	fn next1f(&mut self) -> f32 {
		let p = self.scramble();
		let r = cmj_grid(self.current_sample, self.sample_count, 1, p).0;
		self.dim_1d += 1;
		r
	}

	fn next2f(&mut self) -> (f32, f32) {
		let p = self.scramble();
		let r = cmj(self.current_sample, self.sample_count, p);
		self.dim_2d += 2;
		r
	}

	fn clone_sampler(&self) -> Box<Sampler> {
		Box::new(self.clone())
	}
}

fn randfloat(i: u32, p: u32) -> f32 {
	let mut i = i ^ p;
	i ^= i >> 17;
	i = i.wrapping_mul(0xb36534e5);
	i ^= i >> 12;
	i ^= i >> 21;
	i = i.wrapping_mul(0x93fc4795);
	i ^= 0xdf6e307f;
	i ^= i >> 17;
	i = i.wrapping_mul(1 | p >> 18);
	i as f32 * (1.0 / 4294967808.0)
}

/// Random permutation of [0; l[ keyed by p, via cycle-walking
fn permute(i: u32, l: u32, p: u32) -> u32 {
	let mut w = l - 1;
	w |= w >> 1;
	w |= w >> 2;
	w |= w >> 4;
	w |= w >> 8;
	w |= w >> 16;

	let mut i = i;
	loop {
		i ^= p;
		i = i.wrapping_mul(0xe170893d);
		i ^= p >> 16;
		i ^= (i & w) >> 4;
		i ^= p >> 8;
		i = i.wrapping_mul(0x0929eb3f);
		i ^= p >> 23;
		i ^= (i & w) >> 1;
		i = i.wrapping_mul(1 | p >> 27);
		i = i.wrapping_mul(0x6935fa69);
		i ^= (i & w) >> 11;
		i = i.wrapping_mul(0x74dcb303);
		i ^= (i & w) >> 2;
		i = i.wrapping_mul(0x9e501cc3);
		i ^= (i & w) >> 2;
		i = i.wrapping_mul(0xc860a3df);
		i &= w;
		i ^= i >> 5;
		if i < l {
			break;
		}
	}
	i.wrapping_add(p) % l
}

/// Sample s of an m x n correlated multi-jittered grid, scrambled by p
fn cmj_grid(s: u32, m: u32, n: u32, p: u32) -> (f32, f32) {
	let sx = permute(s % m, m, p.wrapping_mul(0xa511e9b3));
	let sy = permute(s / m, n, p.wrapping_mul(0x63d83595));
	let jx = randfloat(s, p.wrapping_mul(0xa399d265));
	let jy = randfloat(s, p.wrapping_mul(0x711ad6a5));
	(((s % m) as f32 + (sy as f32 + jx) / n as f32) / m as f32,
	 ((s / m) as f32 + (sx as f32 + jy) / m as f32) / n as f32)
}

/// Sample s of a correlated multi-jittered pattern of total samples,
/// using a near-square grid, scrambled by p
fn cmj(s: u32, total: u32, p: u32) -> (f32, f32) {
	let m = (total as f32).sqrt() as u32;
	let m = m.max(1);
	let n = (total + m - 1) / m;
	let s = permute(s, total, p.wrapping_mul(0x51633e2d));
	let sx = permute(s % m, m, p.wrapping_mul(0x68bc21eb));
	let sy = permute(s / m, n, p.wrapping_mul(0x02e5be93));
	let jx = randfloat(s, p.wrapping_mul(0x967a889b));
	let jy = randfloat(s, p.wrapping_mul(0x368cc8b7));
	((sx as f32 + (sy as f32 + jx) / n as f32) / m as f32,
	 (s as f32 + jy) / total as f32)
}
