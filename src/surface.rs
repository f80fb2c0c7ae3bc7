use std::sync::Arc;

use math::*;
use material::Material;

/// Information about a ray/surface intersection
#[derive(Copy, Clone)]
pub struct HitInfo<'a> {
	pub t: f32,
	/// Hit position in world space
	pub p: Vec3,
	/// Geometric normal
	pub gn: Vec3,
	/// Interpolated shading normal
	pub sn: Vec3,
	pub uv: (f32, f32),
	pub mat: &'a Material,
}

/// Record produced when sampling a direction towards an emitter
pub struct EmitterRecord<'a> {
	/// Point from which the emitter is sampled
	pub o: Vec3,
	/// Sampled direction towards the emitter (normalized)
	pub wi: Vec3,
	/// Solid angle density of the sample
	pub pdf: f32,
	pub hit: Option<HitInfo<'a>>,
	pub emitter: Option<&'a Surface>,
}

impl<'a> EmitterRecord<'a> {
	pub fn new(o: Vec3) -> EmitterRecord<'a> {
		EmitterRecord { o, wi: Vec3::zero(), pdf: 0.0, hit: None, emitter: None }
	}
}

pub trait Surface: Send + Sync {
	fn bounds(&self) -> AABB;

	/// Closest intersection within the ray's [mint; maxt] interval
	fn intersect(&self, ray: &Ray) -> Option<HitInfo>;

	/// Sample a direction from `rec.o` towards this surface.
	///
	/// On success, fills `rec` and returns the emitted radiance divided
	/// by the solid angle density of the sample.
	fn sample<'a>(&'a self, _rec: &mut EmitterRecord<'a>, _rv: (f32, f32), _rv1: f32) -> Option<Vec3> {
		None
	}

	/// Solid angle density of `sample` for the direction `v` from origin `o`
	fn pdf(&self, _o: Vec3, _v: Vec3) -> f32 {
		0.0
	}

	fn is_emissive(&self) -> bool {
		false
	}
}

/// A flat list of surfaces intersected by linear scan.
///
/// Also serves as the aggregate emitter distribution of a scene: sampling
/// picks a child uniformly and the density is averaged over all children.
pub struct SurfaceGroup {
	surfaces: Vec<Arc<Surface>>,
	bounds: AABB,
}

impl SurfaceGroup {
	pub fn new() -> SurfaceGroup {
		SurfaceGroup { surfaces: Vec::new(), bounds: AABB::empty() }
	}

	pub fn add_child(&mut self, surface: Arc<Surface>) {
		self.bounds.enclose(&surface.bounds());
		self.surfaces.push(surface);
	}

	pub fn len(&self) -> usize {
		self.surfaces.len()
	}

	pub fn is_empty(&self) -> bool {
		self.surfaces.is_empty()
	}

	/// Pick a child uniformly, remapping `rv1` for reuse.
	/// Returns the child and its pick probability.
	fn sample_child(&self, rv1: &mut f32) -> (&Surface, f32) {
		let sx = *rv1 * self.surfaces.len() as f32;
		let index = (sx as usize).min(self.surfaces.len() - 1);
		*rv1 = sx - index as f32;
		(self.surfaces[index].as_ref(), 1.0 / self.surfaces.len() as f32)
	}
}

impl Surface for SurfaceGroup {
	fn bounds(&self) -> AABB {
		self.bounds
	}

	fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
		let mut ray = *ray;
		let mut closest = None;
		for surface in &self.surfaces {
			if let Some(hit) = surface.intersect(&ray) {
				ray.maxt = hit.t;
				closest = Some(hit);
			}
		}
		closest
	}

	fn sample<'a>(&'a self, rec: &mut EmitterRecord<'a>, rv: (f32, f32), rv1: f32) -> Option<Vec3> {
		if self.surfaces.is_empty() {
			return None;
		}

		let mut rv1 = rv1;
		let (child, prob) = self.sample_child(&mut rv1);
		let color = child.sample(rec, rv, rv1)?;
		rec.pdf *= prob;
		Some(color / prob)
	}

	fn pdf(&self, o: Vec3, v: Vec3) -> f32 {
		if self.surfaces.is_empty() {
			return 0.0;
		}
		let weight = 1.0 / self.surfaces.len() as f32;
		self.surfaces.iter().map(|s| weight * s.pdf(o, v)).sum()
	}

	fn is_emissive(&self) -> bool {
		self.surfaces.iter().any(|s| s.is_emissive())
	}
}
