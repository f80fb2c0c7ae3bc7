use std::sync::Arc;

use math::*;
use material::Material;
use surface::{Surface, HitInfo, EmitterRecord};
use warp;
use stats;

pub struct Sphere {
	pub center: Vec3,
	pub radius: f32,
	pub mat: Arc<Material>,
}

impl Sphere {
	pub fn new(center: Vec3, radius: f32, mat: Arc<Material>) -> Sphere {
		Sphere { center, radius, mat }
	}

	fn hit_info(&self, ray: &Ray, t: f32) -> HitInfo {
		let p = ray.point_at(t);
		let n = (p - self.center) / self.radius;

		// spherical parametrization of the normal
		let mut phi = n.z.atan2(n.x);
		if phi < 0.0 {
			phi += 2.0 * PI;
		}
		let theta = n.y.min(1.0).max(-1.0).acos();

		HitInfo {
			t,
			p,
			gn: n,
			sn: n,
			uv: (phi * INV_2_PI, 1.0 - theta * INV_PI),
			mat: self.mat.as_ref(),
		}
	}
}

impl Surface for Sphere {
	fn bounds(&self) -> AABB {
		AABB {
			min: self.center - Vec3::thrice(self.radius),
			max: self.center + Vec3::thrice(self.radius),
		}
	}

	fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
		let oc = ray.origin - self.center;
		let a = Vec3::dot(ray.direction, ray.direction);
		let b = 2.0 * Vec3::dot(oc, ray.direction);
		let c = Vec3::dot(oc, oc) - self.radius * self.radius;

		let discriminant = b * b - 4.0 * a * c;
		if discriminant < 0.0 {
			stats::sphere_test(false);
			return None;
		}

		// try the closest root first, then the far one
		let sqrt_d = discriminant.sqrt();
		let t0 = (-b - sqrt_d) / (2.0 * a);
		let t1 = (-b + sqrt_d) / (2.0 * a);
		let t = if t0 >= ray.mint && t0 <= ray.maxt {
			t0
		} else if t1 >= ray.mint && t1 <= ray.maxt {
			t1
		} else {
			stats::sphere_test(false);
			return None;
		};

		stats::sphere_test(true);
		Some(self.hit_info(ray, t))
	}

	fn sample<'a>(&'a self, rec: &mut EmitterRecord<'a>, rv: (f32, f32), _rv1: f32) -> Option<Vec3> {
		let (to_center, dist) = Vec3::dir_and_dist(rec.o, self.center);
		if dist <= self.radius {
			return None;
		}

		// sample the cone of directions subtended by the sphere
		let cos_theta_max = (1.0 - (self.radius * self.radius) / (dist * dist)).sqrt();
		let wi = Frame::from_up(to_center).to_world(warp::uniform_sphere_cap(rv, cos_theta_max));

		let ray = Ray::new(rec.o, wi);
		let hit = self.intersect(&ray)?;
		let pdf = warp::uniform_sphere_cap_pdf(cos_theta_max);
		let emitted = hit.mat.emitted(wi, &hit);

		rec.wi = wi;
		rec.pdf = pdf;
		rec.hit = Some(hit);
		rec.emitter = Some(self);
		Some(emitted / pdf)
	}

	fn pdf(&self, o: Vec3, v: Vec3) -> f32 {
		let ray = Ray::new(o, v);
		if self.intersect(&ray).is_none() {
			return 0.0;
		}

		let dist2 = Vec3::dot(self.center - o, self.center - o);
		let cos_theta_max = (1.0 - (self.radius * self.radius) / dist2).max(0.0).sqrt();
		warp::uniform_sphere_cap_pdf(cos_theta_max)
	}

	fn is_emissive(&self) -> bool {
		self.mat.is_emissive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use math::*;
	use material::{Lambertian, DiffuseLight};
	use surface::{Surface, EmitterRecord};
	use texture::Texture;

	fn gray() -> Arc<Lambertian> {
		Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) })
	}

	#[test]
	fn test_intersect_unit_sphere() {
		let s = Sphere::new(Vec3::zero(), 1.0, gray());
		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		let hit = s.intersect(&ray).unwrap();
		assert!((hit.t - 4.0).abs() < 1e-4);
		assert!((hit.p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
		assert!((hit.gn - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-4);
	}

	#[test]
	fn test_intersect_from_inside() {
		let s = Sphere::new(Vec3::zero(), 1.0, gray());
		let ray = Ray::new(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
		// the near root is behind mint, the far one must be picked
		let hit = s.intersect(&ray).unwrap();
		assert!((hit.t - 1.0).abs() < 1e-4);
	}

	#[test]
	fn test_intersect_respects_maxt() {
		let s = Sphere::new(Vec3::zero(), 1.0, gray());
		let ray = Ray::with_bounds(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), RAY_EPSILON, 2.0);
		assert!(s.intersect(&ray).is_none());
	}

	#[test]
	fn test_sample_pdf_consistent() {
		let light = Arc::new(DiffuseLight { emit: Vec3::thrice(4.0) });
		let s = Sphere::new(Vec3::new(0.0, 3.0, 0.0), 0.5, light);
		let o = Vec3::zero();
		let mut rec = EmitterRecord::new(o);
		let color = s.sample(&mut rec, (0.3, 0.8), 0.0).unwrap();
		assert!(rec.pdf > 0.0);
		assert!((s.pdf(o, rec.wi) - rec.pdf).abs() / rec.pdf < 1e-3);
		assert!(color.x > 0.0);
	}
}
