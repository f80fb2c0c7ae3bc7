use math::*;
use sampler::Sampler;
use scene::Scene;
use surface::{EmitterRecord, Surface};

pub trait Integrator: Send + Sync {
	/// Estimate the radiance arriving along `ray`
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3;
}

/// Visualize shading normals, mapped to [0;1]
pub struct NormalsIntegrator;

impl Integrator for NormalsIntegrator {
	fn li(&self, scene: &Scene, _sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		match scene.intersect(ray) {
			Some(hit) => (hit.sn + Vec3::thrice(1.0)) * 0.5,
			None => Vec3::zero(),
		}
	}
}

/// White where a scattered ray escapes the scene, black otherwise
pub struct AmbientOcclusion;

impl Integrator for AmbientOcclusion {
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		let hit = match scene.intersect(ray) {
			Some(hit) => hit,
			None => return Vec3::zero(),
		};

		let rv = sampler.next2f();
		let rv1 = sampler.next1f();
		if let Some(srec) = hit.mat.sample(ray.direction, &hit, rv, rv1) {
			let shadow = Ray::new(hit.p, srec.wo);
			if scene.intersect(&shadow).is_none() {
				return Vec3::thrice(1.0);
			}
		}
		Vec3::zero()
	}
}

/// Unidirectional path tracer driven by material sampling only
pub struct PathTracerMats {
	pub max_bounces: u32,
}

impl PathTracerMats {
	fn recurse(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray, depth: u32) -> Vec3 {
		let hit = match scene.intersect(ray) {
			Some(hit) => hit,
			None => return scene.background,
		};

		let emitted = hit.mat.emitted(ray.direction, &hit);
		if depth >= self.max_bounces {
			return emitted;
		}

		let rv = sampler.next2f();
		let rv1 = sampler.next1f();
		let srec = match hit.mat.sample(ray.direction, &hit, rv, rv1) {
			Some(srec) => srec,
			None => return emitted,
		};

		let weight = if srec.is_specular {
			srec.attenuation
		} else {
			let pdf = hit.mat.pdf(ray.direction, srec.wo, &hit);
			if pdf <= 0.0 {
				return emitted;
			}
			hit.mat.eval(ray.direction, srec.wo, &hit) / pdf
		};

		let next = Ray::new(hit.p, srec.wo);
		emitted + weight * self.recurse(scene, sampler, &next, depth + 1)
	}
}

impl Integrator for PathTracerMats {
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		self.recurse(scene, sampler, ray, 0)
	}
}

/// Path tracer driven by next event estimation: at each diffuse bounce the
/// continuation direction is sampled from the scene's emitters
pub struct PathTracerNee {
	pub max_bounces: u32,
}

impl PathTracerNee {
	fn recurse(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray, depth: u32) -> Vec3 {
		let hit = match scene.intersect(ray) {
			Some(hit) => hit,
			None => return scene.background,
		};

		let emitted = hit.mat.emitted(ray.direction, &hit);
		if depth >= self.max_bounces {
			return emitted;
		}

		let rv = sampler.next2f();
		let rv1 = sampler.next1f();
		let srec = match hit.mat.sample(ray.direction, &hit, rv, rv1) {
			Some(srec) => srec,
			None => return emitted,
		};

		if srec.is_specular {
			let next = Ray::new(hit.p, srec.wo);
			return emitted + srec.attenuation * self.recurse(scene, sampler, &next, depth + 1);
		}

		let mut erec = EmitterRecord::new(hit.p);
		if scene.emitters.sample(&mut erec, rv, rv1).is_none() {
			return emitted;
		}
		// reject light samples arriving from below the surface
		if Vec3::dot(erec.wi, hit.sn) < 0.0 {
			return emitted;
		}

		let weight = hit.mat.eval(ray.direction, erec.wi, &hit) / erec.pdf;
		let next = Ray::new(hit.p, erec.wi);
		emitted + weight * self.recurse(scene, sampler, &next, depth + 1)
	}
}

impl Integrator for PathTracerNee {
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		self.recurse(scene, sampler, ray, 0)
	}
}

/// One-sample multiple importance sampling: a coin flip picks either the
/// material or the emitter direction, weighted by the averaged densities
pub struct PathTracerMis {
	pub max_bounces: u32,
}

impl PathTracerMis {
	fn recurse(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray, depth: u32) -> Vec3 {
		let hit = match scene.intersect(ray) {
			Some(hit) => hit,
			None => return scene.background,
		};

		let emitted = hit.mat.emitted(ray.direction, &hit);
		if depth >= self.max_bounces {
			return emitted;
		}

		let rv = sampler.next2f();
		let rv1 = sampler.next1f();
		let srec = hit.mat.sample(ray.direction, &hit, rv, rv1);

		if let Some(ref srec) = srec {
			if srec.is_specular {
				let next = Ray::new(hit.p, srec.wo);
				return emitted + srec.attenuation * self.recurse(scene, sampler, &next, depth + 1);
			}
		}

		let mut erec = EmitterRecord::new(hit.p);
		let light_sampled = scene.emitters.sample(&mut erec, rv, rv1).is_some();

		let picked_mat = sampler.next1f() <= 0.5;
		if picked_mat && srec.is_none() {
			return emitted;
		}
		if !picked_mat && (!light_sampled || Vec3::dot(erec.wi, hit.sn) < 0.0) {
			return emitted;
		}

		let scatter_d = if picked_mat {
			srec.as_ref().map(|s| s.wo).unwrap_or(erec.wi)
		} else {
			erec.wi
		};

		// each technique's density is evaluated at its own sampled direction,
		// whichever one the coin picked
		let light_pdf = if light_sampled { scene.emitters.pdf(hit.p, erec.wi) } else { 0.0 };
		let mat_pdf = match srec {
			Some(ref s) => hit.mat.pdf(ray.direction, s.wo, &hit),
			None => hit.mat.pdf(ray.direction, scatter_d, &hit),
		};
		let pdf = 0.5 * (light_pdf + mat_pdf);
		if pdf <= 0.0 {
			return emitted;
		}

		let weight = hit.mat.eval(ray.direction, scatter_d, &hit) / pdf;
		let next = Ray::new(hit.p, scatter_d);
		emitted + weight * self.recurse(scene, sampler, &next, depth + 1)
	}
}

impl Integrator for PathTracerMis {
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		self.recurse(scene, sampler, ray, 0)
	}
}

/// Traces both the material and the emitter subpath at each bounce and
/// averages the two estimates
pub struct PathTracerMixture {
	pub max_bounces: u32,
}

impl PathTracerMixture {
	fn recurse(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray, depth: u32) -> Vec3 {
		let hit = match scene.intersect(ray) {
			Some(hit) => hit,
			None => return scene.background,
		};

		let emitted = hit.mat.emitted(ray.direction, &hit);
		if depth >= self.max_bounces {
			return emitted;
		}

		let rv = sampler.next2f();
		let rv1 = sampler.next1f();
		let srec = hit.mat.sample(ray.direction, &hit, rv, rv1);

		if let Some(ref srec) = srec {
			if srec.is_specular {
				return emitted + srec.attenuation;
			}
		}

		let mat_color = srec.and_then(|srec| {
			let pdf = hit.mat.pdf(ray.direction, srec.wo, &hit);
			if pdf <= 0.0 {
				return None;
			}
			let weight = hit.mat.eval(ray.direction, srec.wo, &hit) / pdf;
			let next = Ray::new(hit.p, srec.wo);
			Some(weight * self.recurse(scene, sampler, &next, depth + 1))
		});

		let mut erec = EmitterRecord::new(hit.p);
		let light_color = if scene.emitters.sample(&mut erec, rv, rv1).is_some() && erec.pdf > 0.0 {
			let weight = hit.mat.eval(ray.direction, erec.wi, &hit) / erec.pdf;
			let next = Ray::new(hit.p, erec.wi);
			Some(weight * self.recurse(scene, sampler, &next, depth + 1))
		} else {
			None
		};

		match (mat_color, light_color) {
			(Some(m), Some(l)) => emitted + (m + l) * 0.5,
			(Some(m), None) => emitted + m,
			(None, Some(l)) => emitted + l,
			(None, None) => emitted,
		}
	}
}

impl Integrator for PathTracerMixture {
	fn li(&self, scene: &Scene, sampler: &mut Sampler, ray: &Ray) -> Vec3 {
		self.recurse(scene, sampler, ray, 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use math::*;
	use bbh::{Bbh, SplitMethod};
	use material::{Lambertian, DiffuseLight};
	use sampler::{Sampler, IndependentSampler};
	use scene::Scene;
	use sphere::Sphere;
	use surface::{Surface, SurfaceGroup};
	use texture::Texture;
	use camera::Camera;

	fn make_scene(surfaces: Vec<Arc<Surface>>, background: Vec3) -> Scene {
		let mut emitters = SurfaceGroup::new();
		for s in &surfaces {
			if s.is_emissive() {
				emitters.add_child(s.clone());
			}
		}
		Scene {
			surfaces: Bbh::build(surfaces, 1, SplitMethod::Equal),
			emitters,
			background,
			camera: Camera::new(&Mat4::identity(), (16, 16), 90.0, None, None),
			sampler: Box::new(IndependentSampler::new(1)),
			integrator: Box::new(PathTracerMats { max_bounces: 8 }),
		}
	}

	fn test_sampler() -> IndependentSampler {
		let mut s = IndependentSampler::new(1);
		s.set_base_seed(13);
		s.seed(0, 0);
		s
	}

	#[test]
	fn test_miss_returns_background() {
		let scene = make_scene(Vec::new(), Vec3::new(0.2, 0.3, 0.4));
		let mut sampler = test_sampler();
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

		let pt = PathTracerMats { max_bounces: 8 };
		assert_eq!(pt.li(&scene, &mut sampler, &ray), Vec3::new(0.2, 0.3, 0.4));

		let normals = NormalsIntegrator;
		assert_eq!(normals.li(&scene, &mut sampler, &ray), Vec3::zero());
	}

	#[test]
	fn test_zero_bounces_returns_emitted() {
		let light = Arc::new(DiffuseLight { emit: Vec3::thrice(3.0) });
		let surfaces: Vec<Arc<Surface>> =
			vec![Arc::new(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, light))];
		let scene = make_scene(surfaces, Vec3::zero());
		let mut sampler = test_sampler();
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

		let pt = PathTracerMats { max_bounces: 0 };
		assert_eq!(pt.li(&scene, &mut sampler, &ray), Vec3::thrice(3.0));
	}

	#[test]
	fn test_ambient_occlusion_open_scene() {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let surfaces: Vec<Arc<Surface>> =
			vec![Arc::new(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, mat))];
		let scene = make_scene(surfaces, Vec3::zero());
		let mut sampler = test_sampler();

		// nothing occludes the sphere, so every scattered ray escapes
		let ao = AmbientOcclusion;
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
		assert_eq!(ao.li(&scene, &mut sampler, &ray), Vec3::thrice(1.0));
	}

	fn diffuse_and_light_scene() -> Scene {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.8)) });
		let light = Arc::new(DiffuseLight { emit: Vec3::thrice(10.0) });
		let surfaces: Vec<Arc<Surface>> = vec![
			Arc::new(Sphere::new(Vec3::new(0.0, -2.0, 5.0), 1.0, mat)),
			Arc::new(Sphere::new(Vec3::new(0.0, 4.0, 5.0), 1.0, light)),
		];
		make_scene(surfaces, Vec3::zero())
	}

	fn average_li(integrator: &Integrator, scene: &Scene, ray: &Ray, samples: u32) -> Vec3 {
		let mut sampler = test_sampler();
		let mut sum = Vec3::zero();
		for _ in 0..samples {
			sum += integrator.li(scene, &mut sampler, ray);
		}
		sum / samples as f32
	}

	#[test]
	fn test_nee_sees_the_light() {
		let scene = diffuse_and_light_scene();
		let nee = PathTracerNee { max_bounces: 4 };
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, -2.0, 5.0).normalized());
		let mean = average_li(&nee, &scene, &ray, 64);
		assert!(mean.x > 0.0, "diffuse sphere received no light");
	}

	#[test]
	fn test_mis_sees_the_light() {
		let scene = diffuse_and_light_scene();
		let mis = PathTracerMis { max_bounces: 4 };
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, -2.0, 5.0).normalized());
		let mean = average_li(&mis, &scene, &ray, 256);
		assert!(mean.x > 0.0, "diffuse sphere received no light");
		assert!(!mean.has_nan());
	}

	#[test]
	fn test_mixture_sees_the_light() {
		let scene = diffuse_and_light_scene();
		let mixture = PathTracerMixture { max_bounces: 4 };
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, -2.0, 5.0).normalized());
		let mean = average_li(&mixture, &scene, &ray, 256);
		assert!(mean.x > 0.0, "diffuse sphere received no light");
		assert!(!mean.has_nan());
	}

	#[test]
	fn test_mis_and_mixture_emitter_hit_is_emitted_only() {
		let scene = diffuse_and_light_scene();
		let mut sampler = test_sampler();
		// straight at the light: no scatter, no usable light sample
		let ray = Ray::new(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, 0.0, 1.0));

		let mis = PathTracerMis { max_bounces: 4 };
		assert_eq!(mis.li(&scene, &mut sampler, &ray), Vec3::thrice(10.0));

		let mixture = PathTracerMixture { max_bounces: 4 };
		assert_eq!(mixture.li(&scene, &mut sampler, &ray), Vec3::thrice(10.0));
	}
}
