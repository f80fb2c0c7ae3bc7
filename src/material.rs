use math::*;
use surface::HitInfo;
use texture::Texture;
use warp;

/// Result of sampling a scattering direction at a hit point
pub struct ScatterRecord {
	/// Sampled outgoing direction, in world space
	pub wo: Vec3,
	pub attenuation: Vec3,
	/// Dirac interactions bypass pdf weighting and light sampling
	pub is_specular: bool,
}

pub trait Material: Send + Sync {
	/// Sample an outgoing direction for light arriving along `wi`.
	/// Returns `None` when the model forbids scattering for this geometry.
	fn sample(&self, wi: Vec3, hit: &HitInfo, rv: (f32, f32), rv1: f32) -> Option<ScatterRecord>;

	/// Value of the scattering function times the cosine foreshortening
	fn eval(&self, _wi: Vec3, _scattered: Vec3, _hit: &HitInfo) -> Vec3 {
		Vec3::zero()
	}

	/// Solid angle density of `sample`; zero for specular models
	fn pdf(&self, _wi: Vec3, _scattered: Vec3, _hit: &HitInfo) -> f32 {
		0.0
	}

	/// Radiance emitted towards `-wi`
	fn emitted(&self, _wi: Vec3, _hit: &HitInfo) -> Vec3 {
		Vec3::zero()
	}

	fn is_emissive(&self) -> bool {
		false
	}
}

fn reflect(v: Vec3, n: Vec3) -> Vec3 {
	v - n * (2.0 * Vec3::dot(v, n))
}

/// Perfectly diffuse reflection
pub struct Lambertian {
	pub albedo: Texture,
}

impl Material for Lambertian {
	fn sample(&self, _wi: Vec3, hit: &HitInfo, rv: (f32, f32), _rv1: f32) -> Option<ScatterRecord> {
		let wo = Frame::from_up(hit.sn).to_world(warp::cosine_hemisphere(rv));
		if Vec3::dot(wo, hit.sn) <= 0.0 {
			return None;
		}

		Some(ScatterRecord {
			wo,
			attenuation: self.albedo.eval(hit.uv, hit.p),
			is_specular: false,
		})
	}

	fn eval(&self, _wi: Vec3, scattered: Vec3, hit: &HitInfo) -> Vec3 {
		let cos = Vec3::dot(scattered.normalized(), hit.sn).max(0.0);
		self.albedo.eval(hit.uv, hit.p) * (INV_PI * cos)
	}

	fn pdf(&self, _wi: Vec3, scattered: Vec3, hit: &HitInfo) -> f32 {
		INV_PI * Vec3::dot(scattered.normalized(), hit.sn).max(0.0)
	}
}

/// Mirror reflection, optionally perturbed by a roughness factor
pub struct Metal {
	pub albedo: Texture,
	pub roughness: f32,
}

impl Material for Metal {
	fn sample(&self, wi: Vec3, hit: &HitInfo, rv: (f32, f32), _rv1: f32) -> Option<ScatterRecord> {
		let reflected = reflect(wi.normalized(), hit.sn);
		let wo = reflected + warp::uniform_sphere(rv) * self.roughness;
		if Vec3::dot(wo, hit.sn) <= 0.0 {
			return None;
		}

		Some(ScatterRecord {
			wo: wo.normalized(),
			attenuation: self.albedo.eval(hit.uv, hit.p),
			is_specular: true,
		})
	}
}

/// Smooth dielectric refracting and reflecting according to its index of refraction
pub struct Dielectric {
	pub ior: f32,
}

impl Material for Dielectric {
	fn sample(&self, wi: Vec3, hit: &HitInfo, _rv: (f32, f32), rv1: f32) -> Option<ScatterRecord> {
		let d = wi.normalized();
		let cos_i = -Vec3::dot(d, hit.sn);
		let (n, eta, cos_i) = if cos_i > 0.0 {
			(hit.sn, 1.0 / self.ior, cos_i)
		} else {
			(-hit.sn, self.ior, -cos_i)
		};

		let (reflectance, cos_t) = fresnel::dielectric_reflectance(eta, cos_i);
		let wo = if rv1 < reflectance {
			reflect(d, n)
		} else {
			d * eta + n * (eta * cos_i - cos_t)
		};

		Some(ScatterRecord {
			wo: wo.normalized(),
			attenuation: Vec3::thrice(1.0),
			is_specular: true,
		})
	}
}

/// Glossy lobe around the mirror direction
pub struct Phong {
	pub albedo: Texture,
	pub exponent: f32,
}

impl Material for Phong {
	fn sample(&self, wi: Vec3, hit: &HitInfo, rv: (f32, f32), _rv1: f32) -> Option<ScatterRecord> {
		let mirror = reflect(wi.normalized(), hit.sn).normalized();
		let wo = Frame::from_up(mirror).to_world(warp::cosine_power_hemisphere(self.exponent, rv));
		if Vec3::dot(wo, hit.sn) <= 0.0 {
			return None;
		}

		Some(ScatterRecord {
			wo,
			attenuation: self.albedo.eval(hit.uv, hit.p),
			is_specular: false,
		})
	}

	fn eval(&self, wi: Vec3, scattered: Vec3, hit: &HitInfo) -> Vec3 {
		self.albedo.eval(hit.uv, hit.p) * self.pdf(wi, scattered, hit)
	}

	fn pdf(&self, wi: Vec3, scattered: Vec3, hit: &HitInfo) -> f32 {
		let mirror = reflect(wi.normalized(), hit.sn).normalized();
		let cos = Vec3::dot(scattered.normalized(), mirror);
		warp::cosine_power_hemisphere_pdf(self.exponent, cos)
	}
}

/// Glossy lobe built by perturbing the shading normal and mirror-reflecting about it
pub struct BlinnPhong {
	pub albedo: Texture,
	pub exponent: f32,
}

impl Material for BlinnPhong {
	fn sample(&self, wi: Vec3, hit: &HitInfo, rv: (f32, f32), _rv1: f32) -> Option<ScatterRecord> {
		let normal = Frame::from_up(hit.sn).to_world(warp::cosine_power_hemisphere(self.exponent, rv));
		let wo = reflect(wi.normalized(), normal).normalized();
		if Vec3::dot(wo, hit.sn) <= 0.0 {
			return None;
		}

		Some(ScatterRecord {
			wo,
			attenuation: self.albedo.eval(hit.uv, hit.p),
			is_specular: false,
		})
	}

	fn eval(&self, wi: Vec3, scattered: Vec3, hit: &HitInfo) -> Vec3 {
		self.albedo.eval(hit.uv, hit.p) * self.pdf(wi, scattered, hit)
	}

	fn pdf(&self, wi: Vec3, scattered: Vec3, hit: &HitInfo) -> f32 {
		let d = -wi.normalized();
		let half = (d + scattered.normalized()).normalized();
		let cos = Vec3::dot(half, hit.sn);
		let normal_pdf = warp::cosine_power_hemisphere_pdf(self.exponent, cos);
		normal_pdf / (4.0 * Vec3::dot(d, half))
	}
}

/// One-sided area light; does not scatter
pub struct DiffuseLight {
	pub emit: Vec3,
}

impl Material for DiffuseLight {
	fn sample(&self, _wi: Vec3, _hit: &HitInfo, _rv: (f32, f32), _rv1: f32) -> Option<ScatterRecord> {
		None
	}

	fn emitted(&self, wi: Vec3, hit: &HitInfo) -> Vec3 {
		// only emit on the front side
		if Vec3::dot(wi, hit.sn) < 0.0 {
			self.emit
		} else {
			Vec3::zero()
		}
	}

	fn is_emissive(&self) -> bool {
		true
	}
}

mod fresnel {
	/// Unpolarized reflectance of a dielectric interface with relative index
	/// eta = n_incident / n_transmitted. Returns (reflectance, cos_t).
	pub fn dielectric_reflectance(eta: f32, cos_i: f32) -> (f32, f32) {
		// clamp cos_i before using trigonometric identities
		let cos_i = cos_i.min(1.0).max(-1.0);

		let sin_t2 = eta * eta * (1.0 - cos_i * cos_i);
		if sin_t2 > 1.0 {
			// Total Internal Reflection
			return (1.0, 0.0);
		}

		let cos_t = (1.0 - sin_t2).sqrt();
		let r_s = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
		let r_p = (eta * cos_t - cos_i) / (eta * cos_t + cos_i);
		((r_s * r_s + r_p * r_p) * 0.5, cos_t)
	}
}
