use math::*;

/// Warp a sample from [0:1[² on the unit hemisphere around the Y-axis uniformly
pub fn uniform_hemisphere((u, v): (f32, f32)) -> Vec3 {
	let r = (1.0 - u * u).sqrt();
	let phi = 2.0 * PI * v;
	let x = r * phi.cos();
	let z = r * phi.sin();
	Vec3::new(x, u, z)
}

pub fn uniform_hemisphere_pdf(_: Vec3) -> f32 {
	INV_2_PI
}

/// Warp a sample from [0:1[² on the unit hemisphere around the Y-axis with a cosine-weight
pub fn cosine_hemisphere((u, v): (f32, f32)) -> Vec3 {
	let (x, z) = uniform_disk((u, v));
	let y = (1.0 - u).sqrt();
	Vec3::new(x, y, z)
}

pub fn cosine_hemisphere_pdf(v: Vec3) -> f32 {
	v.y * INV_PI
}

/// Warp a sample from [0:1[² on the unit hemisphere around the Y-axis with a
/// cosine-power density
pub fn cosine_power_hemisphere(exponent: f32, (u, v): (f32, f32)) -> Vec3 {
	let phi = 2.0 * PI * u;
	let cos_theta = v.powf(1.0 / (exponent + 1.0));
	let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
	Vec3::new(phi.cos() * sin_theta, cos_theta, phi.sin() * sin_theta)
}

pub fn cosine_power_hemisphere_pdf(exponent: f32, cos_theta: f32) -> f32 {
	(exponent + 1.0) * INV_2_PI * cos_theta.max(0.0).powf(exponent)
}

/// Warp a sample from [0:1[² on the unit sphere
pub fn uniform_sphere((u, v): (f32, f32)) -> Vec3 {
	let y = 1.0 - 2.0 * u;
	let r = (1.0 - y * y).sqrt();
	let phi = 2.0 * PI * v;
	Vec3::new(r * phi.cos(), y, r * phi.sin())
}

pub fn uniform_sphere_pdf(_: Vec3) -> f32 {
	INV_4_PI
}

/// Warp a sample from [0:1[² uniformly on the spherical cap around the Y-axis
/// spanning directions with cos(theta) in [cos_theta_max; 1]
pub fn uniform_sphere_cap((u, v): (f32, f32), cos_theta_max: f32) -> Vec3 {
	let phi = 2.0 * PI * u;
	let cos_theta = cos_theta_max + v * (1.0 - cos_theta_max);
	let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
	Vec3::new(phi.cos() * sin_theta, cos_theta, phi.sin() * sin_theta)
}

pub fn uniform_sphere_cap_pdf(cos_theta_max: f32) -> f32 {
	INV_2_PI / (1.0 - cos_theta_max)
}

/// Warp a sample from [0:1[² uniformly on the triangle (v0, v1, v2)
pub fn uniform_triangle(v0: Vec3, v1: Vec3, v2: Vec3, (u, v): (f32, f32)) -> Vec3 {
	let (mut alpha, mut beta) = (u, v);
	if alpha + beta > 1.0 {
		alpha = 1.0 - alpha;
		beta = 1.0 - beta;
	}
	let gamma = 1.0 - alpha - beta;
	v0 * alpha + v1 * beta + v2 * gamma
}

/// Warp a sample from [0:1[² on the unit disk
pub fn uniform_disk((u, v): (f32, f32)) -> (f32, f32) {
	let r = u.sqrt();
	let theta = 2.0 * PI * v;
	(r * theta.cos(), r * theta.sin())
}

/// Warp a sample from [0;1[ to a tent over [-1;1[
pub fn tent1d(u: f32) -> f32 {
	let x = 2.0 * u;
	if x < 1.0 {
		x.sqrt() - 1.0
	} else {
		1.0 - (2.0 - x).sqrt()
	}
}

/// Warp a sample from [0;1[² to a tent over [-1;1[²
pub fn tent((u, v): (f32, f32)) -> (f32, f32) {
	(tent1d(u), tent1d(v))
}
