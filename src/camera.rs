use math::*;
use warp;

/// Thin lens perspective camera
#[derive(Clone)]
pub struct Camera {
	transform: Mat4,

	resolution: (usize, usize),
	ratio: f32,
	pixel_size: (f32, f32),

	plane_dist: f32,

	aperture_radius: f32,
	focus_dist: f32,
}

impl Camera {
	pub fn new(transform: &Mat4, resolution: (usize, usize), vfov: f32, aperture_radius: Option<f32>, focus_dist: Option<f32>) -> Camera {
		let fov_rad = vfov * PI / 180.0;
		let plane_dist = 1.0 / (fov_rad * 0.5).tan();

		Camera {
			transform: transform.clone(),
			resolution,
			ratio: resolution.1 as f32 / resolution.0 as f32,
			pixel_size: (1.0 / resolution.0 as f32, 1.0 / resolution.1 as f32),
			plane_dist,
			aperture_radius: aperture_radius.unwrap_or(0.0),
			focus_dist: focus_dist.unwrap_or(plane_dist),
		}
	}

	/// Generate a primary ray through the given pixel. `img_uv` drives the
	/// tent-filtered jitter within the pixel, `lens_uv` the lens position.
	pub fn make_ray(&self, pixel: (usize, usize), img_uv: (f32, f32), lens_uv: (f32, f32)) -> Ray {
		let pj = warp::tent(img_uv);
		let img_plane_pos = Vec3 {
			x: -1.0       + (pixel.0 as f32 + pj.0 + 0.5) * 2.0 * self.pixel_size.0,
			y: self.ratio - (pixel.1 as f32 + pj.1 + 0.5) * 2.0 * self.pixel_size.0,
			z: self.plane_dist,
		};
		let focus_plane_pos = img_plane_pos * (self.focus_dist / img_plane_pos.z);
		let lj = warp::uniform_disk(lens_uv);
		let lens_pos = Vec3::new(lj.0 * self.aperture_radius, lj.1 * self.aperture_radius, 0.0);
		let local_dir = (focus_plane_pos - lens_pos).normalized();

		Ray::new(
			self.transform.transform_point(lens_pos),
			self.transform.transform_vector(local_dir).normalized(),
		)
	}

	pub fn resolution(&self) -> (usize, usize) {
		self.resolution
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use math::*;

	#[test]
	fn test_center_pixel_looks_forward() {
		let transform = Mat4::look_at(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0));
		let cam = Camera::new(&transform, (100, 100), 90.0, None, None);
		// the tent warp maps 0.5 to a zero offset
		let ray = cam.make_ray((49, 49), (0.5, 0.5), (0.5, 0.5));
		assert!((ray.origin - Vec3::zero()).length() < 1e-5);
		assert!(Vec3::dot(ray.direction, Vec3::new(0.0, 0.0, 1.0)) > 0.99);
	}

	#[test]
	fn test_corner_rays_diverge() {
		let transform = Mat4::identity();
		let cam = Camera::new(&transform, (64, 64), 90.0, None, None);
		let a = cam.make_ray((0, 0), (0.5, 0.5), (0.5, 0.5));
		let b = cam.make_ray((63, 63), (0.5, 0.5), (0.5, 0.5));
		assert!(Vec3::dot(a.direction, b.direction) < 1.0 - 1e-3);
	}
}
