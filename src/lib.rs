extern crate bincode;
extern crate image;
extern crate rand;
extern crate rayon;
extern crate serde_json;
extern crate time;
#[macro_use]
extern crate serde_derive;

pub mod bbh;
pub mod camera;
pub mod integrator;
pub mod material;
pub mod math;
pub mod obj;
pub mod perlin;
pub mod sampler;
pub mod scene;
pub mod sphere;
pub mod stats;
pub mod surface;
pub mod texture;
pub mod triangle;
pub mod warp;

use time::PreciseTime;
use rayon::prelude::*;

use math::*;
use scene::Scene;
use texture::Image;

/// Pixels are rendered in square blocks so workers get coherent chunks
const BLOCK_SIZE: usize = 32;

pub fn render(scene: &Scene) -> Image {
	let (width, height) = scene.camera.resolution();
	let spp = scene.sampler.sample_count();

	stats::reset();
	println!("Rendering at {}x{} with {} samples per pixel...", width, height, spp);
	let start = PreciseTime::now();

	let mut blocks = Vec::new();
	for by in (0..height).step_by(BLOCK_SIZE) {
		for bx in (0..width).step_by(BLOCK_SIZE) {
			blocks.push((bx, by));
		}
	}

	let results: Vec<(usize, usize, Vec<Vec3>)> = blocks.par_iter()
		.map_init(|| scene.sampler.clone_sampler(), |sampler, &(bx, by)| {
			let bw = BLOCK_SIZE.min(width - bx);
			let bh = BLOCK_SIZE.min(height - by);
			let mut pixels = vec![Vec3::zero(); bw * bh];

			for y in 0..bh {
				for x in 0..bw {
					let (px, py) = (bx + x, by + y);

					// reseed per pixel so the result does not depend on
					// which worker renders which block
					sampler.seed(px as u32, py as u32);
					sampler.start_pixel(px as u32, py as u32);

					let mut sum = Vec3::zero();
					for _ in 0..spp {
						let img_uv = sampler.next2f();
						let lens_uv = sampler.next2f();
						let ray = scene.camera.make_ray((px, py), img_uv, lens_uv);
						let v = scene.integrator.li(scene, &mut **sampler, &ray);
						if v.has_nan() {
							stats::nan_sample();
						} else {
							sum += v;
						}
						sampler.advance();
					}
					pixels[y * bw + x] = sum / spp as f32;
				}
			}
			(bx, by, pixels)
		})
		.collect();

	let mut img = Image::new(width, height);
	for (bx, by, pixels) in results {
		let bw = BLOCK_SIZE.min(width - bx);
		for (i, p) in pixels.into_iter().enumerate() {
			img.set(bx + i % bw, by + i / bw, p);
		}
	}

	let end = PreciseTime::now();
	let tot_s = start.to(end).num_milliseconds() as f32 / 1000.0;
	println!("Rendered {} spp in {:.3}s ({:.3}s per sample)", spp, tot_s, tot_s / spp as f32);
	println!("{}", stats::report());

	img
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use serde_json;
	use scene::Scene;

	fn small_scene(sampler: &str) -> Scene {
		let text = format!(r#"{{
			"camera": {{
				"transform": {{ "from": [0, 0, -4], "at": [0, 0, 0] }},
				"resolution": [48, 40],
				"vfov": 40
			}},
			"sampler": {{ "type": "{}", "samples": 2, "seed": 7 }},
			"integrator": {{ "type": "path tracer mats", "max bounces": 4 }},
			"background": 0.5,
			"surfaces": [
				{{ "type": "sphere", "radius": 1, "material": {{ "type": "lambertian", "albedo": 0.6 }} }}
			]
		}}"#, sampler);
		let json = serde_json::from_str(&text).unwrap();
		Scene::from_json(&json, Path::new(".")).unwrap()
	}

	#[test]
	fn test_render_covers_the_image() {
		let scene = small_scene("independent");
		let img = render(&scene);
		assert_eq!((img.width, img.height), (48, 40));
		// a corner pixel only sees the background
		assert!((img.get(0, 0).x - 0.5).abs() < 1e-3);
	}

	#[test]
	fn test_render_is_deterministic() {
		let scene = small_scene("cmj");
		let a = render(&scene);
		let b = render(&scene);
		for y in 0..a.height {
			for x in 0..a.width {
				assert_eq!(a.get(x, y), b.get(x, y));
			}
		}
	}
}
