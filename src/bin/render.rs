extern crate radiance;
extern crate serde_json;

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::exit;

use radiance::scene::Scene;
use radiance::texture;

fn main() {
	let args: Vec<String> = env::args().collect();
	if args.len() < 2 {
		eprintln!("usage: {} <scene.json> [output.png]", args[0]);
		exit(1);
	}

	let scene_path = Path::new(&args[1]);
	let out_path = args.get(2).map(String::as_str).unwrap_or("image.png");

	let file = match File::open(scene_path) {
		Ok(f) => f,
		Err(e) => {
			eprintln!("cannot open {}: {}", scene_path.display(), e);
			exit(1);
		}
	};

	let json = match serde_json::from_reader(BufReader::new(file)) {
		Ok(json) => json,
		Err(e) => {
			eprintln!("invalid scene file: {}", e);
			exit(1);
		}
	};

	let dir = scene_path.parent().unwrap_or(Path::new("."));
	let scene = match Scene::from_json(&json, dir) {
		Ok(scene) => scene,
		Err(e) => {
			eprintln!("{}", e);
			exit(1);
		}
	};

	let img = radiance::render(&scene);

	let result = if out_path.ends_with(".ppm") {
		texture::write_ppm_srgb(out_path, img.width, img.height, img.pixels().iter().cloned());
		Ok(())
	} else {
		texture::save_png(out_path, &img)
	};

	match result {
		Ok(()) => println!("Image written to {}", out_path),
		Err(e) => {
			eprintln!("cannot write {}: {}", out_path, e);
			exit(1);
		}
	}
}
