use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use bbh::{Bbh, SplitMethod, DEFAULT_MAX_LEAF_SIZE};
use camera::Camera;
use integrator::*;
use material::*;
use math::*;
use obj;
use perlin::Perlin;
use sampler::{Sampler, IndependentSampler, CmjSampler};
use sphere::Sphere;
use stats;
use surface::{Surface, SurfaceGroup, HitInfo};
use texture::{Texture, Image};
use triangle::{Mesh, MeshData, Triangle};

#[derive(Debug)]
pub struct Error(pub String);

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "scene error: {}", self.0)
	}
}

impl ::std::error::Error for Error {}

pub type Result<T> = ::std::result::Result<T, Error>;

fn err<T, S: Into<String>>(msg: S) -> Result<T> {
	Err(Error(msg.into()))
}

pub struct Scene {
	pub surfaces: Bbh,
	pub emitters: SurfaceGroup,
	pub background: Vec3,
	pub camera: Camera,
	pub sampler: Box<Sampler>,
	pub integrator: Box<Integrator>,
}

impl Scene {
	pub fn from_json(json: &Value, dir: &Path) -> Result<Scene> {
		let obj = match json.as_object() {
			Some(obj) => obj,
			None => return err("expected a JSON object at the top level"),
		};

		for key in obj.keys() {
			match key.as_str() {
				"camera" | "sampler" | "integrator" | "accelerator"
				| "background" | "materials" | "surfaces" => {},
				other => eprintln!("Warning: unknown scene field \"{}\"", other),
			}
		}

		let camera = match obj.get("camera") {
			Some(v) => parse_camera(v)?,
			None => return err("missing camera"),
		};

		let sampler = match obj.get("sampler") {
			Some(v) => parse_sampler(v)?,
			None => Box::new(IndependentSampler::new(1)) as Box<Sampler>,
		};

		let integrator = match obj.get("integrator") {
			Some(v) => parse_integrator(v)?,
			None => Box::new(PathTracerMats { max_bounces: 64 }) as Box<Integrator>,
		};

		let background = match obj.get("background") {
			Some(v) => parse_vec3(v)?,
			None => Vec3::thrice(0.2),
		};

		let mut materials = HashMap::new();
		if let Some(list) = obj.get("materials") {
			let list = match list.as_array() {
				Some(list) => list,
				None => return err("materials must be an array"),
			};
			for m in list {
				let name = get_str(m, "name")?.to_owned();
				let mat = parse_material(m, dir)?;
				materials.insert(name, mat);
			}
		}

		let mut surfaces: Vec<Arc<Surface>> = Vec::new();
		if let Some(list) = obj.get("surfaces") {
			let list = match list.as_array() {
				Some(list) => list,
				None => return err("surfaces must be an array"),
			};
			for s in list {
				parse_surface(s, &materials, dir, &mut surfaces)?;
			}
		}

		let mut emitters = SurfaceGroup::new();
		for s in &surfaces {
			if s.is_emissive() {
				emitters.add_child(s.clone());
			}
		}

		let (max_leaf_size, split_method) = match obj.get("accelerator") {
			Some(v) => parse_accelerator(v)?,
			None => (DEFAULT_MAX_LEAF_SIZE, SplitMethod::Equal),
		};
		let surfaces = Bbh::build(surfaces, max_leaf_size, split_method);

		Ok(Scene { surfaces, emitters, background, camera, sampler, integrator })
	}

	pub fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
		stats::ray_traced();
		self.surfaces.intersect(ray)
	}
}

// --- JSON field helpers ---

fn get_str<'a>(v: &'a Value, field: &str) -> Result<&'a str> {
	match v.get(field).and_then(Value::as_str) {
		Some(s) => Ok(s),
		None => err(format!("missing string field \"{}\"", field)),
	}
}

fn parse_f32(v: &Value) -> Result<f32> {
	match v.as_f64() {
		Some(f) => Ok(f as f32),
		None => err(format!("expected a number, got {}", v)),
	}
}

fn get_f32(v: &Value, field: &str, default: f32) -> Result<f32> {
	match v.get(field) {
		Some(f) => parse_f32(f),
		None => Ok(default),
	}
}

fn parse_vec3(v: &Value) -> Result<Vec3> {
	if let Some(f) = v.as_f64() {
		return Ok(Vec3::thrice(f as f32));
	}
	match v.as_array() {
		Some(a) if a.len() == 3 => {
			Ok(Vec3::new(parse_f32(&a[0])?, parse_f32(&a[1])?, parse_f32(&a[2])?))
		},
		_ => err(format!("expected a number or an array of 3 numbers, got {}", v)),
	}
}

fn get_vec3(v: &Value, field: &str, default: Vec3) -> Result<Vec3> {
	match v.get(field) {
		Some(f) => parse_vec3(f),
		None => Ok(default),
	}
}

// --- transforms ---

fn parse_transform(v: &Value) -> Result<Mat4> {
	if let Some(list) = v.as_array() {
		// a list of transforms composes left to right
		let mut m = Mat4::identity();
		for t in list {
			m = parse_single_transform(t)? * m;
		}
		return Ok(m);
	}
	parse_single_transform(v)
}

fn parse_single_transform(v: &Value) -> Result<Mat4> {
	let obj = match v.as_object() {
		Some(obj) => obj,
		None => return err(format!("expected a transform object, got {}", v)),
	};

	if obj.contains_key("from") || obj.contains_key("at") || obj.contains_key("up") {
		let from = get_vec3(v, "from", Vec3::zero())?;
		let at = get_vec3(v, "at", Vec3::new(0.0, 0.0, 1.0))?;
		let up = get_vec3(v, "up", Vec3::new(0.0, 1.0, 0.0))?;
		return Ok(Mat4::look_at(from, at, up));
	}

	if obj.contains_key("o") || obj.contains_key("x") || obj.contains_key("y") || obj.contains_key("z") {
		let o = get_vec3(v, "o", Vec3::zero())?;
		let x = get_vec3(v, "x", Vec3::new(1.0, 0.0, 0.0))?;
		let y = get_vec3(v, "y", Vec3::new(0.0, 1.0, 0.0))?;
		let z = get_vec3(v, "z", Vec3::new(0.0, 0.0, 1.0))?;
		return Ok(Mat4([
			x.x, y.x, z.x, o.x,
			x.y, y.y, z.y, o.y,
			x.z, y.z, z.z, o.z,
			0.0, 0.0, 0.0, 1.0,
		]));
	}

	let mut m = Mat4::identity();
	if let Some(s) = obj.get("scale") {
		m = Mat4::scale(parse_vec3(s)?) * m;
	}
	if let Some(r) = obj.get("rotate") {
		m = Mat4::rot_yxz(parse_vec3(r)?) * m;
	}
	if let Some(t) = obj.get("translate") {
		m = Mat4::translate(parse_vec3(t)?) * m;
	}
	Ok(m)
}

// --- scene components ---

fn parse_camera(v: &Value) -> Result<Camera> {
	let transform = match v.get("transform") {
		Some(t) => parse_transform(t)?,
		None => Mat4::identity(),
	};
	let resolution = match v.get("resolution") {
		Some(r) => {
			let a = match r.as_array() {
				Some(a) if a.len() == 2 => a,
				_ => return err("camera resolution must be an array of 2 numbers"),
			};
			(parse_f32(&a[0])? as usize, parse_f32(&a[1])? as usize)
		},
		None => (512, 512),
	};
	let vfov = get_f32(v, "vfov", 90.0)?;
	let aperture = v.get("aperture").map(parse_f32).map_or(Ok(None), |r| r.map(Some))?;
	let fdist = v.get("fdist").map(parse_f32).map_or(Ok(None), |r| r.map(Some))?;
	Ok(Camera::new(&transform, resolution, vfov, aperture, fdist))
}

fn parse_sampler(v: &Value) -> Result<Box<Sampler>> {
	let kind = match v.get("type") {
		Some(t) => t.as_str().unwrap_or(""),
		None => "independent",
	};
	let samples = get_f32(v, "samples", 1.0)? as u32;
	let seed = get_f32(v, "seed", 0.0)? as u32;

	let mut sampler: Box<Sampler> = match kind {
		"independent" => Box::new(IndependentSampler::new(samples)),
		"cmj" => Box::new(CmjSampler::new(samples)),
		other => return err(format!("unknown sampler type \"{}\"", other)),
	};
	sampler.set_base_seed(seed);
	Ok(sampler)
}

fn parse_integrator(v: &Value) -> Result<Box<Integrator>> {
	let kind = get_str(v, "type")?;
	let max_bounces = get_f32(v, "max bounces", 64.0)? as u32;

	Ok(match kind {
		"normals" => Box::new(NormalsIntegrator),
		"ao" => Box::new(AmbientOcclusion),
		"path tracer mats" => Box::new(PathTracerMats { max_bounces }),
		"path tracer nee" => Box::new(PathTracerNee { max_bounces }),
		"path tracer mis" => Box::new(PathTracerMis { max_bounces }),
		"path tracer mixture" => Box::new(PathTracerMixture { max_bounces }),
		other => return err(format!("unknown integrator type \"{}\"", other)),
	})
}

fn parse_accelerator(v: &Value) -> Result<(usize, SplitMethod)> {
	let max_leaf_size = get_f32(v, "max_leaf_size", DEFAULT_MAX_LEAF_SIZE as f32)? as usize;
	let split_method = match v.get("split_method") {
		Some(s) => {
			let name = s.as_str().unwrap_or("");
			match SplitMethod::from_name(name) {
				Some(m) => m,
				None => return err(format!("unknown split method \"{}\"", name)),
			}
		},
		None => SplitMethod::Equal,
	};
	Ok((max_leaf_size, split_method))
}

fn parse_texture(v: &Value, dir: &Path) -> Result<Texture> {
	// plain numbers and arrays are constant textures
	if !v.is_object() {
		return Ok(Texture::Constant(parse_vec3(v)?));
	}

	match get_str(v, "type")? {
		"constant" => Ok(Texture::Constant(get_vec3(v, "color", Vec3::thrice(0.5))?)),
		"checker" => {
			let on_color = get_vec3(v, "on_color", Vec3::thrice(1.0))?;
			let off_color = get_vec3(v, "off_color", Vec3::thrice(0.0))?;
			let res = get_f32(v, "resolution", 16.0)?;
			Ok(Texture::Checker { on_color, off_color, resolution: (res, res) })
		},
		"marble" => {
			let veins = get_vec3(v, "veins", Vec3::zero())?;
			let base = get_vec3(v, "base", Vec3::thrice(1.0))?;
			let scale = get_f32(v, "scale", 1.0)?;
			let seed = get_f32(v, "seed", 0.0)? as u32;
			Ok(Texture::Marble { veins, base, scale, perlin: Perlin::new(seed) })
		},
		"bitmap" => {
			let filename = get_str(v, "filename")?;
			let path = dir.join(filename);
			match Image::load_ldr(&path) {
				Ok(img) => Ok(Texture::Bitmap(img)),
				Err(e) => err(format!("cannot load texture {}: {}", path.display(), e)),
			}
		},
		other => err(format!("unknown texture type \"{}\"", other)),
	}
}

fn parse_material(v: &Value, dir: &Path) -> Result<Arc<Material>> {
	let kind = get_str(v, "type")?;

	let albedo = |v: &Value| -> Result<Texture> {
		match v.get("albedo") {
			Some(a) => parse_texture(a, dir),
			None => Ok(Texture::Constant(Vec3::thrice(0.8))),
		}
	};

	Ok(match kind {
		"lambertian" => Arc::new(Lambertian { albedo: albedo(v)? }),
		"metal" => Arc::new(Metal {
			albedo: albedo(v)?,
			roughness: get_f32(v, "roughness", 0.0)?,
		}),
		"dielectric" => Arc::new(Dielectric { ior: get_f32(v, "ior", 1.5)? }),
		"phong" => Arc::new(Phong {
			albedo: albedo(v)?,
			exponent: get_f32(v, "exponent", 100.0)?,
		}),
		"blinn_phong" => Arc::new(BlinnPhong {
			albedo: albedo(v)?,
			exponent: get_f32(v, "exponent", 100.0)?,
		}),
		"diffuse_light" => Arc::new(DiffuseLight {
			emit: get_vec3(v, "emit", Vec3::thrice(1.0))?,
		}),
		other => return err(format!("unknown material type \"{}\"", other)),
	})
}

/// A surface's material is either a reference to a named material or an
/// inline material object
fn resolve_material(v: &Value, materials: &HashMap<String, Arc<Material>>, dir: &Path) -> Result<Arc<Material>> {
	let field = match v.get("material") {
		Some(f) => f,
		None => return err("missing surface material"),
	};

	if let Some(name) = field.as_str() {
		return match materials.get(name) {
			Some(mat) => Ok(mat.clone()),
			None => err(format!("unknown material \"{}\"", name)),
		};
	}
	parse_material(field, dir)
}

fn push_mesh(data: MeshData, mat: Arc<Material>, out: &mut Vec<Arc<Surface>>) {
	let nb_faces = data.faces.len();
	let mesh = Arc::new(Mesh::new(data, mat));
	for face in 0..nb_faces {
		out.push(Arc::new(Triangle::new(mesh.clone(), face as u32)));
	}
}

fn parse_surface(v: &Value, materials: &HashMap<String, Arc<Material>>, dir: &Path, out: &mut Vec<Arc<Surface>>) -> Result<()> {
	match get_str(v, "type")? {
		"sphere" => {
			let center = get_vec3(v, "center", Vec3::zero())?;
			let radius = get_f32(v, "radius", 1.0)?;
			let mat = resolve_material(v, materials, dir)?;
			out.push(Arc::new(Sphere::new(center, radius, mat)));
		},
		"quad" => {
			let size = match v.get("size") {
				Some(s) => {
					if let Some(f) = s.as_f64() {
						(f as f32, f as f32)
					} else {
						let p = parse_vec3(s)?;
						(p.x, p.y)
					}
				},
				None => (1.0, 1.0),
			};
			let transform = match v.get("transform") {
				Some(t) => parse_transform(t)?,
				None => Mat4::identity(),
			};
			let mat = resolve_material(v, materials, dir)?;

			// two triangles spanning [-w/2; w/2] x [-h/2; h/2] in the XY plane
			let (hw, hh) = (size.0 * 0.5, size.1 * 0.5);
			let corners = [
				Vec3::new(-hw, -hh, 0.0),
				Vec3::new( hw, -hh, 0.0),
				Vec3::new( hw,  hh, 0.0),
				Vec3::new(-hw,  hh, 0.0),
			];
			let normal = transform.transform_vector(Vec3::new(0.0, 0.0, 1.0)).normalized();
			let data = MeshData {
				vertices: corners.iter().map(|&p| transform.transform_point(p)).collect(),
				normals: vec![normal; 4],
				uvs: vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
				faces: vec![[0, 1, 2], [0, 2, 3]],
			};
			push_mesh(data, mat, out);
		},
		"triangle" => {
			let positions = match v.get("positions").and_then(Value::as_array) {
				Some(a) if a.len() == 3 => a,
				_ => return err("triangle positions must be an array of 3 points"),
			};
			let vertices = positions.iter().map(parse_vec3).collect::<Result<Vec<_>>>()?;
			let normals = match v.get("normals").and_then(Value::as_array) {
				Some(a) if a.len() == 3 => {
					a.iter().map(parse_vec3).collect::<Result<Vec<_>>>()?
				},
				_ => vec![],
			};
			let mat = resolve_material(v, materials, dir)?;
			let data = MeshData { vertices, normals, uvs: vec![], faces: vec![[0, 1, 2]] };
			push_mesh(data, mat, out);
		},
		"mesh" => {
			let filename = get_str(v, "filename")?;
			let transform = match v.get("transform") {
				Some(t) => parse_transform(t)?,
				None => Mat4::identity(),
			};
			let mat = resolve_material(v, materials, dir)?;
			for (_, data) in obj::load(dir.join(filename), &transform)? {
				push_mesh(data, mat.clone(), out);
			}
		},
		other => return err(format!("unknown surface type \"{}\"", other)),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use math::*;
	use serde_json;

	fn parse(text: &str) -> Result<Scene> {
		let json: Value = serde_json::from_str(text).unwrap();
		Scene::from_json(&json, Path::new("."))
	}

	#[test]
	fn test_minimal_scene() {
		let scene = parse(r#"{
			"camera": {
				"transform": { "from": [0, 0, 4], "at": [0, 0, 0] },
				"resolution": [64, 64],
				"vfov": 45
			},
			"sampler": { "type": "cmj", "samples": 16 },
			"integrator": { "type": "path tracer nee", "max bounces": 8 },
			"background": 0.1,
			"materials": [
				{ "name": "gray", "type": "lambertian", "albedo": 0.7 },
				{ "name": "lamp", "type": "diffuse_light", "emit": [5, 5, 5] }
			],
			"surfaces": [
				{ "type": "sphere", "radius": 1, "material": "gray" },
				{ "type": "sphere", "center": [0, 3, 0], "radius": 0.5, "material": "lamp" },
				{ "type": "quad", "size": 4, "material": { "type": "metal", "roughness": 0.1 } }
			]
		}"#).unwrap();

		assert_eq!(scene.background, Vec3::thrice(0.1));
		assert_eq!(scene.sampler.sample_count(), 16);
		assert_eq!(scene.camera.resolution(), (64, 64));
		// the quad contributes two triangles
		assert_eq!(scene.surfaces.len(), 4);
		assert_eq!(scene.emitters.len(), 1);
		assert!(scene.emitters.is_emissive());
	}

	#[test]
	fn test_missing_camera_is_an_error() {
		assert!(parse(r#"{ "surfaces": [] }"#).is_err());
	}

	#[test]
	fn test_unknown_material_reference() {
		let r = parse(r#"{
			"camera": {},
			"surfaces": [ { "type": "sphere", "material": "nope" } ]
		}"#);
		assert!(r.is_err());
	}

	#[test]
	fn test_unknown_integrator_is_an_error() {
		let r = parse(r#"{
			"camera": {},
			"integrator": { "type": "path_tracer_nee" }
		}"#);
		assert!(r.is_err());
	}

	#[test]
	fn test_marble_material() {
		let scene = parse(r#"{
			"camera": {},
			"surfaces": [ {
				"type": "sphere",
				"material": {
					"type": "lambertian",
					"albedo": { "type": "marble", "veins": 0, "base": 1, "scale": 4 }
				}
			} ]
		}"#).unwrap();
		assert_eq!(scene.surfaces.len(), 1);
	}

	#[test]
	fn test_missing_bitmap_is_an_error() {
		let r = parse(r#"{
			"camera": {},
			"surfaces": [ {
				"type": "sphere",
				"material": {
					"type": "lambertian",
					"albedo": { "type": "bitmap", "filename": "does-not-exist.png" }
				}
			} ]
		}"#);
		assert!(r.is_err());
	}

	#[test]
	fn test_intersects_parsed_sphere() {
		let scene = parse(r#"{
			"camera": {},
			"surfaces": [ { "type": "sphere", "center": [0, 0, 5], "radius": 1, "material": { "type": "lambertian" } } ]
		}"#).unwrap();
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
		let hit = scene.intersect(&ray).unwrap();
		assert!((hit.t - 4.0).abs() < 1e-4);
	}
}
