use std::fs::{File, create_dir};
use std::env::temp_dir;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::collections::HashMap;
use bincode;

use math::*;
use scene::{Error, Result};
use triangle::{Index, MeshData};

struct ObjTriangle {
	vidxs: [Index; 3],
	nidxs: [Option<Index>; 3],
	uidxs: [Option<Index>; 3],
}

pub fn load<P: AsRef<Path>>(path: P, transform: &Mat4) -> Result<Vec<(String, MeshData)>> {
	// compute cache path from the filepath
	let hash = {
		let mut hasher = DefaultHasher::new();
		path.as_ref().hash(&mut hasher);
		for f in &transform.0 {
			f.to_bits().hash(&mut hasher);
		}
		hasher.finish()
	};
	let cache_path = temp_dir().join("obj_cache");
	let obj_cache = cache_path.join(hash.to_string());

	// load from cache if possible
	if let Ok(r) = File::open(&obj_cache) {
		println!("Mesh {} found in cache", path.as_ref().display());
		let mut br = BufReader::new(r);
		if let Ok(meshes) = bincode::deserialize_from(&mut br) {
			return Ok(meshes);
		}
		println!("Failed to load OBJ mesh from cache");
	}

	println!("Loading mesh {}", path.as_ref().display());

	let f = File::open(&path)
		.map_err(|e| Error(format!("cannot open {}: {}", path.as_ref().display(), e)))?;
	let f = BufReader::new(f);

	let mut vertices: Vec<Vec3> = Vec::new();
	let mut normals: Vec<Vec3> = Vec::new();
	let mut uvs: Vec<(f32, f32)> = Vec::new();
	let mut triangles: Vec<ObjTriangle> = Vec::new();
	let mut meshes = Vec::new();
	let mut curr_name = String::new();

	fn normalize_obj_idx(idx: isize, len: usize) -> Index {
		if idx < 0 {
			(len as isize + idx) as Index
		} else {
			idx as Index - 1
		}
	}

	fn parse_floats(iter: ::std::str::SplitWhitespace) -> Result<Vec<f32>> {
		iter.map(|s| s.parse::<f32>().map_err(|e| Error(format!("invalid OBJ number: {}", e))))
			.collect()
	}

	for line in f.lines() {
		let s = line.map_err(|e| Error(format!("OBJ read error: {}", e)))?;
		let mut iter = s.split_whitespace();
		match iter.next() {
			Some("v") => {
				let vs = parse_floats(iter)?;
				if vs.len() < 3 {
					return Err(Error("OBJ vertex with less than 3 coordinates".to_owned()));
				}
				let v = Vec3::new(vs[0], vs[1], vs[2]);
				vertices.push(transform.transform_point(v));
			},
			Some("vt") => {
				let v = parse_floats(iter)?;
				if v.len() < 2 {
					return Err(Error("OBJ uv with less than 2 coordinates".to_owned()));
				}
				uvs.push((v[0], v[1]));
			},
			Some("vn") => {
				let v = parse_floats(iter)?;
				if v.len() < 3 {
					return Err(Error("OBJ normal with less than 3 coordinates".to_owned()));
				}
				let n = Vec3::new(v[0], v[1], v[2]).normalized();
				debug_assert!(!n.has_nan(), "invalid normal");
				// TODO: transform normal
				normals.push(n);
			},
			Some("f") => {
				let g = iter.map(|group| {
					let mut iter = group.split('/');
					let vi = iter.next()
						.and_then(|s| s.parse::<isize>().ok())
						.map(|i| normalize_obj_idx(i, vertices.len()));
					let ui = iter.next()
						.and_then(|s| s.parse::<isize>().ok())
						.map(|i| normalize_obj_idx(i, uvs.len()));
					let ni = iter.next()
						.and_then(|s| s.parse::<isize>().ok())
						.map(|i| normalize_obj_idx(i, normals.len()));
					match vi {
						Some(vi) => Ok((vi, ui, ni)),
						None => Err(Error(format!("invalid OBJ face corner \"{}\"", group))),
					}
				}).collect::<Result<Vec<_>>>()?;
				// fan-triangulate polygonal faces
				for i in 2..g.len() {
					triangles.push(ObjTriangle {
						vidxs: [g[0].0, g[i-1].0, g[i].0],
						uidxs: [g[0].1, g[i-1].1, g[i].1],
						nidxs: [g[0].2, g[i-1].2, g[i].2],
					});
				}
			},
			Some("o") => {
				if !triangles.is_empty() {
					meshes.push((curr_name.clone(), create_mesh(&vertices, &normals, &uvs, &triangles)));
					triangles.clear();
				}
				curr_name = iter.next().unwrap_or_default().to_owned();
			}
			_ => {}
		}
	}

	if !triangles.is_empty() {
		meshes.push((curr_name.clone(), create_mesh(&vertices, &normals, &uvs, &triangles)));
	}
	println!("Loaded OBJ file with {} meshes", meshes.len());

	// cache the parsed meshes
	{
		let _ = create_dir(&cache_path);
		if let Ok(w) = File::create(&obj_cache) {
			let mut bw = BufWriter::new(w);
			if bincode::serialize_into(&mut bw, &meshes).is_err() {
				println!("Failed to cache OBJ mesh");
			}
		}
	}

	Ok(meshes)
}

/// create a mesh with given vertices, normals and triangles so that
/// - there is a 1-1 correspondence between vertices, normals and uvs
/// - vertices and normals are stored only if referred to in a triangle
fn create_mesh(vertices: &[Vec3], normals: &[Vec3], uvs: &[(f32, f32)], triangles: &[ObjTriangle]) -> MeshData {
	let mut vs = Vec::new();
	let mut ns = Vec::new();
	let mut us = Vec::new();
	let mut ts = Vec::new();
	let mut vertex_map = HashMap::with_capacity(vertices.len());

	let has_normals = triangles.iter().all(|t| t.nidxs.iter().all(Option::is_some));
	let has_uvs = triangles.iter().all(|t| t.uidxs.iter().all(Option::is_some));

	for obj_tri in triangles {
		let mut new_tri = [0 as Index; 3];

		for i in 0..3 {
			let vidx = obj_tri.vidxs[i];
			let nidx = obj_tri.nidxs[i];
			let uidx = obj_tri.uidxs[i];

			// check if we already created a new vertex for this triple
			new_tri[i] = match vertex_map.get(&(vidx, nidx, uidx)) {
				Some(&idx) => idx,
				None => {
					// if not, create a new one and store it
					let idx = vs.len() as Index;
					vs.push(vertices[vidx as usize]);
					if has_normals {
						ns.push(normals[nidx.unwrap() as usize]);
					}
					if has_uvs {
						us.push(uvs[uidx.unwrap() as usize]);
					}
					vertex_map.insert((vidx, nidx, uidx), idx);
					idx
				}
			};
		}

		ts.push(new_tri);
	}

	println!("Loaded mesh with {} vertices and {} triangles", vs.len(), ts.len());
	MeshData { vertices: vs, normals: ns, uvs: us, faces: ts }
}
