use std::sync::Arc;

use math::*;
use material::Material;
use surface::{Surface, HitInfo, EmitterRecord};
use warp;
use stats;

/// Represent vertex indices in triangles; 2^32 vertices should be enough
pub type Index = u32;

/// Indexed triangle geometry, separated from shading data so it can be
/// serialized to the mesh cache.
///
/// N.B. There is a 1-1 correspondence between vertices, normals and uvs;
/// normals and uvs may be empty, in which case geometric normals and
/// barycentric coordinates are used instead.
#[derive(Serialize, Deserialize)]
pub struct MeshData {
	pub vertices: Vec<Vec3>,
	pub normals: Vec<Vec3>,
	pub uvs: Vec<(f32, f32)>,
	pub faces: Vec<[Index; 3]>,
}

pub struct Mesh {
	pub data: MeshData,
	pub mat: Arc<Material>,
}

impl Mesh {
	pub fn new(data: MeshData, mat: Arc<Material>) -> Mesh {
		Mesh { data, mat }
	}

	fn corners(&self, face: usize) -> (Vec3, Vec3, Vec3) {
		let idxs = self.data.faces[face];
		(self.data.vertices[idxs[0] as usize],
		 self.data.vertices[idxs[1] as usize],
		 self.data.vertices[idxs[2] as usize])
	}
}

/// One face of a mesh, the unit stored in the acceleration structure
pub struct Triangle {
	pub mesh: Arc<Mesh>,
	pub face: u32,
}

const TRI_EPSILON: f32 = 0.0000001;

impl Triangle {
	pub fn new(mesh: Arc<Mesh>, face: u32) -> Triangle {
		Triangle { mesh, face }
	}

	fn area(&self) -> f32 {
		let (v0, v1, v2) = self.mesh.corners(self.face as usize);
		Vec3::cross(v1 - v0, v2 - v0).length() * 0.5
	}
}

impl Surface for Triangle {
	fn bounds(&self) -> AABB {
		let (v0, v1, v2) = self.mesh.corners(self.face as usize);
		let mut b = AABB::from_point(v0);
		b.extend_point(v1);
		b.extend_point(v2);

		// pad degenerate axes so the box has a nonzero extent everywhere
		let d = b.diagonal();
		if d.x < 1e-4 { b.min.x -= 5e-5; b.max.x += 5e-5; }
		if d.y < 1e-4 { b.min.y -= 5e-5; b.max.y += 5e-5; }
		if d.z < 1e-4 { b.min.z -= 5e-5; b.max.z += 5e-5; }
		b
	}

	fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
		let (v0, v1, v2) = self.mesh.corners(self.face as usize);
		let edge1 = v1 - v0;
		let edge2 = v2 - v0;

		let h = Vec3::cross(ray.direction, edge2);
		let a = Vec3::dot(edge1, h);
		if a > -TRI_EPSILON && a < TRI_EPSILON {
			stats::triangle_test(false);
			return None;
		}

		let f = 1.0 / a;
		let s = ray.origin - v0;
		let u = f * Vec3::dot(s, h);
		if u < 0.0 || u > 1.0 {
			stats::triangle_test(false);
			return None;
		}

		let q = Vec3::cross(s, edge1);
		let v = f * Vec3::dot(ray.direction, q);
		if v < 0.0 || u + v > 1.0 {
			stats::triangle_test(false);
			return None;
		}

		let t = f * Vec3::dot(edge2, q);
		if t < ray.mint || t > ray.maxt {
			stats::triangle_test(false);
			return None;
		}

		stats::triangle_test(true);

		let gn = Vec3::cross(edge1, edge2).normalized();
		let idxs = self.mesh.data.faces[self.face as usize];
		let w = 1.0 - u - v;

		let sn = if self.mesh.data.normals.is_empty() {
			gn
		} else {
			let n0 = self.mesh.data.normals[idxs[0] as usize];
			let n1 = self.mesh.data.normals[idxs[1] as usize];
			let n2 = self.mesh.data.normals[idxs[2] as usize];
			(n0 * w + n1 * u + n2 * v).normalized()
		};

		let uv = if self.mesh.data.uvs.is_empty() {
			(u, v)
		} else {
			let uv0 = self.mesh.data.uvs[idxs[0] as usize];
			let uv1 = self.mesh.data.uvs[idxs[1] as usize];
			let uv2 = self.mesh.data.uvs[idxs[2] as usize];
			(uv0.0 * w + uv1.0 * u + uv2.0 * v,
			 uv0.1 * w + uv1.1 * u + uv2.1 * v)
		};

		Some(HitInfo {
			t,
			p: ray.point_at(t),
			gn,
			sn,
			uv,
			mat: self.mesh.mat.as_ref(),
		})
	}

	fn sample<'a>(&'a self, rec: &mut EmitterRecord<'a>, rv: (f32, f32), _rv1: f32) -> Option<Vec3> {
		let (v0, v1, v2) = self.mesh.corners(self.face as usize);
		let p = warp::uniform_triangle(v0, v1, v2, rv);
		let (wi, dist) = Vec3::dir_and_dist(rec.o, p);

		let gn = Vec3::cross(v1 - v0, v2 - v0).normalized();
		let cos = Vec3::dot(wi, gn).abs();
		if cos < TRI_EPSILON {
			return None;
		}

		let ray = Ray::new(rec.o, wi);
		let hit = self.intersect(&ray)?;

		// convert the area density to a solid angle density
		let pdf = dist * dist / (cos * self.area());
		let emitted = hit.mat.emitted(wi, &hit);

		rec.wi = wi;
		rec.pdf = pdf;
		rec.hit = Some(hit);
		rec.emitter = Some(self);
		Some(emitted / pdf)
	}

	fn pdf(&self, o: Vec3, v: Vec3) -> f32 {
		let ray = Ray::new(o, v.normalized());
		let hit = match self.intersect(&ray) {
			Some(hit) => hit,
			None => return 0.0,
		};

		let cos = Vec3::dot(ray.direction, hit.gn).abs();
		if cos < TRI_EPSILON {
			return 0.0;
		}
		hit.t * hit.t / (cos * self.area())
	}

	fn is_emissive(&self) -> bool {
		self.mesh.mat.is_emissive()
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

	fn unit_triangle(mat: Arc<Material>) -> Triangle {
		let data = MeshData {
			vertices: vec![
				Vec3::new(0.0, 0.0, 0.0),
				Vec3::new(1.0, 0.0, 0.0),
				Vec3::new(0.0, 1.0, 0.0),
			],
			normals: vec![],
			uvs: vec![],
			faces: vec![[0, 1, 2]],
		};
		Triangle::new(Arc::new(Mesh::new(data, mat)), 0)
	}

	#[test]
	fn test_intersect_inside_and_outside() {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let tri = unit_triangle(mat);

		let hit_ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::new(0.0, 0.0, 1.0));
		let hit = tri.intersect(&hit_ray).unwrap();
		assert!((hit.t - 1.0).abs() < 1e-5);
		assert!((hit.gn.z.abs() - 1.0).abs() < 1e-5);

		// outside the triangle but inside its bounding box
		let miss_ray = Ray::new(Vec3::new(0.9, 0.9, -1.0), Vec3::new(0.0, 0.0, 1.0));
		assert!(tri.intersect(&miss_ray).is_none());
	}

	#[test]
	fn test_flat_bounds_are_padded() {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let tri = unit_triangle(mat);
		let b = tri.bounds();
		assert!(b.diagonal().z > 0.0);
	}

	#[test]
	fn test_sample_pdf_consistent() {
		let mat = Arc::new(DiffuseLight { emit: Vec3::thrice(2.0) });
		let tri = unit_triangle(mat);
		let o = Vec3::new(0.2, 0.2, -3.0);
		let mut rec = EmitterRecord::new(o);
		tri.sample(&mut rec, (0.4, 0.3), 0.0).unwrap();
		assert!(rec.pdf > 0.0);
		assert!((tri.pdf(o, rec.wi) - rec.pdf).abs() / rec.pdf < 1e-3);
	}
}
