use std::sync::Arc;
use std::cmp::Ordering;

use rayon;

use math::*;
use surface::{Surface, HitInfo};
use stats;

/// Below this depth subtrees are built on the rayon pool
const PARALLEL_BUILD_DEPTH: usize = 4;

pub const DEFAULT_MAX_LEAF_SIZE: usize = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SplitMethod {
	/// Median split along the longest axis
	Equal,
	/// Split at the spatial middle of the longest axis
	Middle,
	Sah,
}

impl SplitMethod {
	pub fn from_name(name: &str) -> Option<SplitMethod> {
		match name {
			"equal" => Some(SplitMethod::Equal),
			"middle" => Some(SplitMethod::Middle),
			"sah" => Some(SplitMethod::Sah),
			_ => None,
		}
	}
}

enum Node {
	Interior { bbox: AABB, left: Box<Node>, right: Box<Node> },
	Leaf { bbox: AABB, surfaces: Vec<Arc<Surface>> },
}

impl Node {
	fn bbox(&self) -> &AABB {
		match *self {
			Node::Interior { ref bbox, .. } => bbox,
			Node::Leaf { ref bbox, .. } => bbox,
		}
	}
}

/// Bounding box hierarchy over a set of surfaces
pub struct Bbh {
	root: Option<Node>,
	bounds: AABB,
}

impl Bbh {
	pub fn build(surfaces: Vec<Arc<Surface>>, max_leaf_size: usize, split_method: SplitMethod) -> Bbh {
		let bounds = enclose_all(&surfaces);
		let root = if surfaces.is_empty() {
			None
		} else {
			Some(build_node(surfaces, max_leaf_size.max(1), split_method, 0))
		};
		Bbh { root, bounds }
	}

	pub fn len(&self) -> usize {
		fn count(node: &Node) -> usize {
			match *node {
				Node::Interior { ref left, ref right, .. } => count(left) + count(right),
				Node::Leaf { ref surfaces, .. } => surfaces.len(),
			}
		}
		self.root.as_ref().map_or(0, count)
	}
}

fn enclose_all(surfaces: &[Arc<Surface>]) -> AABB {
	let mut bounds = AABB::empty();
	for s in surfaces {
		bounds.enclose(&s.bounds());
	}
	bounds
}

fn centroid(s: &Arc<Surface>) -> Vec3 {
	s.bounds().center()
}

/// Sort the middle element into place, splitting the slice in two halves
/// of surfaces with smaller and larger centroids along the given axis
fn equal_split(surfaces: &mut Vec<Arc<Surface>>, axis: Axis) -> usize {
	let mid = surfaces.len() / 2;
	surfaces.select_nth_unstable_by(mid, |a, b| {
		centroid(a)[axis].partial_cmp(&centroid(b)[axis]).unwrap_or(Ordering::Equal)
	});
	mid
}

fn build_node(mut surfaces: Vec<Arc<Surface>>, max_leaf_size: usize, split_method: SplitMethod, depth: usize) -> Node {
	let bbox = enclose_all(&surfaces);
	if surfaces.len() <= max_leaf_size {
		return Node::Leaf { bbox, surfaces };
	}

	// a pair splits into two leaves without running a partition
	if surfaces.len() == 2 {
		let right_surfaces = surfaces.split_off(1);
		let left_bbox = enclose_all(&surfaces);
		let right_bbox = enclose_all(&right_surfaces);
		return Node::Interior {
			bbox,
			left: Box::new(Node::Leaf { bbox: left_bbox, surfaces }),
			right: Box::new(Node::Leaf { bbox: right_bbox, surfaces: right_surfaces }),
		};
	}

	let axis = bbox.longuest_axis();
	let mid = match split_method {
		SplitMethod::Equal | SplitMethod::Sah => equal_split(&mut surfaces, axis),
		SplitMethod::Middle => {
			let center = bbox.center()[axis];
			let (mut left, right): (Vec<_>, Vec<_>) =
				surfaces.drain(..).partition(|s| centroid(s)[axis] < center);
			let mid = left.len();
			left.extend(right);
			surfaces = left;
			// degenerate partitions happen when centroids coincide
			if mid == 0 || mid == surfaces.len() {
				equal_split(&mut surfaces, axis)
			} else {
				mid
			}
		},
	};

	let right_surfaces = surfaces.split_off(mid);
	let left_surfaces = surfaces;

	let (left, right) = if depth < PARALLEL_BUILD_DEPTH {
		rayon::join(
			|| build_node(left_surfaces, max_leaf_size, split_method, depth + 1),
			|| build_node(right_surfaces, max_leaf_size, split_method, depth + 1),
		)
	} else {
		(build_node(left_surfaces, max_leaf_size, split_method, depth + 1),
		 build_node(right_surfaces, max_leaf_size, split_method, depth + 1))
	};

	Node::Interior { bbox, left: Box::new(left), right: Box::new(right) }
}

fn intersect_node<'a>(node: &'a Node, ray: &mut Ray) -> Option<HitInfo<'a>> {
	stats::bbh_node_visited();
	if !node.bbox().intersect(ray) {
		return None;
	}

	match *node {
		Node::Leaf { ref surfaces, .. } => {
			let mut closest = None;
			for surface in surfaces {
				if let Some(hit) = surface.intersect(ray) {
					ray.maxt = hit.t;
					closest = Some(hit);
				}
			}
			closest
		},
		Node::Interior { ref left, ref right, .. } => {
			// the left result shrinks maxt, so a hit on the right is closer
			let left_hit = intersect_node(left, ray);
			if let Some(ref hit) = left_hit {
				ray.maxt = hit.t;
			}
			let right_hit = intersect_node(right, ray);
			right_hit.or(left_hit)
		},
	}
}

impl Surface for Bbh {
	fn bounds(&self) -> AABB {
		self.bounds
	}

	fn intersect(&self, ray: &Ray) -> Option<HitInfo> {
		let root = self.root.as_ref()?;
		let mut ray = *ray;
		intersect_node(root, &mut ray)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use rand::{Rng, SeedableRng, XorShiftRng};
	use math::*;
	use material::Lambertian;
	use sphere::Sphere;
	use surface::{Surface, SurfaceGroup};
	use texture::Texture;

	fn random_spheres(n: usize, seed: [u32; 4]) -> Vec<Arc<Surface>> {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let mut rng = XorShiftRng::from_seed(seed);
		(0..n).map(|_| {
			let center = Vec3::new(
				rng.gen_range(-10.0, 10.0),
				rng.gen_range(-10.0, 10.0),
				rng.gen_range(-10.0, 10.0),
			);
			let radius = rng.gen_range(0.1, 1.0);
			Arc::new(Sphere::new(center, radius, mat.clone())) as Arc<Surface>
		}).collect()
	}

	fn compare_against_linear_scan(split_method: SplitMethod) {
		let surfaces = random_spheres(100, [1, 2, 3, 4]);
		let mut group = SurfaceGroup::new();
		for s in &surfaces {
			group.add_child(s.clone());
		}
		let bbh = Bbh::build(surfaces, 1, split_method);

		let mut rng = XorShiftRng::from_seed([5, 6, 7, 8]);
		for _ in 0..200 {
			let origin = Vec3::new(
				rng.gen_range(-15.0, 15.0),
				rng.gen_range(-15.0, 15.0),
				rng.gen_range(-15.0, 15.0),
			);
			let direction = Vec3::new(
				rng.gen_range(-1.0, 1.0),
				rng.gen_range(-1.0, 1.0),
				rng.gen_range(-1.0, 1.0),
			);
			if direction.length() < 1e-3 {
				continue;
			}
			let ray = Ray::new(origin, direction.normalized());

			match (bbh.intersect(&ray), group.intersect(&ray)) {
				(Some(a), Some(b)) => assert!((a.t - b.t).abs() < 1e-4),
				(None, None) => {},
				_ => panic!("hierarchy and linear scan disagree"),
			}
		}
	}

	#[test]
	fn test_matches_linear_scan_equal() {
		compare_against_linear_scan(SplitMethod::Equal);
	}

	#[test]
	fn test_matches_linear_scan_middle() {
		compare_against_linear_scan(SplitMethod::Middle);
	}

	#[test]
	fn test_bounds_enclose_children() {
		let surfaces = random_spheres(50, [9, 10, 11, 12]);
		let child_bounds: Vec<AABB> = surfaces.iter().map(|s| s.bounds()).collect();
		let bbh = Bbh::build(surfaces, 2, SplitMethod::Middle);
		for b in &child_bounds {
			assert!(bbh.bounds().contains(b));
		}
	}

	fn node_size(node: &Node) -> usize {
		match *node {
			Node::Interior { ref left, ref right, .. } => node_size(left) + node_size(right),
			Node::Leaf { ref surfaces, .. } => surfaces.len(),
		}
	}

	fn assert_children_non_empty(node: &Node) {
		if let Node::Interior { ref left, ref right, .. } = *node {
			assert!(node_size(left) > 0, "empty left child");
			assert!(node_size(right) > 0, "empty right child");
			assert_children_non_empty(left);
			assert_children_non_empty(right);
		}
	}

	#[test]
	fn test_no_interior_node_has_an_empty_child() {
		for &method in &[SplitMethod::Equal, SplitMethod::Middle] {
			let bbh = Bbh::build(random_spheres(100, [1, 2, 3, 4]), 1, method);
			if let Some(ref root) = bbh.root {
				assert_children_non_empty(root);
			}
		}

		// coincident centroids degenerate the midpoint partition
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let surfaces: Vec<Arc<Surface>> = (0..16)
			.map(|_| Arc::new(Sphere::new(Vec3::zero(), 1.0, mat.clone())) as Arc<Surface>)
			.collect();
		let bbh = Bbh::build(surfaces, 1, SplitMethod::Middle);
		if let Some(ref root) = bbh.root {
			assert_children_non_empty(root);
		}
	}

	#[test]
	fn test_two_surfaces_become_two_leaves() {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let surfaces: Vec<Arc<Surface>> = vec![
			Arc::new(Sphere::new(Vec3::new(-2.0, 0.0, 5.0), 1.0, mat.clone())),
			Arc::new(Sphere::new(Vec3::new(2.0, 0.0, 5.0), 1.0, mat)),
		];
		let bbh = Bbh::build(surfaces, 1, SplitMethod::Equal);
		assert_eq!(bbh.len(), 2);

		match bbh.root {
			Some(Node::Interior { ref left, ref right, .. }) => {
				let leaf = |n: &Node| match *n {
					Node::Leaf { ref surfaces, .. } => surfaces.len(),
					Node::Interior { .. } => panic!("expected a leaf child"),
				};
				assert_eq!(leaf(left), 1);
				assert_eq!(leaf(right), 1);
			},
			_ => panic!("expected an interior root over two leaves"),
		}

		let ray = Ray::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
		let hit = bbh.intersect(&ray).unwrap();
		assert!((hit.t - 4.0).abs() < 1e-4);
	}

	#[test]
	fn test_empty_build() {
		let bbh = Bbh::build(Vec::new(), 1, SplitMethod::Equal);
		let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
		assert!(bbh.intersect(&ray).is_none());
		assert_eq!(bbh.len(), 0);
	}

	#[test]
	fn test_coincident_centroids_terminate() {
		let mat = Arc::new(Lambertian { albedo: Texture::Constant(Vec3::thrice(0.5)) });
		let surfaces: Vec<Arc<Surface>> = (0..16)
			.map(|_| Arc::new(Sphere::new(Vec3::zero(), 1.0, mat.clone())) as Arc<Surface>)
			.collect();
		let bbh = Bbh::build(surfaces, 1, SplitMethod::Middle);
		assert_eq!(bbh.len(), 16);
		let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
		assert!(bbh.intersect(&ray).is_some());
	}
}
