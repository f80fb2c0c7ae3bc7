use std::sync::atomic::{AtomicUsize, Ordering};

// Relaxed counters; totals are only read once rendering is done
static RAYS_TRACED: AtomicUsize = AtomicUsize::new(0);
static SPHERE_TESTS: AtomicUsize = AtomicUsize::new(0);
static SPHERE_HITS: AtomicUsize = AtomicUsize::new(0);
static TRIANGLE_TESTS: AtomicUsize = AtomicUsize::new(0);
static TRIANGLE_HITS: AtomicUsize = AtomicUsize::new(0);
static BBH_NODES_VISITED: AtomicUsize = AtomicUsize::new(0);
static NAN_SAMPLES: AtomicUsize = AtomicUsize::new(0);

#[inline(always)]
pub fn ray_traced() {
	RAYS_TRACED.fetch_add(1, Ordering::Relaxed);
}

#[inline(always)]
pub fn sphere_test(hit: bool) {
	SPHERE_TESTS.fetch_add(1, Ordering::Relaxed);
	if hit {
		SPHERE_HITS.fetch_add(1, Ordering::Relaxed);
	}
}

#[inline(always)]
pub fn triangle_test(hit: bool) {
	TRIANGLE_TESTS.fetch_add(1, Ordering::Relaxed);
	if hit {
		TRIANGLE_HITS.fetch_add(1, Ordering::Relaxed);
	}
}

#[inline(always)]
pub fn bbh_node_visited() {
	BBH_NODES_VISITED.fetch_add(1, Ordering::Relaxed);
}

#[inline(always)]
pub fn nan_sample() {
	NAN_SAMPLES.fetch_add(1, Ordering::Relaxed);
}

pub fn reset() {
	for c in &[&RAYS_TRACED, &SPHERE_TESTS, &SPHERE_HITS, &TRIANGLE_TESTS,
	           &TRIANGLE_HITS, &BBH_NODES_VISITED, &NAN_SAMPLES] {
		c.store(0, Ordering::Relaxed);
	}
}

pub fn report() -> String {
	let rays = RAYS_TRACED.load(Ordering::Relaxed);
	let st = SPHERE_TESTS.load(Ordering::Relaxed);
	let sh = SPHERE_HITS.load(Ordering::Relaxed);
	let tt = TRIANGLE_TESTS.load(Ordering::Relaxed);
	let th = TRIANGLE_HITS.load(Ordering::Relaxed);
	let nodes = BBH_NODES_VISITED.load(Ordering::Relaxed);
	let nans = NAN_SAMPLES.load(Ordering::Relaxed);

	let ratio = |h: usize, t: usize| if t == 0 { 0.0 } else { 100.0 * h as f64 / t as f64 };
	format!(
		"rays traced: {}\n\
		 sphere tests: {} ({:.1}% hit)\n\
		 triangle tests: {} ({:.1}% hit)\n\
		 bbh nodes visited: {}\n\
		 NaN samples discarded: {}",
		rays, st, ratio(sh, st), tt, ratio(th, tt), nodes, nans)
}
