use std::fs::File;
use std::io::{Write, BufWriter};
use std::path::Path;
use image;
use math::{Vec3, bilerp, lerp};
use perlin::Perlin;

pub enum Texture {
	Constant(Vec3),
	Checker { on_color: Vec3, off_color: Vec3, resolution: (f32, f32) },
	Marble { veins: Vec3, base: Vec3, scale: f32, perlin: Perlin },
	Bitmap(Image),
}

impl Texture {
	pub fn eval(&self, (u, v): (f32, f32), p: Vec3) -> Vec3 {
		match *self {
			Texture::Constant(c) => c,
			Texture::Checker { on_color, off_color, resolution } => {
				let ui = (resolution.0 * u) as i32;
				let vi = (resolution.1 * v) as i32;
				let on = (ui ^ vi) & 1 != 0;
				if on { on_color } else { off_color }
			},
			Texture::Marble { veins, base, scale, ref perlin } => {
				// sine stripes along z, displaced by turbulent noise
				let alpha = 0.5 * (1.0 + (scale * p.z + 10.0 * perlin.turb(p, 7)).sin());
				lerp(veins, base, alpha)
			},
			Texture::Bitmap(ref img) => {
				img.eval((u, v))
			},
		}
	}
}

pub struct Image {
	pub width: usize,
	pub height: usize,
	pixels: Vec<Vec3>,
}

impl Image {
	pub fn new(width: usize, height: usize) -> Image {
		Image { width, height, pixels: vec![Vec3::zero(); width * height] }
	}

	pub fn load_ldr<P: AsRef<Path>>(filepath: P) -> image::ImageResult<Image> {
		let img = image::open(&filepath)?.to_rgb();
		let (width, height) = img.dimensions();

		Ok(Image {
			width: width as usize,
			height: height as usize,
			pixels: img.pixels().map(|p| gamma_decode(p.data)).collect(),
		})
	}

	pub fn get(&self, x: usize, y: usize) -> Vec3 {
		self.pixels[self.width * y + x]
	}

	pub fn set(&mut self, x: usize, y: usize, value: Vec3) {
		self.pixels[self.width * y + x] = value;
	}

	pub fn pixels(&self) -> &[Vec3] {
		&self.pixels
	}

	/// Evaluate the texture using parametric coordinates and bilinear interpolation
	pub fn eval(&self, (u, v): (f32, f32)) -> Vec3 {
		let w = self.width as isize;
		let h = self.height as isize;

		// Convert parametric coordinates to texture coordinates, accounting for
		// - the half-pixel offset due to the continuous to discrete conversion
		// - the vertical flip of texture coordinates
		let tu = w as f32 * u - 0.5;
		let tv = h as f32 * (1.0 - v) - 0.5;

		let x0 = tu.floor() as isize;
		let y0 = tv.floor() as isize;
		let x1 = x0 + 1;
		let y1 = y0 + 1;

		// Compute the offset from the pixel due to the fractional part of coordinates
		let dx = tu - x0 as f32;
		let dy = tv - y0 as f32;

		// Handle off-boundaries coordinates by wrapping them around, thus repeating the texture
		let x0 = modulo(x0, w);
		let x1 = modulo(x1, w);
		let y0 = modulo(y0, h);
		let y1 = modulo(y1, h);

		// Finally, returns the bilinear interpolation of the 4 surrounding pixel values
		let v00 = self.get(x0, y0);
		let v01 = self.get(x1, y0);
		let v10 = self.get(x0, y1);
		let v11 = self.get(x1, y1);
		bilerp(v00, v01, v10, v11, (dx, dy))
	}
}

/// Non-negative remainder of a divided by b.
fn modulo(a: isize, b: isize) -> usize {
	let r = a % b;
	(if r < 0 { r + b } else { r }) as usize
}

fn gamma_decode([r, g, b]: [u8; 3]) -> Vec3 {
	let f = |v| (v as f32 / 255.0).powf(2.2);
	Vec3::new(f(r), f(g), f(b))
}

fn gamma_encode(v: Vec3) -> Vec3 {
	v.map(|x| x.max(0.0).min(1.0).powf(1.0 / 2.2))
}

/// Write linear radiance values as a gamma-corrected 8-bit PPM
pub fn write_ppm_srgb<I>(path: &str, width: usize, height: usize, pixels: I)
	where I: IntoIterator<Item=Vec3>
{
	let mut f = BufWriter::new(File::create(path).unwrap());
	write!(f, "P6\n{} {}\n{}\n", width, height, 255).unwrap();
	for p in pixels {
		let v = gamma_encode(p).map(|x| x * 255.0 + 0.5);
		f.write(&[v.x as u8, v.y as u8, v.z as u8]).unwrap();
	}
}

/// Save linear radiance values as a gamma-corrected PNG
pub fn save_png(path: &str, img: &Image) -> Result<(), ::std::io::Error> {
	let mut data = Vec::with_capacity(img.width * img.height * 3);
	for p in img.pixels() {
		let v = gamma_encode(*p).map(|x| x * 255.0 + 0.5);
		data.push(v.x as u8);
		data.push(v.y as u8);
		data.push(v.z as u8);
	}
	image::save_buffer(path, &data, img.width as u32, img.height as u32, image::ColorType::RGB(8))
}
