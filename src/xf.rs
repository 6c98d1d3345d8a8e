
// IMOD transform files (.xf):
// one linear transform per line, as a11 a12 a21 a22 dx dy
// https://bio3d.colorado.edu/imod/doc/man/xftoxg.html

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};


#[derive(Debug, Clone, PartialEq)]
pub struct XfSample {
	pub mat00: f64,
	pub mat01: f64,
	pub mat10: f64,
	pub mat11: f64,
	pub x: f64,
	pub y: f64
}

impl XfSample {

	pub fn identity() -> XfSample {
		XfSample {
			mat00: 1.0,
			mat01: 0.0,
			mat10: 0.0,
			mat11: 1.0,
			x: 0.0,
			y: 0.0
		}
	}

	/// row-major homogeneous form, shifts in the last column
	pub fn to_matrix(&self) -> [[f64; 3]; 3] {
		[
			[self.mat00, self.mat01, self.x],
			[self.mat10, self.mat11, self.y],
			[0.0, 0.0, 1.0]
		]
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct Xf {
	pub samples: Vec<XfSample>
}

impl Xf {

	pub fn read(path: impl AsRef<Path>) -> Result<Xf> {

		let path = path.as_ref();

		let text = fs::read_to_string(path)
			.context(format!("Failed to read xf file: {}", path.to_string_lossy()))?;

		Self::parse(&text)
			.context(format!("Failed to parse xf file: {}", path.to_string_lossy()))
	}

	pub fn parse(text: &str) -> Result<Xf> {

		let mut samples = Vec::<XfSample>::new();

		for (i, line) in text.lines().enumerate() {

			if line.trim().is_empty() {
				continue;
			}

			let mut values = Vec::<f64>::new();
			for token in line.split_whitespace() {
				let value = token.parse::<f64>()
					.context(format!("xf line {}: {} is not a number", i + 1, token))?;
				values.push(value);
			}

			if values.len() != 6 {
				bail!("xf line {} has {} values, expected 6", i + 1, values.len());
			}

			samples.push(XfSample {
				mat00: values[0],
				mat01: values[1],
				mat10: values[2],
				mat11: values[3],
				x: values[4],
				y: values[5]
			});
		}

		Ok(Xf {
			samples
		})
	}

	/// identity transforms for a stack with no alignment file
	pub fn identity(num_images: u32) -> Xf {
		Xf {
			samples: (0 .. num_images)
				.map(|_| XfSample::identity())
				.collect()
		}
	}

	pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();

		let mut out = String::new();
		for sample in &self.samples {
			out.push_str(&format!(
				"{:.7} {:.7} {:.7} {:.7} {:.3} {:.3}\n",
				sample.mat00,
				sample.mat01,
				sample.mat10,
				sample.mat11,
				sample.x,
				sample.y
			));
		}

		fs::write(path, out)
			.context(format!("Failed to write xf file: {}", path.to_string_lossy()))?;

		Ok(())
	}
}
