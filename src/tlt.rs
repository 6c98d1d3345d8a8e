
// IMOD tilt-angle files (.tlt, .rawtlt):
// one angle per line, optionally followed by the accumulated dose
// and the acquisition order
// https://bio3d.colorado.edu/imod/doc/man/tilt.html

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};


#[derive(Debug, Clone, PartialEq)]
pub struct TiltAngles {
	pub angles: Vec<f64>,
	pub doses: Option<Vec<f64>>,
	pub acq_orders: Option<Vec<u32>>
}

impl TiltAngles {

	pub fn read(path: impl AsRef<Path>) -> Result<TiltAngles> {

		let path = path.as_ref();

		let text = fs::read_to_string(path)
			.context(format!("Failed to read tilt-angle file: {}", path.to_string_lossy()))?;

		Self::parse(&text)
			.context(format!("Failed to parse tilt-angle file: {}", path.to_string_lossy()))
	}

	pub fn parse(text: &str) -> Result<TiltAngles> {

		let mut angles = Vec::<f64>::new();
		let mut doses = Vec::<f64>::new();
		let mut acq_orders = Vec::<u32>::new();
		let mut num_columns = None;

		for (i, line) in text.lines().enumerate() {

			if line.trim().is_empty() {
				continue;
			}

			let tokens = line.split_whitespace()
				.collect::<Vec<_>>();

			// every line should look like the first one
			match num_columns {
				None => {
					if tokens.len() > 3 {
						bail!("Tilt-angle line {} has {} columns, expected 1 to 3", i + 1, tokens.len());
					}
					num_columns = Some(tokens.len());
				}
				Some(n) => {
					if tokens.len() != n {
						bail!("Tilt-angle line {} has {} columns, but earlier lines have {}", i + 1, tokens.len(), n);
					}
				}
			}

			let angle = tokens[0].parse::<f64>()
				.context(format!("Tilt-angle line {}: {} is not a number", i + 1, tokens[0]))?;
			angles.push(angle);

			if tokens.len() >= 2 {
				let dose = tokens[1].parse::<f64>()
					.context(format!("Tilt-angle line {}: dose {} is not a number", i + 1, tokens[1]))?;
				doses.push(dose);
			}

			if tokens.len() >= 3 {
				let order = tokens[2].parse::<u32>()
					.context(format!("Tilt-angle line {}: acquisition order {} is not an integer", i + 1, tokens[2]))?;
				acq_orders.push(order);
			}
		}

		if angles.is_empty() {
			bail!("Tilt-angle file has no angles");
		}

		let doses = match doses.is_empty() {
			true => None,
			false => Some(doses)
		};

		// a dose column without an explicit order column still fixes the
		// acquisition order: lower dose means the image was taken earlier
		let acq_orders = match (acq_orders.is_empty(), &doses) {
			(false, _) => Some(acq_orders),
			(true, Some(doses)) => Some(rank_by_dose(doses)),
			(true, None) => None
		};

		Ok(TiltAngles {
			angles,
			doses,
			acq_orders
		})
	}

	pub fn len(&self) -> usize {
		self.angles.len()
	}

	pub fn write(
		path: impl AsRef<Path>,
		angles: &[f64],
		doses: Option<&[f64]>
	) -> Result<()> {

		let path = path.as_ref();

		if let Some(doses) = doses {
			if doses.len() != angles.len() {
				bail!("Got {} doses but {} tilt angles, the counts should match", doses.len(), angles.len());
			}
		}

		let mut out = String::new();
		for (i, angle) in angles.iter().enumerate() {
			match doses {
				Some(doses) => out.push_str(&format!("{:.2} {:.2}\n", angle, doses[i])),
				None => out.push_str(&format!("{:.2}\n", angle))
			}
		}

		fs::write(path, out)
			.context(format!("Failed to write tilt-angle file: {}", path.to_string_lossy()))?;

		Ok(())
	}
}


/// 1-based acquisition ranks, ascending by dose
fn rank_by_dose(doses: &[f64]) -> Vec<u32> {

	let mut indices = (0 .. doses.len())
		.collect::<Vec<_>>();
	indices.sort_by(|&a, &b| doses[a].total_cmp(&doses[b]));

	let mut orders = vec![0u32; doses.len()];
	for (rank, &i) in indices.iter().enumerate() {
		orders[i] = (rank as u32) + 1;
	}

	orders
}
