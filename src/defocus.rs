
// IMOD defocus files, as written by ctfplotter
// https://bio3d.colorado.edu/imod/doc/man/ctfplotter.html

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::metadata::{CtfMetadata, DEFOCUS_HANDEDNESS};


/// the format flag from the first line of the defocus file,
/// a sum of: 1 for astigmatism, 4 for phase shift, 32 for the cut-on frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
	/// 0: defocus only
	Plain,
	/// 1: defocus with astigmatism
	Astigmatism,
	/// 4: defocus with phase shift
	PhaseShift,
	/// 5: astigmatism and phase shift
	AstigmatismPhaseShift,
	/// 37: astigmatism, phase shift, and cut-on frequency
	AstigmatismPhaseShiftCutOnFreq
}

impl Flag {

	pub fn from_code(code: i64) -> Result<Flag> {
		match code {
			0 => Ok(Flag::Plain),
			1 => Ok(Flag::Astigmatism),
			4 => Ok(Flag::PhaseShift),
			5 => Ok(Flag::AstigmatismPhaseShift),
			37 => Ok(Flag::AstigmatismPhaseShiftCutOnFreq),
			_ => bail!("Unsupported defocus file flag: {}, expected one of 0, 1, 4, 5, 37", code)
		}
	}

	pub fn code(&self) -> i64 {
		match self {
			Flag::Plain => 0,
			Flag::Astigmatism => 1,
			Flag::PhaseShift => 4,
			Flag::AstigmatismPhaseShift => 5,
			Flag::AstigmatismPhaseShiftCutOnFreq => 37
		}
	}

	pub fn num_columns(&self) -> usize {
		match self {
			Flag::Plain => 5,
			Flag::Astigmatism => 7,
			Flag::PhaseShift => 6,
			Flag::AstigmatismPhaseShift => 8,
			Flag::AstigmatismPhaseShiftCutOnFreq => 9
		}
	}
}


/// figures out the format flag without parsing the whole file
///
/// old ctfplotter versions wrote no header line at all,
/// so a file whose second line has the plain five columns is flag 0
pub fn detect_flag(lines: &[&str]) -> Result<Flag> {

	if lines.is_empty() {
		bail!("Defocus file is empty");
	}

	if lines.len() == 1 {
		return Ok(Flag::Plain);
	}

	if lines[1].split_whitespace().count() == 5 {
		return Ok(Flag::Plain);
	}

	let first_token = lines[0].split_whitespace()
		.next()
		.context("First line of defocus file is blank")?;
	let code = first_token.parse::<i64>()
		.context(format!("First token of defocus file is not an integer flag: {}", first_token))?;
	Flag::from_code(code)
}


/// parses the file into rows of numbers, dropping the header if there is one
///
/// when the first line is data (flag 0 with no header), its last token is the
/// estimation mode from ctfplotter, not a measurement, so it gets dropped
pub fn read_table(lines: &[&str]) -> Result<Vec<Vec<f64>>> {

	if lines.is_empty() {
		bail!("Defocus file is empty");
	}

	let first_is_data = lines.len() == 1
		|| lines[1].split_whitespace().count() == 5;

	let mut table = Vec::<Vec<f64>>::new();

	for (i, line) in lines.iter().enumerate() {

		if i == 0 && !first_is_data {
			continue;
		}

		let mut row = Vec::<f64>::new();
		for token in line.split_whitespace() {
			let value = token.parse::<f64>()
				.context(format!("Malformed defocus row {}: token {} is not a number", i + 1, token))?;
			row.push(value);
		}

		if i == 0 {
			row.pop();
		}

		table.push(row);
	}

	Ok(table)
}


/// raw estimates gathered per image index, in row order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSeries {
	values: HashMap<u32,Vec<f64>>
}

impl ValueSeries {

	pub fn push(&mut self, index: u32, value: f64) {
		self.values.entry(index)
			.or_default()
			.push(value);
	}

	pub fn get(&self, index: u32) -> &[f64] {
		self.values.get(&index)
			.map(|v| v.as_slice())
			.unwrap_or(&[])
	}
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCtf {
	pub defocus_u: ValueSeries,
	pub defocus_v: ValueSeries,
	pub defocus_angle: ValueSeries,
	pub phase_shift: ValueSeries
}


/// expands the table rows into per-image series according to the flag's layout
///
/// each row covers an inclusive range of image indices, given by its first two
/// columns, and overlapping ranges just accumulate more estimates
pub fn refactor(flag: Flag, table: &[Vec<f64>]) -> Result<RawCtf> {

	let mut raw = RawCtf::default();

	for (i, row) in table.iter().enumerate() {

		if row.len() != flag.num_columns() {
			bail!(
				"Defocus row {} has {} columns, expected {} for flag {}",
				i + 1,
				row.len(),
				flag.num_columns(),
				flag.code()
			);
		}

		let start = row[0] as u32;
		let end = row[1] as u32;

		for index in start ..= end {
			match flag {

				Flag::Plain => {
					// nm to angstroms
					raw.defocus_u.push(index, row[4]*10.0);
				}

				Flag::Astigmatism => {
					raw.defocus_u.push(index, row[4]*10.0);
					raw.defocus_v.push(index, row[5]*10.0);
					raw.defocus_angle.push(index, row[6]);
				}

				Flag::PhaseShift => {
					raw.defocus_u.push(index, row[4]*10.0);
					raw.phase_shift.push(index, row[5]);
				}

				// flag 37 adds a cut-on frequency in the last column,
				// which has no CETS counterpart, so only the shared columns are kept
				Flag::AstigmatismPhaseShift | Flag::AstigmatismPhaseShiftCutOnFreq => {
					raw.defocus_u.push(index, row[4]*10.0);
					raw.defocus_v.push(index, row[5]*10.0);
					raw.defocus_angle.push(index, row[6]);
					raw.phase_shift.push(index, row[7]);
				}
			}
		}
	}

	Ok(raw)
}


/// picks the middle of an ordered sequence of estimates
///
/// for an even length, averages the two values around the midpoint,
/// so this is order-sensitive and not a statistical median
pub fn middle_value(values: &[f64]) -> f64 {
	let m = values.len()/2;
	if values.len() % 2 == 0 {
		(values[m] + values[m - 1])/2.0
	} else {
		values[m]
	}
}


/// reduces the raw series at one image index to a single standardized record
pub fn reduce_image(raw: &RawCtf, index: u32) -> Result<CtfMetadata> {

	let u_values = raw.defocus_u.get(index);
	let v_values = raw.defocus_v.get(index);
	let angle_values = raw.defocus_angle.get(index);

	let (u, v, angle) =
		if !u_values.is_empty() && !v_values.is_empty() {
			if u_values.len() != v_values.len() || v_values.len() != angle_values.len() {
				bail!(
					"Image {} has mismatched estimate counts: {} defocus_u, {} defocus_v, {} angle",
					index,
					u_values.len(),
					v_values.len(),
					angle_values.len()
				);
			}
			(middle_value(u_values), middle_value(v_values), middle_value(angle_values))
		} else {
			// only one axis was estimated, so treat the defocus as isotropic
			let values = if !u_values.is_empty() {
				u_values
			} else {
				v_values
			};
			if values.is_empty() {
				bail!("Image {} is covered by no row of the defocus file", index);
			}
			let value = middle_value(values);
			(value, value, 0.0)
		};

	let phase_values = raw.phase_shift.get(index);
	let phase_shift =
		if phase_values.is_empty() {
			0.0
		} else {
			if (u_values.len() + phase_values.len() + angle_values.len()) % 3 != 0 {
				bail!(
					"Image {} has mismatched estimate counts: {} defocus_u, {} phase_shift, {} angle",
					index,
					u_values.len(),
					phase_values.len(),
					angle_values.len()
				);
			}
			middle_value(phase_values)
		};

	let (u, v, angle) = standardize(u, v, angle);

	Ok(CtfMetadata {
		defocus_u: u,
		defocus_v: v,
		defocus_angle: angle,
		phase_shift,
		defocus_handedness: DEFOCUS_HANDEDNESS
	})
}


/// puts a (u, v, angle) triple into the EMX convention: u >= v, angle in [0,180)
///
/// the wrap is a single pass, so inputs more than one period out of range
/// stay out of range
pub fn standardize(mut u: f64, mut v: f64, mut angle: f64) -> (f64, f64, f64) {

	if v > u {
		std::mem::swap(&mut u, &mut v);
		angle += 90.0;
	}

	if angle >= 180.0 {
		angle -= 180.0;
	} else if angle < 0.0 {
		angle += 180.0;
	}

	(u, v, angle)
}


#[derive(Debug, Clone, PartialEq)]
pub struct DefocusFile {
	flag: Flag,
	raw: RawCtf
}

impl DefocusFile {

	pub fn read(path: impl AsRef<Path>) -> Result<DefocusFile> {

		let path = path.as_ref();

		let text = fs::read_to_string(path)
			.context(format!("Failed to read defocus file: {}", path.to_string_lossy()))?;

		Self::parse(&text)
			.context(format!("Failed to parse defocus file: {}", path.to_string_lossy()))
	}

	pub fn parse(text: &str) -> Result<DefocusFile> {

		let lines = text.lines()
			.filter(|line| !line.trim().is_empty())
			.collect::<Vec<_>>();

		let flag = detect_flag(&lines)?;
		let table = read_table(&lines)?;
		let raw = refactor(flag, &table)?;

		Ok(DefocusFile {
			flag,
			raw
		})
	}

	pub fn flag(&self) -> Flag {
		self.flag
	}

	pub fn raw(&self) -> &RawCtf {
		&self.raw
	}

	/// one standardized record per image in the stack, in section order
	pub fn to_ctf_metadata(&self, num_images: u32) -> Result<Vec<CtfMetadata>> {
		(1 ..= num_images)
			.map(|index| {
				reduce_image(&self.raw, index)
			})
			.collect()
	}
}


/// writes a defocus file in the astigmatism format (flag 1),
/// one row per image, using the tilt angles for the row's angle range
pub fn write(
	path: impl AsRef<Path>,
	ctfs: &[CtfMetadata],
	tilt_angles: &[f64]
) -> Result<()> {

	let path = path.as_ref();

	if ctfs.len() != tilt_angles.len() {
		bail!(
			"Got {} CTF records but {} tilt angles, the counts should match",
			ctfs.len(),
			tilt_angles.len()
		);
	}

	let mut out = String::new();
	out.push_str("1 0 0.0 0.0 0.0 3\n");

	for (i, (ctf, tilt)) in ctfs.iter().zip(tilt_angles).enumerate() {
		let index = i + 1;
		out.push_str(&format!(
			"{} {} {:.2} {:.2} {:.2} {:.2} {:.2}\n",
			index,
			index,
			tilt,
			tilt,
			// back to nm for IMOD
			ctf.defocus_u/10.0,
			ctf.defocus_v/10.0,
			ctf.defocus_angle
		));
	}

	fs::write(path, out)
		.context(format!("Failed to write defocus file: {}", path.to_string_lossy()))?;

	Ok(())
}
