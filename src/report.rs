
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::metadata::{Affine, CtfMetadata, TiltImage, TiltSeries, Tomogram};


pub fn ctf_to_json(ctfs: &[CtfMetadata]) -> Value {
	ctfs.iter()
		.map(ctf_record_to_json)
		.collect::<Vec<_>>()
		.into()
}


fn ctf_record_to_json(ctf: &CtfMetadata) -> Value {
	let mut m = Map::<String,Value>::new();
	m.ins("defocus_u", ctf.defocus_u);
	m.ins("defocus_v", ctf.defocus_v);
	m.ins("defocus_angle", ctf.defocus_angle);
	m.ins("phase_shift", ctf.phase_shift);
	m.ins("defocus_handedness", ctf.defocus_handedness);
	Value::Object(m)
}


pub fn ctf_from_json(value: &Value) -> Result<Vec<CtfMetadata>> {

	let records = value.as_array()
		.context("CTF JSON was not an array")?;

	records.iter()
		.enumerate()
		.map(|(i, record)| {
			ctf_record_from_json(record)
				.context(format!("Failed to read CTF record {}", i))
		})
		.collect()
}


fn ctf_record_from_json(value: &Value) -> Result<CtfMetadata> {

	let obj = value.as_object()
		.context("CTF record was not an object")?;

	Ok(CtfMetadata {
		defocus_u: get_f64(obj, "defocus_u")?,
		defocus_v: get_f64(obj, "defocus_v")?,
		defocus_angle: get_f64(obj, "defocus_angle")?,
		phase_shift: get_f64(obj, "phase_shift")?,
		defocus_handedness: get_i64(obj, "defocus_handedness")? as i32
	})
}


pub fn tilt_series_to_json(ts: &TiltSeries) -> Value {

	let mut m = Map::<String,Value>::new();
	m.ins("tilt_series_id", ts.tilt_series_id.as_str());
	m.ins("path", ts.path.as_str());
	m.ins("images", ts.images.iter()
		.map(|img| {
			let mut m = Map::<String,Value>::new();
			m.ins("path", img.path.as_str());
			m.ins("section", img.section);
			m.ins("nominal_tilt_angle", img.nominal_tilt_angle);
			if let Some(dose) = img.accumulated_dose {
				m.ins("accumulated_dose", dose);
			}
			if let Some(order) = img.acq_order {
				m.ins("acq_order", order);
			}
			m.ins("width", img.width);
			m.ins("height", img.height);
			m.ins("pixel_size", img.pixel_size);
			if let Some(ctf) = &img.ctf {
				m.ins("ctf", ctf_record_to_json(ctf));
			}
			m.ins("ctf_corrected", img.ctf_corrected);
			if let Some(even_path) = &img.even_path {
				m.ins("even_path", even_path.as_str());
			}
			if let Some(odd_path) = &img.odd_path {
				m.ins("odd_path", odd_path.as_str());
			}
			m.ins("transforms", img.transforms.iter()
				.map(|t| {
					let mut m = Map::<String,Value>::new();
					m.ins("affine", t.affine.iter()
						.map(|row| row.to_vec())
						.collect::<Vec<_>>()
					);
					m.ins("name", t.name.as_str());
					m.ins("input", t.input.as_str());
					m.ins("output", t.output.as_str());
					Value::Object(m)
				})
				.collect::<Vec<_>>()
			);
			Value::Object(m)
		})
		.collect::<Vec<_>>()
	);

	Value::Object(m)
}


pub fn tilt_series_from_json(value: &Value) -> Result<TiltSeries> {

	let obj = value.as_object()
		.context("Tilt-series JSON was not an object")?;

	let images = obj.get("images")
		.context("Missing images")?
		.as_array()
		.context("images was not an array")?
		.iter()
		.enumerate()
		.map(|(i, img)| {
			tilt_image_from_json(img)
				.context(format!("Failed to read tilt image {}", i))
		})
		.collect::<Result<Vec<_>>>()?;

	Ok(TiltSeries {
		tilt_series_id: get_str(obj, "tilt_series_id")?,
		path: get_str(obj, "path")?,
		images
	})
}


fn tilt_image_from_json(value: &Value) -> Result<TiltImage> {

	let obj = value.as_object()
		.context("Tilt image was not an object")?;

	let ctf = match obj.get("ctf") {
		Some(ctf) => Some(ctf_record_from_json(ctf)?),
		None => None
	};

	let transforms = match obj.get("transforms") {
		Some(transforms) => transforms.as_array()
			.context("transforms was not an array")?
			.iter()
			.map(affine_from_json)
			.collect::<Result<Vec<_>>>()?,
		None => Vec::new()
	};

	Ok(TiltImage {
		path: get_str(obj, "path")?,
		section: get_i64(obj, "section")? as u32,
		nominal_tilt_angle: get_f64(obj, "nominal_tilt_angle")?,
		accumulated_dose: get_f64_opt(obj, "accumulated_dose")?,
		acq_order: get_i64_opt(obj, "acq_order")?
			.map(|order| order as u32),
		width: get_i64(obj, "width")? as u32,
		height: get_i64(obj, "height")? as u32,
		pixel_size: get_f64(obj, "pixel_size")?,
		ctf,
		ctf_corrected: obj.get("ctf_corrected")
			.and_then(|v| v.as_bool())
			.unwrap_or(false),
		even_path: get_str_opt(obj, "even_path")?,
		odd_path: get_str_opt(obj, "odd_path")?,
		transforms
	})
}


fn affine_from_json(value: &Value) -> Result<Affine> {

	let obj = value.as_object()
		.context("Transform was not an object")?;

	let rows = obj.get("affine")
		.context("Missing affine")?
		.as_array()
		.context("affine was not an array")?;
	if rows.len() != 3 {
		bail!("affine has {} rows, expected 3", rows.len());
	}

	let mut affine = [[0.0f64; 3]; 3];
	for (i, row) in rows.iter().enumerate() {
		let row = row.as_array()
			.context(format!("affine row {} was not an array", i))?;
		if row.len() != 3 {
			bail!("affine row {} has {} values, expected 3", i, row.len());
		}
		for (j, v) in row.iter().enumerate() {
			affine[i][j] = v.as_f64()
				.context(format!("affine value at ({},{}) was not a number", i, j))?;
		}
	}

	Ok(Affine {
		affine,
		name: get_str(obj, "name")?,
		input: get_str(obj, "input")?,
		output: get_str(obj, "output")?
	})
}


pub fn tomogram_to_json(tomo: &Tomogram) -> Value {

	let mut m = Map::<String,Value>::new();
	m.ins("path", tomo.path.as_str());
	m.ins("width", tomo.width);
	m.ins("height", tomo.height);
	m.ins("depth", tomo.depth);
	m.ins("voxel_size", tomo.voxel_size);
	m.ins("ctf_corrected", tomo.ctf_corrected);
	if let Some(even_path) = &tomo.even_path {
		m.ins("even_path", even_path.as_str());
	}
	if let Some(odd_path) = &tomo.odd_path {
		m.ins("odd_path", odd_path.as_str());
	}

	Value::Object(m)
}


pub fn read_json(path: impl AsRef<Path>) -> Result<Value> {

	let path = path.as_ref();

	let text = fs::read_to_string(path)
		.context(format!("Failed to read JSON file: {}", path.to_string_lossy()))?;

	serde_json::from_str(&text)
		.context(format!("Failed to parse JSON file: {}", path.to_string_lossy()))
}


pub fn write_json(path: impl AsRef<Path>, value: &Value) -> Result<()> {

	let path = path.as_ref();

	let text = serde_json::to_string_pretty(value)
		.context("Failed to serialize JSON")?;

	fs::write(path, text)
		.context(format!("Failed to write JSON file: {}", path.to_string_lossy()))?;

	Ok(())
}


/// appends flat key:value blocks, one per CTF record, to a report file
pub fn append_ctf_blocks(path: impl AsRef<Path>, ctfs: &[CtfMetadata]) -> Result<()> {

	let path = path.as_ref();

	let mut file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(path)
		.context(format!("Failed to open report file for appending: {}", path.to_string_lossy()))?;

	for ctf in ctfs {
		writeln!(file, "defocus_u: {}", ctf.defocus_u)?;
		writeln!(file, "defocus_v: {}", ctf.defocus_v)?;
		writeln!(file, "defocus_angle: {}", ctf.defocus_angle)?;
		writeln!(file, "phase_shift: {}", ctf.phase_shift)?;
		writeln!(file, "defocus_handedness: {}", ctf.defocus_handedness)?;
		writeln!(file)?;
	}

	Ok(())
}


fn get_f64(obj: &Map<String,Value>, key: &str) -> Result<f64> {
	obj.get(key)
		.context(format!("Missing {}", key))?
		.as_f64()
		.context(format!("{} was not a number", key))
}


fn get_f64_opt(obj: &Map<String,Value>, key: &str) -> Result<Option<f64>> {
	match obj.get(key) {
		Some(value) => {
			let value = value.as_f64()
				.context(format!("{} was not a number", key))?;
			Ok(Some(value))
		}
		None => Ok(None)
	}
}


fn get_i64(obj: &Map<String,Value>, key: &str) -> Result<i64> {
	obj.get(key)
		.context(format!("Missing {}", key))?
		.as_i64()
		.context(format!("{} was not an integer", key))
}


fn get_i64_opt(obj: &Map<String,Value>, key: &str) -> Result<Option<i64>> {
	match obj.get(key) {
		Some(value) => {
			let value = value.as_i64()
				.context(format!("{} was not an integer", key))?;
			Ok(Some(value))
		}
		None => Ok(None)
	}
}


fn get_str(obj: &Map<String,Value>, key: &str) -> Result<String> {
	let value = obj.get(key)
		.context(format!("Missing {}", key))?
		.as_str()
		.context(format!("{} was not a string", key))?;
	Ok(value.to_string())
}


fn get_str_opt(obj: &Map<String,Value>, key: &str) -> Result<Option<String>> {
	match obj.get(key) {
		Some(value) => {
			let value = value.as_str()
				.context(format!("{} was not a string", key))?;
			Ok(Some(value.to_string()))
		}
		None => Ok(None)
	}
}


trait MapEx {
	fn ins(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> &mut Value;
}

impl MapEx for Map<String,Value> {

	fn ins(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> &mut Value {
		let key = key.as_ref();
		self.insert(key.to_string(), value.into());
		self.get_mut(key)
			.expect("missing value we just added")
	}
}
