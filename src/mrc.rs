
// MRC file (from the Medical Research Council, in the UK)
// https://en.wikipedia.org/wiki/MRC_(file_format)

// format specification:
// https://www.ccpem.ac.uk/mrc_format/mrc2014.php

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use byteorder::{ReadBytesExt, WriteBytesExt, LE};


#[derive(Debug, Clone, PartialEq)]
pub struct MrcHeader {
	pub nx: u32,
	pub ny: u32,
	pub nz: u32,
	pub mode: u32,
	pub mx: u32,
	pub my: u32,
	pub mz: u32,
	pub cell_x: f32,
	pub cell_y: f32,
	pub cell_z: f32
}

impl MrcHeader {

	pub fn read(path: impl AsRef<Path>) -> Result<MrcHeader> {

		let path = path.as_ref();

		let file = File::open(path)
			.context(format!("Failed to open MRC file: {}", path.to_string_lossy()))?;
		let mut reader = BufReader::new(file);

		Self::read_from(&mut reader)
			.context(format!("Failed to read MRC header from: {}", path.to_string_lossy()))
	}

	fn read_from(reader: &mut impl Read) -> Result<MrcHeader> {

		// the dimensions (words 1-3) and the mode (word 4)
		let nx = reader.read_u32::<LE>()?;
		let ny = reader.read_u32::<LE>()?;
		let nz = reader.read_u32::<LE>()?;
		let mode = reader.read_u32::<LE>()?;

		// we're at word 5 now: skip to the grid size at word 8
		let mut skip = [0u8; 4*(8 - 5)];
		reader.read_exact(&mut skip)?;
		let mx = reader.read_u32::<LE>()?;
		let my = reader.read_u32::<LE>()?;
		let mz = reader.read_u32::<LE>()?;

		// cell dimensions in angstroms (words 11-13)
		let cell_x = reader.read_f32::<LE>()?;
		let cell_y = reader.read_f32::<LE>()?;
		let cell_z = reader.read_f32::<LE>()?;

		// we're at word 14 now: skip to the machine stamp at word 54
		let mut skip = [0u8; 4*(54 - 14)];
		reader.read_exact(&mut skip)?;
		let mut machst = [0u8; 4];
		reader.read_exact(&mut machst)?;

		// 0x44 0x44 (or 0x44 0x41) signals little-endian, 0x11 0x11 big-endian (note 11);
		// a zeroed stamp is common in the wild and means little-endian in practice
		if machst[0] == 0x11 {
			bail!("MRC file is big-endian, only little-endian files are supported");
		}

		Ok(MrcHeader {
			nx,
			ny,
			nz,
			mode,
			mx,
			my,
			mz,
			cell_x,
			cell_y,
			cell_z
		})
	}

	/// the number of images in a tilt-series stack:
	/// one for a single 2D image, otherwise the smallest dimension,
	/// since tilt counts run far below image widths in practice
	pub fn num_images(&self) -> u32 {
		if self.nz > 1 {
			self.nx.min(self.ny).min(self.nz)
		} else if self.ny > 1 {
			self.nx.min(self.ny)
		} else {
			1
		}
	}

	/// angstroms per pixel along x
	pub fn pixel_size(&self) -> f64 {
		if self.mx == 0 {
			return 0.0;
		}
		(self.cell_x as f64)/(self.mx as f64)
	}

	/// writes a zero-filled mode 0 stack with the given geometry,
	/// which is all the header reader needs for testing conversions
	pub fn write_stack(
		path: impl AsRef<Path>,
		nx: u32,
		ny: u32,
		nz: u32,
		pixel_size: f32
	) -> Result<()> {

		let path = path.as_ref();

		let mut file = File::create(path)
			.context(format!("Failed to open file for writing: {}", path.to_string_lossy()))?;
		let mut writer = BufWriter::new(&mut file);

		// the header is 256 (4-byte) words, or 1024 bytes total

		// write the dimensions (words 1-3)
		writer.write_u32::<LE>(nx)?;
		writer.write_u32::<LE>(ny)?;
		writer.write_u32::<LE>(nz)?;

		// use mode 0: 8 bit signed int
		writer.write_u32::<LE>(0)?;

		// we're at word 5 now: skip to word 8
		writer.write(&[0u8; 4*(8 - 5)])?;

		// the grid size matches the dimensions
		writer.write_u32::<LE>(nx)?;
		writer.write_u32::<LE>(ny)?;
		writer.write_u32::<LE>(nz)?;

		// cell dimensions, in angstroms (words 11-13)
		writer.write_f32::<LE>((nx as f32)*pixel_size)?;
		writer.write_f32::<LE>((ny as f32)*pixel_size)?;
		writer.write_f32::<LE>((nz as f32)*pixel_size)?;

		// we're at word 14 now: skip to word 24
		writer.write(&[0u8; 4*(24 - 14)])?;

		// we're not using any extra header space, so zero out nsymbt
		writer.write_u32::<LE>(0)?;

		// we're at word 25 now: skip to word 54
		writer.write(&[0u8; 4*(54 - 25)])?;

		// write the machine stamp: signal little-endianess (note 11)
		writer.write(&[0x44, 0x44, 0x00, 0x00])?;

		// we're at word 55 now: skip to the end of the header (word 257)
		writer.write(&[0u8; 4*(257 - 55)])?;

		// write the voxels: all zeros
		let plane = vec![0u8; (nx as usize)*(ny as usize)];
		for _ in 0 .. nz {
			writer.write(&plane)?;
		}

		// write buffers should be flushed before dropping
		writer.flush()?;

		Ok(())
	}
}
