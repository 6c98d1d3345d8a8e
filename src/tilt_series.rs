
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::files;
use crate::metadata::{Affine, CtfMetadata, TiltImage, TiltSeries};
use crate::mrc::MrcHeader;
use crate::tlt::TiltAngles;
use crate::xf::Xf;


pub const TRANSFORM_NAME: &str = "IMOD roto-translation from a .xf file. Shifts in angstroms.";
pub const TRANSFORM_INPUT: &str = "Aligned and projected movie frames (unaligned tilt-image)";
pub const TRANSFORM_OUTPUT: &str = "Aligned projection (tilt-image)";


#[derive(Debug, Clone)]
pub struct TiltSeriesSource {
	pub ts_file: PathBuf,
	pub tlt_file: PathBuf,
	pub xf_file: Option<PathBuf>,
	pub binning: u32,
	pub ctf_corrected: bool,
	pub even_file: Option<PathBuf>,
	pub odd_file: Option<PathBuf>
}


/// builds a CETS tilt-series from the IMOD files
pub fn imod_to_cets(
	src: &TiltSeriesSource,
	ctfs: Option<&[CtfMetadata]>
) -> Result<TiltSeries> {

	let ts_file = files::validate_file(&src.ts_file, "Tilt series", files::MRC_EXTS)?;
	let tlt_file = files::validate_file(&src.tlt_file, "Tilt angles", files::TLT_EXTS)?;
	let even_odd = files::validate_even_odd(
		src.even_file.as_deref(),
		src.odd_file.as_deref()
	)?;

	let header = MrcHeader::read(&ts_file)?;
	let num_images = header.num_images();
	let pixel_size = header.pixel_size();

	let tilts = TiltAngles::read(&tlt_file)?;
	if tilts.len() != num_images as usize {
		bail!(
			"Tilt-angle file {} has {} angles, but the stack has {} images",
			tlt_file.to_string_lossy(),
			tilts.len(),
			num_images
		);
	}

	if let Some(ctfs) = ctfs {
		if ctfs.len() != num_images as usize {
			bail!(
				"Got {} CTF records, but the stack has {} images",
				ctfs.len(),
				num_images
			);
		}
	}

	let xf = match &src.xf_file {
		Some(xf_file) => {
			let xf_file = files::validate_file(xf_file, "Alignment transforms", files::XF_EXTS)?;
			let xf = Xf::read(&xf_file)?;
			if xf.samples.len() != num_images as usize {
				bail!(
					"xf file {} has {} transforms, but the stack has {} images",
					xf_file.to_string_lossy(),
					xf.samples.len(),
					num_images
				);
			}
			xf
		}
		None => Xf::identity(num_images)
	};

	let ts_path = ts_file.to_string_lossy().to_string();
	let ts_id = ts_file.file_stem()
		.context("Tilt-series path has no file name")?
		.to_string_lossy()
		.to_string();

	let mut images = Vec::<TiltImage>::with_capacity(num_images as usize);
	for i in 0 .. num_images as usize {

		let mut sample = xf.samples[i].clone();

		// the shifts come out of IMOD in binned pixels
		if src.binning > 1 {
			sample.x *= src.binning as f64;
			sample.y *= src.binning as f64;
		}

		// and go into CETS in angstroms
		let mut affine = sample.to_matrix();
		affine[0][2] *= pixel_size;
		affine[1][2] *= pixel_size;

		images.push(TiltImage {
			path: ts_path.clone(),
			section: (i as u32) + 1,
			nominal_tilt_angle: tilts.angles[i],
			accumulated_dose: tilts.doses.as_ref().map(|doses| doses[i]),
			acq_order: tilts.acq_orders.as_ref().map(|orders| orders[i]),
			width: header.nx,
			height: header.ny,
			pixel_size,
			ctf: ctfs.map(|ctfs| ctfs[i].clone()),
			ctf_corrected: src.ctf_corrected,
			even_path: even_odd.as_ref()
				.map(|(even, _)| even.to_string_lossy().to_string()),
			odd_path: even_odd.as_ref()
				.map(|(_, odd)| odd.to_string_lossy().to_string()),
			transforms: vec![
				Affine {
					affine,
					name: TRANSFORM_NAME.to_string(),
					input: TRANSFORM_INPUT.to_string(),
					output: TRANSFORM_OUTPUT.to_string()
				}
			]
		});
	}

	info!("Converted tilt series {} with {} images", ts_id, num_images);

	Ok(TiltSeries {
		tilt_series_id: ts_id,
		path: ts_path,
		images
	})
}


/// writes the IMOD files back out of a CETS tilt-series
pub fn cets_to_imod(
	ts: &TiltSeries,
	tlt_file: Option<&Path>,
	add_dose: bool,
	xf_file: Option<&Path>
) -> Result<()> {

	if ts.images.is_empty() {
		bail!("Tilt series {} has no images", ts.tilt_series_id);
	}

	if let Some(tlt_file) = tlt_file {

		let angles = ts.images.iter()
			.map(|img| img.nominal_tilt_angle)
			.collect::<Vec<_>>();

		// only write the dose column when every image has one
		let doses = match add_dose {
			true => ts.images.iter()
				.map(|img| img.accumulated_dose)
				.collect::<Option<Vec<_>>>(),
			false => None
		};

		TiltAngles::write(tlt_file, &angles, doses.as_deref())?;
		info!("Wrote tilt angles: {}", tlt_file.to_string_lossy());
	}

	if let Some(xf_file) = xf_file {

		let samples = ts.images.iter()
			.map(|img| {
				let transform = img.transforms.first()
					.context(format!("Tilt image {} has no transform", img.section))?;
				let m = &transform.affine;

				// CETS stores shifts in angstroms, xf files want pixels
				let (x, y) = match img.pixel_size > 0.0 {
					true => (m[0][2]/img.pixel_size, m[1][2]/img.pixel_size),
					false => (m[0][2], m[1][2])
				};

				Ok(crate::xf::XfSample {
					mat00: m[0][0],
					mat01: m[0][1],
					mat10: m[1][0],
					mat11: m[1][1],
					x,
					y
				})
			})
			.collect::<Result<Vec<_>>>()?;

		Xf { samples }.write(xf_file)?;
		info!("Wrote alignment transforms: {}", xf_file.to_string_lossy());
	}

	Ok(())
}
