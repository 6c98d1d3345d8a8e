
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::files;
use crate::metadata::Tomogram;
use crate::mrc::MrcHeader;


#[derive(Debug, Clone)]
pub struct TomogramSource {
	pub tomo_file: PathBuf,
	pub ctf_corrected: bool,
	pub even_file: Option<PathBuf>,
	pub odd_file: Option<PathBuf>
}


/// builds a CETS tomogram record from a reconstructed IMOD volume
pub fn imod_to_cets(src: &TomogramSource) -> Result<Tomogram> {

	let tomo_file = files::validate_file(&src.tomo_file, "Tomogram", files::MRC_EXTS)?;
	let even_odd = files::validate_even_odd(
		src.even_file.as_deref(),
		src.odd_file.as_deref()
	)?;

	let header = MrcHeader::read(&tomo_file)?;

	info!(
		"Converted tomogram {} ({}x{}x{})",
		tomo_file.to_string_lossy(),
		header.nx,
		header.ny,
		header.nz
	);

	Ok(Tomogram {
		path: tomo_file.to_string_lossy().to_string(),
		width: header.nx,
		height: header.ny,
		depth: header.nz,
		voxel_size: header.pixel_size(),
		ctf_corrected: src.ctf_corrected,
		even_path: even_odd.as_ref()
			.map(|(even, _)| even.to_string_lossy().to_string()),
		odd_path: even_odd.as_ref()
			.map(|(_, odd)| odd.to_string_lossy().to_string())
	})
}
