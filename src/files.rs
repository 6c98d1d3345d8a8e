
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};


pub const MRC_EXTS: &[&str] = &["mrc", "mrcs", "st", "rec", "ali"];
pub const TLT_EXTS: &[&str] = &["tlt", "rawtlt"];
pub const XF_EXTS: &[&str] = &["xf"];
pub const DEFOCUS_EXTS: &[&str] = &["defocus", "txt"];


/// checks that the path points to a real file with one of the expected extensions
pub fn validate_file(path: impl AsRef<Path>, label: &str, extensions: &[&str]) -> Result<PathBuf> {

	let path = path.as_ref();

	if !path.is_file() {
		bail!("{} file not found: {}", label, path.to_string_lossy());
	}

	let ext = path.extension()
		.map(|e| e.to_string_lossy().to_lowercase());
	let ok = match &ext {
		Some(ext) => extensions.contains(&ext.as_str()),
		None => false
	};
	if !ok {
		bail!(
			"{} file {} has extension {}, expected one of: {}",
			label,
			path.to_string_lossy(),
			ext.as_deref().unwrap_or("(none)"),
			extensions.join(", ")
		);
	}

	Ok(path.to_path_buf())
}


/// even/odd half volumes only make sense as a pair
pub fn validate_even_odd(
	even: Option<&Path>,
	odd: Option<&Path>
) -> Result<Option<(PathBuf,PathBuf)>> {

	match (even, odd) {

		(Some(even), Some(odd)) => {
			let even = validate_file(even, "Even half", MRC_EXTS)?;
			let odd = validate_file(odd, "Odd half", MRC_EXTS)?;
			Ok(Some((even, odd)))
		}

		(None, None) => Ok(None),

		(Some(_), None) => bail!("An even half was given without an odd half: give both or neither"),
		(None, Some(_)) => bail!("An odd half was given without an even half: give both or neither")
	}
}
