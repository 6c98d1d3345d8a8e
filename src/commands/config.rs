
use std::path::Path;

use anyhow::Result;

use cets_imod::config::{Config, DEFAULT_FILENAME};


pub fn run() -> Result<()> {

	// write into the CWD
	let path = Path::new(".").join(DEFAULT_FILENAME);

	match Config::read(&path)? {

		None => {
			Config::write_default(&path)?;
			println!("Wrote new configuration file to: {}", path.to_string_lossy());
		}

		Some(_) => {
			println!("Using existing configuration file at: {}", path.to_string_lossy());
		}
	}

	Ok(())
}
