
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde_json::Value;

use cets_imod::config::{Config, DEFAULT_FILENAME};
use cets_imod::defocus::DefocusFile;
use cets_imod::files;
use cets_imod::metadata::CtfMetadata;
use cets_imod::mrc::MrcHeader;
use cets_imod::report;
use cets_imod::tilt_series::{self, TiltSeriesSource};
use cets_imod::tomogram::{self, TomogramSource};

use crate::ArgsToCets;


pub fn run(args: ArgsToCets) -> Result<()> {

	// config file values fill in for flags the caller didn't give
	let config_path = args.config
		.clone()
		.unwrap_or_else(|| Path::new(".").join(DEFAULT_FILENAME));
	let config = Config::read(&config_path)?
		.map(|config| config.tilt_series)
		.unwrap_or_default();

	let binning = args.binning
		.unwrap_or(config.binning);
	let ctf_corrected = args.ctf_corrected || config.ctf_corrected;
	let even = or_config_path(&args.even, &config.even);
	let odd = or_config_path(&args.odd, &config.odd);

	let json = convert(&args, binning, ctf_corrected, even, odd)?;

	match &args.out {
		Some(out) => report::write_json(out, &json)?,
		None => println!("{}", serde_json::to_string_pretty(&json)?)
	}

	Ok(())
}


fn convert(
	args: &ArgsToCets,
	binning: u32,
	ctf_corrected: bool,
	even: Option<PathBuf>,
	odd: Option<PathBuf>
) -> Result<Value> {

	// a tomogram conversion stands alone
	if let Some(tomo_file) = &args.tomogram {
		let tomo = tomogram::imod_to_cets(&TomogramSource {
			tomo_file: tomo_file.clone(),
			ctf_corrected,
			even_file: even,
			odd_file: odd
		})?;
		return Ok(report::tomogram_to_json(&tomo));
	}

	// everything else starts from the tilt-series stack
	let Some(ts_file) = &args.tilt_series
		else { bail!("Nothing to convert: give --tomogram, or --tilt-series with --tlt or --defocus"); };

	let ctfs = match &args.defocus {
		Some(defocus_file) => Some(read_ctfs(defocus_file, ts_file)?),
		None => None
	};

	if let Some(ctfs) = &ctfs {
		if let Some(blocks) = &args.blocks {
			report::append_ctf_blocks(blocks, ctfs)?;
		}
	}

	match &args.tlt {

		// with tilt angles we can assemble the whole tilt series
		Some(tlt_file) => {
			let ts = tilt_series::imod_to_cets(
				&TiltSeriesSource {
					ts_file: ts_file.clone(),
					tlt_file: tlt_file.clone(),
					xf_file: args.xf.clone(),
					binning,
					ctf_corrected,
					even_file: even,
					odd_file: odd
				},
				ctfs.as_deref()
			)?;
			Ok(report::tilt_series_to_json(&ts))
		}

		// without them, the CTF records are the whole output
		None => {
			let Some(ctfs) = &ctfs
				else { bail!("Nothing to convert: give --tlt or --defocus along with --tilt-series"); };
			Ok(report::ctf_to_json(ctfs))
		}
	}
}


fn read_ctfs(defocus_file: &Path, ts_file: &Path) -> Result<Vec<CtfMetadata>> {
	let ts_file = files::validate_file(ts_file, "Tilt series", files::MRC_EXTS)?;
	let defocus_file = files::validate_file(defocus_file, "Defocus", files::DEFOCUS_EXTS)?;
	let num_images = MrcHeader::read(&ts_file)?
		.num_images();
	DefocusFile::read(&defocus_file)?
		.to_ctf_metadata(num_images)
}


fn or_config_path(arg: &Option<PathBuf>, config: &Option<String>) -> Option<PathBuf> {
	arg.clone()
		.or_else(|| config.as_ref().map(PathBuf::from))
}
