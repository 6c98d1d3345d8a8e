
use anyhow::{bail, Context, Result};
use serde_json::Value;

use cets_imod::defocus;
use cets_imod::report;
use cets_imod::tilt_series;
use cets_imod::tlt::TiltAngles;

use crate::ArgsToImod;


pub fn run(args: ArgsToImod) -> Result<()> {

	let input = args.input
		.as_ref()
		.context("Give a CETS JSON file to convert")?;

	if args.out_defocus.is_none() && args.out_tlt.is_none() && args.out_xf.is_none() {
		bail!("Nothing to write: give --out-defocus, --out-tlt, or --out-xf");
	}

	let json = report::read_json(input)?;

	match &json {

		// an array is a list of CTF records, which only feeds the defocus writer
		Value::Array(_) => {

			let Some(out_defocus) = &args.out_defocus
				else { bail!("A CTF record list can only be written with --out-defocus"); };

			let ctfs = report::ctf_from_json(&json)?;
			let tilts = read_tilt_angles(&args)?;

			defocus::write(out_defocus, &ctfs, &tilts.angles)?;
			println!("Wrote defocus file: {}", out_defocus.to_string_lossy());
		}

		// an object is a whole tilt series
		Value::Object(_) => {

			let ts = report::tilt_series_from_json(&json)?;

			if let Some(out_defocus) = &args.out_defocus {

				let ctfs = ts.images.iter()
					.map(|img| {
						img.ctf
							.clone()
							.context(format!("Tilt image {} has no CTF metadata", img.section))
					})
					.collect::<Result<Vec<_>>>()?;
				let angles = ts.images.iter()
					.map(|img| img.nominal_tilt_angle)
					.collect::<Vec<_>>();

				defocus::write(out_defocus, &ctfs, &angles)?;
				println!("Wrote defocus file: {}", out_defocus.to_string_lossy());
			}

			tilt_series::cets_to_imod(
				&ts,
				args.out_tlt.as_deref(),
				args.dose,
				args.out_xf.as_deref()
			)?;
		}

		_ => bail!("CETS JSON should be an object (tilt series) or an array (CTF records)")
	}

	Ok(())
}


fn read_tilt_angles(args: &ArgsToImod) -> Result<TiltAngles> {
	let tlt_file = args.tlt
		.as_ref()
		.context("Writing a defocus file from CTF records needs tilt angles: give --tlt")?;
	TiltAngles::read(tlt_file)
}
