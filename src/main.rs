
mod commands;

use std::ops::Deref;
use std::path::PathBuf;
use std::process::ExitCode;

use display_error_chain::ErrorChainExt;
use gumdrop::Options;
use tracing::error;

use cets_imod::logging;
use cets_imod::logging::ResultExt;


#[derive(Debug, Options)]
struct Args {

	/// print help message
	#[options()]
	help: bool,

	/// log filter, eg cets_imod=debug
	#[options()]
	log: Option<String>,

	#[options(command)]
	cmd: Option<Command>
}


#[derive(Debug, Options)]
enum Command {
	/// write a template convert.toml into the current folder
	Config(ArgsConfig),
	/// convert IMOD metadata files into CETS JSON
	ToCets(ArgsToCets),
	/// convert CETS JSON back into IMOD metadata files
	ToImod(ArgsToImod)
}


#[derive(Debug, Options)]
pub struct ArgsConfig {
	// no args needed ... yet?
}


#[derive(Debug, Options)]
pub struct ArgsToCets {

	/// print help message
	#[options()]
	help: bool,

	/// tilt-series stack (.mrc, .mrcs, .st)
	#[options()]
	tilt_series: Option<PathBuf>,

	/// defocus file from ctfplotter (.defocus)
	#[options()]
	defocus: Option<PathBuf>,

	/// tilt-angle file (.tlt, .rawtlt)
	#[options()]
	tlt: Option<PathBuf>,

	/// alignment transform file (.xf)
	#[options()]
	xf: Option<PathBuf>,

	/// reconstructed tomogram (.mrc, .rec)
	#[options()]
	tomogram: Option<PathBuf>,

	/// even half stack or tomogram
	#[options()]
	even: Option<PathBuf>,

	/// odd half stack or tomogram
	#[options()]
	odd: Option<PathBuf>,

	/// binning factor applied to the alignment shifts
	#[options()]
	binning: Option<u32>,

	/// the tilt series had its CTF corrected
	#[options()]
	ctf_corrected: bool,

	/// config file, defaults to ./convert.toml
	#[options()]
	config: Option<PathBuf>,

	/// output JSON file, defaults to stdout
	#[options()]
	out: Option<PathBuf>,

	/// also append flat key:value CTF blocks to this file
	#[options()]
	blocks: Option<PathBuf>
}


#[derive(Debug, Options)]
pub struct ArgsToImod {

	/// print help message
	#[options()]
	help: bool,

	/// CETS JSON file, either a tilt series or a list of CTF records
	#[options(free)]
	input: Option<PathBuf>,

	/// tilt-angle file (.tlt) supplying angles for the defocus writer
	#[options()]
	tlt: Option<PathBuf>,

	/// output defocus file
	#[options()]
	out_defocus: Option<PathBuf>,

	/// output tilt-angle file
	#[options()]
	out_tlt: Option<PathBuf>,

	/// output transform file
	#[options()]
	out_xf: Option<PathBuf>,

	/// add the dose column to the output tilt-angle file
	#[options()]
	dose: bool
}


fn main() -> ExitCode {

	let args = Args::parse_args_default_or_exit();

	// init logging
	let log = args.log
		.as_deref()
		.unwrap_or("cets_imod=info");
	let Ok(_) = logging::init(log)
		.log_err()
		else { return ExitCode::FAILURE; };

	// handle the commands
	let result = match args.cmd {
		Some(Command::Config(..)) => commands::config::run(),
		Some(Command::ToCets(args)) => commands::to_cets::run(args),
		Some(Command::ToImod(args)) => commands::to_imod::run(args),
		None => {
			println!("No command given");
			return ExitCode::FAILURE;
		}
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{}", e.deref().chain());
			ExitCode::FAILURE
		}
	}
}
