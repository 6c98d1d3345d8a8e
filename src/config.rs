
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indoc::indoc;
use toml::Table;


pub const DEFAULT_FILENAME: &str = "convert.toml";


/// Config is the contents of convert.toml:
/// defaults for conversion options that rarely change between runs
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	pub tilt_series: ConfigTiltSeries
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTiltSeries {
	pub binning: u32,
	pub ctf_corrected: bool,
	pub even: Option<String>,
	pub odd: Option<String>
}

impl Default for ConfigTiltSeries {

	fn default() -> Self {
		Self {
			binning: 1,
			ctf_corrected: false,
			even: None,
			odd: None
		}
	}
}

impl Config {

	/// reads the config file, if there is one
	pub fn read(path: impl AsRef<Path>) -> Result<Option<Config>> {

		let path = path.as_ref();

		if !path.is_file() {
			return Ok(None);
		}

		let toml = fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file at: {}", path.to_string_lossy()))?
			.parse::<Table>()
			.with_context(|| format!("Failed to parse config file at: {}", path.to_string_lossy()))?;

		// read the tilt_series section, if any
		let tilt_series = match toml.get("tilt_series") {

			None => ConfigTiltSeries::default(),

			Some(toml_tilt_series) => {

				let toml_tilt_series = toml_tilt_series.as_table()
					.context("tilt_series key is not a table")?;

				let binning = match toml_tilt_series.get("binning") {
					Some(binning) => {
						let binning = binning.as_integer()
							.context("tilt_series.binning was not an integer")?;
						u32::try_from(binning)
							.context(format!("tilt_series.binning is out of range: {}", binning))?
					}
					None => 1
				};

				let ctf_corrected = match toml_tilt_series.get("ctf_corrected") {
					Some(ctf_corrected) => ctf_corrected.as_bool()
						.context("tilt_series.ctf_corrected was not a boolean")?,
					None => false
				};

				let even = match toml_tilt_series.get("even") {
					Some(even) => Some(
						even.as_str()
							.context("tilt_series.even was not a string")?
							.to_string()
					),
					None => None
				};

				let odd = match toml_tilt_series.get("odd") {
					Some(odd) => Some(
						odd.as_str()
							.context("tilt_series.odd was not a string")?
							.to_string()
					),
					None => None
				};

				ConfigTiltSeries {
					binning,
					ctf_corrected,
					even,
					odd
				}
			}
		};

		Ok(Some(Config {
			tilt_series
		}))
	}

	/// writes a commented template for new projects
	pub fn write_default(path: impl AsRef<Path>) -> Result<()> {

		let path = path.as_ref();

		let template = indoc! {r#"
			# conversion defaults, overridden by command-line flags

			[tilt_series]

			# binning factor applied to the alignment shifts
			#binning = 1

			# whether the tilt series had its CTF corrected before reconstruction
			#ctf_corrected = false

			# even/odd half stacks, give both or neither
			#even = "series_even.mrc"
			#odd = "series_odd.mrc"
		"#};

		fs::write(path, template)
			.context(format!("Failed to write config file: {}", path.to_string_lossy()))?;

		Ok(())
	}
}


#[cfg(test)]
mod test {

	use galvanic_assert::{assert_that, matchers::*};

	use super::*;


	#[test]
	fn missing_file_is_none() {
		let config = Config::read("/nonexistent/convert.toml").unwrap();
		assert_that!(&config, eq(None));
	}

	#[test]
	fn full_section() {

		let dir = std::env::temp_dir().join("cets-imod-config-test");
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("full.toml");
		fs::write(&path, indoc! {r#"
			[tilt_series]
			binning = 2
			ctf_corrected = true
			even = "even.mrc"
			odd = "odd.mrc"
		"#}).unwrap();

		let config = Config::read(&path).unwrap().unwrap();
		assert_that!(&config.tilt_series, eq(ConfigTiltSeries {
			binning: 2,
			ctf_corrected: true,
			even: Some("even.mrc".to_string()),
			odd: Some("odd.mrc".to_string())
		}));

		fs::remove_file(&path).unwrap();
	}

	#[test]
	fn empty_file_gets_defaults() {

		let dir = std::env::temp_dir().join("cets-imod-config-test");
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("empty.toml");
		fs::write(&path, "").unwrap();

		let config = Config::read(&path).unwrap().unwrap();
		assert_that!(&config.tilt_series, eq(ConfigTiltSeries::default()));

		fs::remove_file(&path).unwrap();
	}

	#[test]
	fn bad_type_fails() {

		let dir = std::env::temp_dir().join("cets-imod-config-test");
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("bad.toml");
		fs::write(&path, indoc! {r#"
			[tilt_series]
			binning = "two"
		"#}).unwrap();

		let result = Config::read(&path);
		assert_that!(&result.is_err(), eq(true));

		fs::remove_file(&path).unwrap();
	}

	#[test]
	fn template_parses_back() {

		let dir = std::env::temp_dir().join("cets-imod-config-test");
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("template.toml");

		Config::write_default(&path).unwrap();

		let config = Config::read(&path).unwrap().unwrap();
		assert_that!(&config.tilt_series, eq(ConfigTiltSeries::default()));

		fs::remove_file(&path).unwrap();
	}
}
