
mod util;


use indoc::indoc;

use crate::util::cmd::{cmd, AssertExt};
use crate::util::work_dir::WorkDir;


#[test]
fn defocus_to_ctf_records() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.defocus")
		.write("1 3 0.0 0.0 12.5 3\n");
	let out = dir.file("ctf.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--defocus").arg("series.defocus")
		.arg("--out").arg(out.path())
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	let json = out.read_json();
	let records = json.as_array()
		.expect("CTF JSON should be an array");
	assert_eq!(records.len(), 3);

	for record in records {
		assert_eq!(record["defocus_u"], 125.0);
		assert_eq!(record["defocus_v"], 125.0);
		assert_eq!(record["defocus_angle"], 0.0);
		assert_eq!(record["phase_shift"], 0.0);
		assert_eq!(record["defocus_handedness"], -1);
	}
}


#[test]
fn tilt_series_to_cets() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.tlt")
		.write(indoc! {"
			-3.00 9.00
			0.00 3.00
			3.00 6.00
		"});
	dir.file("series.xf")
		.write(indoc! {"
			1.0 0.0 0.0 1.0 1.5 -2.0
			1.0 0.0 0.0 1.0 0.0 0.0
			1.0 0.0 0.0 1.0 -1.0 1.0
		"});
	dir.file("series.defocus")
		.write(indoc! {"
			1 0 0.0 0.0 0.0 3
			1 1 -3.00 -3.00 250.00 240.00 30.00
			2 2 0.00 0.00 260.00 250.00 40.00
			3 3 3.00 3.00 270.00 260.00 50.00
		"});
	let out = dir.file("ts.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--tlt").arg("series.tlt")
		.arg("--xf").arg("series.xf")
		.arg("--defocus").arg("series.defocus")
		.arg("--binning").arg("2")
		.arg("--out").arg(out.path())
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	let json = out.read_json();
	assert_eq!(json["tilt_series_id"], "series");

	let images = json["images"].as_array()
		.expect("images should be an array");
	assert_eq!(images.len(), 3);

	let img = &images[0];
	assert_eq!(img["section"], 1);
	assert_eq!(img["nominal_tilt_angle"], -3.0);
	assert_eq!(img["accumulated_dose"], 9.0);
	assert_eq!(img["acq_order"], 3);
	assert_eq!(img["width"], 8);
	assert_eq!(img["height"], 8);
	assert_eq!(img["pixel_size"], 2.0);
	assert_eq!(img["ctf"]["defocus_u"], 2500.0);
	assert_eq!(img["ctf"]["defocus_v"], 2400.0);
	assert_eq!(img["ctf"]["defocus_angle"], 30.0);

	// shift 1.5 px, binning 2, pixel size 2 angstroms: 6 angstroms
	let affine = &img["transforms"][0]["affine"];
	assert_eq!(affine[0][2], 6.0);
	assert_eq!(affine[1][2], -8.0);
}


#[test]
fn tomogram_to_cets() {

	let dir = WorkDir::new();
	dir.write_stack("tomo.rec", 16, 12, 8, 4.0);
	let out = dir.file("tomo.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tomogram").arg("tomo.rec")
		.arg("--ctf-corrected")
		.arg("--out").arg(out.path())
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	let json = out.read_json();
	assert_eq!(json["width"], 16);
	assert_eq!(json["height"], 12);
	assert_eq!(json["depth"], 8);
	assert_eq!(json["voxel_size"], 4.0);
	assert_eq!(json["ctf_corrected"], true);
}


#[test]
fn ctf_blocks_report() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.defocus")
		.write("1 3 0.0 0.0 12.5 3\n");
	let out = dir.file("ctf.json");
	let blocks = dir.file("blocks.txt");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--defocus").arg("series.defocus")
		.arg("--out").arg(out.path())
		.arg("--blocks").arg(blocks.path())
		.assert()
		.print_stdout()
		.print_stderr();
	assert.success();

	let text = blocks.read();
	let first_block = indoc! {"
		defocus_u: 125
		defocus_v: 125
		defocus_angle: 0
		phase_shift: 0
		defocus_handedness: -1
	"};
	assert!(text.starts_with(first_block));
	assert_eq!(text.matches("defocus_u:").count(), 3);
}


#[test]
fn ctf_records_back_to_defocus() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 2, 2.0);
	dir.file("series.tlt")
		.write("-3.00\n3.00\n");
	dir.file("series.defocus")
		.write(indoc! {"
			1 0 0.0 0.0 0.0 3
			1 1 -3.00 -3.00 250.00 240.00 30.00
			2 2 3.00 3.00 260.00 250.00 40.00
		"});
	let json_file = dir.file("ctf.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--defocus").arg("series.defocus")
		.arg("--out").arg(json_file.path())
		.assert()
		.print_stderr();
	assert.success();

	let out_defocus = dir.file("out.defocus");
	let assert = cmd()
		.current_dir(&dir)
		.arg("to-imod")
		.arg(json_file.path())
		.arg("--tlt").arg("series.tlt")
		.arg("--out-defocus").arg(out_defocus.path())
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	out_defocus.assert_eq(indoc! {"
		1 0 0.0 0.0 0.0 3
		1 1 -3.00 -3.00 250.00 240.00 30.00
		2 2 3.00 3.00 260.00 250.00 40.00
	"});
}


#[test]
fn tilt_series_back_to_imod() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.tlt")
		.write(indoc! {"
			-3.00 9.00
			0.00 3.00
			3.00 6.00
		"});
	dir.file("series.xf")
		.write(indoc! {"
			1.0 0.0 0.0 1.0 1.5 -2.0
			1.0 0.0 0.0 1.0 0.0 0.0
			1.0 0.0 0.0 1.0 -1.0 1.0
		"});
	let json_file = dir.file("ts.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--tlt").arg("series.tlt")
		.arg("--xf").arg("series.xf")
		.arg("--out").arg(json_file.path())
		.assert()
		.print_stderr();
	assert.success();

	let out_tlt = dir.file("out.tlt");
	let out_xf = dir.file("out.xf");
	let assert = cmd()
		.current_dir(&dir)
		.arg("to-imod")
		.arg(json_file.path())
		.arg("--out-tlt").arg(out_tlt.path())
		.arg("--dose")
		.arg("--out-xf").arg(out_xf.path())
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	out_tlt.assert_eq(indoc! {"
		-3.00 9.00
		0.00 3.00
		3.00 6.00
	"});

	// the shifts come back out in pixels
	out_xf.assert_eq(indoc! {"
		1.0000000 0.0000000 0.0000000 1.0000000 1.500 -2.000
		1.0000000 0.0000000 0.0000000 1.0000000 0.000 0.000
		1.0000000 0.0000000 0.0000000 1.0000000 -1.000 1.000
	"});
}


#[test]
fn config_file_supplies_defaults() {

	let dir = WorkDir::new();
	dir.file("convert.toml")
		.write(indoc! {r#"
			[tilt_series]
			binning = 2
		"#});
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.tlt")
		.write("-3.00\n0.00\n3.00\n");
	dir.file("series.xf")
		.write(indoc! {"
			1.0 0.0 0.0 1.0 1.5 -2.0
			1.0 0.0 0.0 1.0 0.0 0.0
			1.0 0.0 0.0 1.0 -1.0 1.0
		"});
	let out = dir.file("ts.json");

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--tlt").arg("series.tlt")
		.arg("--xf").arg("series.xf")
		.arg("--out").arg(out.path())
		.assert()
		.print_stderr();
	assert.success();

	// binning 2 comes from the config file: 1.5 px * 2 * 2 angstroms
	let json = out.read_json();
	assert_eq!(json["images"][0]["transforms"][0]["affine"][0][2], 6.0);
}


#[test]
fn generate_config() {

	let dir = WorkDir::new();

	let assert = cmd()
		.current_dir(&dir)
		.arg("config")
		.assert()
		.print_stdout()
		.print_stderr();
	dir.print();
	assert.success();

	assert!(dir.file("convert.toml").exists());

	// a second run leaves the existing file alone
	let marker = "# hands off";
	let config = dir.file("convert.toml");
	config.write(marker);

	let assert = cmd()
		.current_dir(&dir)
		.arg("config")
		.assert()
		.print_stdout();
	assert.success();
	config.assert_eq(marker);
}


#[test]
fn unsupported_flag_fails() {

	let dir = WorkDir::new();
	dir.write_stack("series.mrc", 8, 8, 3, 2.0);
	dir.file("series.defocus")
		.write(indoc! {"
			2 0 0.0 0.0 0.0 3
			1 1 0.0 0.0 250.0 45.0
		"});

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.arg("--tilt-series").arg("series.mrc")
		.arg("--defocus").arg("series.defocus")
		.assert()
		.print_stdout()
		.print_stderr();
	assert.failure()
		.stdout(predicates::str::contains("Unsupported defocus file flag"));
}


#[test]
fn nothing_to_convert_fails() {

	let dir = WorkDir::new();

	let assert = cmd()
		.current_dir(&dir)
		.arg("to-cets")
		.assert()
		.print_stdout()
		.print_stderr();
	assert.failure()
		.stdout(predicates::str::contains("Nothing to convert"));
}
