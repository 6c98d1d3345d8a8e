
// the CETS data model, or at least the parts of it we translate to and from IMOD files
// https://github.com/cryoem-data-standards


/// CETS always describes defocus with the EMX convention,
/// so the handedness is a constant
pub const DEFOCUS_HANDEDNESS: i32 = -1;


#[derive(Debug, Clone, PartialEq)]
pub struct CtfMetadata {
	/// angstroms
	pub defocus_u: f64,
	/// angstroms
	pub defocus_v: f64,
	/// degrees, in [0,180)
	pub defocus_angle: f64,
	/// degrees
	pub phase_shift: f64,
	pub defocus_handedness: i32
}


#[derive(Debug, Clone, PartialEq)]
pub struct Affine {
	/// row-major, third row is always 0 0 1
	pub affine: [[f64; 3]; 3],
	pub name: String,
	pub input: String,
	pub output: String
}


#[derive(Debug, Clone, PartialEq)]
pub struct TiltImage {
	pub path: String,
	/// z index into the tilt-series stack, 1-based
	pub section: u32,
	pub nominal_tilt_angle: f64,
	/// electrons per square angstrom
	pub accumulated_dose: Option<f64>,
	pub acq_order: Option<u32>,
	pub width: u32,
	pub height: u32,
	/// angstroms per pixel
	pub pixel_size: f64,
	pub ctf: Option<CtfMetadata>,
	pub ctf_corrected: bool,
	pub even_path: Option<String>,
	pub odd_path: Option<String>,
	pub transforms: Vec<Affine>
}


#[derive(Debug, Clone, PartialEq)]
pub struct TiltSeries {
	pub tilt_series_id: String,
	pub path: String,
	pub images: Vec<TiltImage>
}


#[derive(Debug, Clone, PartialEq)]
pub struct Tomogram {
	pub path: String,
	pub width: u32,
	pub height: u32,
	pub depth: u32,
	/// angstroms per voxel
	pub voxel_size: f64,
	pub ctf_corrected: bool,
	pub even_path: Option<String>,
	pub odd_path: Option<String>
}
