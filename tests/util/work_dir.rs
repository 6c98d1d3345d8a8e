
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use galvanic_assert::{assert_that, matchers::*};

use cets_imod::mrc::MrcHeader;


pub struct WorkDir {
	dir: TempDir
}

impl WorkDir {

	pub fn new() -> WorkDir {
		Self {
			dir: TempDir::new()
				.expect("Failed to make temp folder")
		}
	}

	pub fn file(&self, path: impl AsRef<Path>) -> WorkFile {
		WorkFile {
			_dir: self,
			path: self.dir.path().join(path.as_ref())
		}
	}

	/// fabricates a zero-filled tilt-series stack
	pub fn write_stack(&self, name: impl AsRef<Path>, nx: u32, ny: u32, nz: u32, pixel_size: f32) -> WorkFile {
		let file = self.file(name);
		MrcHeader::write_stack(file.path(), nx, ny, nz, pixel_size)
			.expect("Failed to write MRC stack");
		file
	}

	pub fn print(&self) {
		let path = self.dir.path();
		println!("Work Folder: {}", path.to_string_lossy());
		let dir = fs::read_dir(path)
			.expect(&format!("Failed to read dir: {}", path.to_string_lossy()));
		for entry in dir {
			match entry {
				Ok(entry) => println!("\t{}", entry.file_name().to_string_lossy()),
				Err(e) => println!("\tError: {}", e)
			}
		}
	}
}

impl AsRef<Path> for WorkDir {
	fn as_ref(&self) -> &Path {
		self.dir.path()
	}
}


pub struct WorkFile<'d> {
	_dir: &'d WorkDir,
	path: PathBuf
}

impl<'d> WorkFile<'d> {

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn write(&self, txt: impl AsRef<str>) {
		fs::write(self.path(), txt.as_ref())
			.expect(&format!("Failed to write file: {}", self.path().to_string_lossy()));
	}

	pub fn exists(&self) -> bool {
		self.path.exists()
	}

	pub fn read(&self) -> String {
		fs::read_to_string(self.path())
			.expect(&format!("Failed to read file: {}", self.path().to_string_lossy()))
	}

	pub fn read_json(&self) -> serde_json::Value {
		serde_json::from_str(&self.read())
			.expect(&format!("Failed to parse JSON file: {}", self.path().to_string_lossy()))
	}

	pub fn assert_eq(&self, exp: impl AsRef<str>) {
		let obs = self.read();
		let exp = exp.as_ref();
		assert_that!(&obs.as_str(), eq(exp));
	}
}
