use crate::Result;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

pub trait VcfSource {
    fn source_name(&self) -> &'static str;
    fn fetch_vcf(&self) -> Result<String>;
}

/// A `.vcf` file on disk, or standard input when the path is `-`.
#[derive(Debug, Clone)]
pub struct VcfFile {
    path: PathBuf,
}

impl VcfFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

impl VcfSource for VcfFile {
    fn source_name(&self) -> &'static str {
        if self.is_stdin() {
            "stdin"
        } else {
            "file"
        }
    }

    fn fetch_vcf(&self) -> Result<String> {
        if self.is_stdin() {
            let mut data = String::new();
            io::stdin().lock().read_to_string(&mut data)?;
            return Ok(data);
        }
        Ok(fs::read_to_string(&self.path)?)
    }
}
