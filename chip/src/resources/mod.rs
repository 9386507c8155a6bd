use std::{
    fs::File,
    io::{prelude::*, BufReader},
    path::Path,
};
use zip::read::ZipArchive;

use crate::RomError;

/// Represents an archive of roms, every file inside the zip is a single rom.
pub struct RomArchive<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl RomArchive<BufReader<File>> {
    /// Will open the zip archive at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> RomArchive<R> {
    /// Will generate a new rom archive object from the given zip data
    pub fn new(reader: R) -> Result<Self, RomError> {
        Ok(RomArchive {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Will return all the rom names available to be chosen, sorted
    pub fn file_names(&self) -> Vec<&'_ str> {
        let mut names: Vec<_> = self
            .archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .collect();
        names.sort_unstable();
        names
    }

    /// Will decompress the rom with the given name from the zip archive
    pub fn get_file_data(&mut self, name: &str) -> Result<Rom, RomError> {
        let mut file = self.archive.by_name(name)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        log::debug!("extracted {} with {} bytes", name, data.len());
        Ok(Rom::new(name, data))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The raw program stored on the heap
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    pub fn new<D: Into<Box<[u8]>>>(name: &str, data: D) -> Self {
        Rom {
            name: name.to_string(),
            data: data.into(),
        }
    }

    /// Will read a plain rom file, it is named after the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Rom::new(&name, data))
    }

    /// Will read the rom either straight from the file, or if an `entry` is
    /// given, from that entry of the zip archive at `path`.
    pub fn open<P: AsRef<Path>>(path: P, entry: Option<&str>) -> Result<Self, RomError> {
        match entry {
            Some(entry) => RomArchive::open(path)?.get_file_data(entry),
            None => Rom::from_file(path),
        }
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}
