//! Package containers
//!
//! An XLSX file is a zip archive of XML parts addressed by path. The
//! writer produces `(path, bytes)` pairs and hands them to a [`PartSink`];
//! the reader pulls parts by path from a [`PartSource`]. Zip archives and
//! in-memory packages implement both sides.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use crate::error::{XlsxError, XlsxResult};

/// Receives the parts of a package being written
pub trait PartSink {
    /// Store one part
    fn write_part(&mut self, path: &str, data: &[u8]) -> XlsxResult<()>;

    /// Complete the package; no parts may be written afterwards
    fn finish(self) -> XlsxResult<()>
    where
        Self: Sized;
}

/// Supplies the parts of a package being read
pub trait PartSource {
    /// Get the bytes of a part, or `None` if the package has no such part
    fn read_part(&mut self, path: &str) -> XlsxResult<Option<Vec<u8>>>;

    /// Paths of every part in the package
    fn part_names(&self) -> Vec<String>;

    /// Check if the package contains a part
    fn has_part(&self, path: &str) -> bool {
        self.part_names().iter().any(|name| name == path)
    }
}

/// Zip archive writer over any seekable stream
pub struct ZipPackageWriter<W: Write + Seek> {
    zip: zip::ZipWriter<W>,
}

impl<W: Write + Seek> ZipPackageWriter<W> {
    /// Start a new archive on `writer`
    pub fn new(writer: W) -> Self {
        Self {
            zip: zip::ZipWriter::new(writer),
        }
    }
}

impl<W: Write + Seek> PartSink for ZipPackageWriter<W> {
    fn write_part(&mut self, path: &str, data: &[u8]) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        self.zip.start_file(path, options)?;
        self.zip.write_all(data)?;
        Ok(())
    }

    fn finish(self) -> XlsxResult<()> {
        let mut writer = self.zip.finish()?;
        writer.flush()?;
        Ok(())
    }
}

/// Zip archive reader over any seekable stream
pub struct ZipPackageReader<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipPackageReader<R> {
    /// Open the archive in `reader`
    pub fn new(reader: R) -> XlsxResult<Self> {
        let archive = zip::ZipArchive::new(reader)?;
        Ok(Self { archive })
    }
}

impl<R: Read + Seek> PartSource for ZipPackageReader<R> {
    fn read_part(&mut self, path: &str) -> XlsxResult<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(XlsxError::Zip(e)),
        };
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }
}

/// Package held entirely in memory
///
/// Useful for inspecting generated XML without going through zip.
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl MemoryPackage {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a part
    pub fn insert<P: Into<String>, D: Into<Vec<u8>>>(&mut self, path: P, data: D) {
        self.parts.insert(path.into(), data.into());
    }

    /// Get a part's bytes
    pub fn part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(Vec::as_slice)
    }

    /// Get a part as text, if it is valid UTF-8
    pub fn part_str(&self, path: &str) -> Option<&str> {
        self.part(path).and_then(|data| std::str::from_utf8(data).ok())
    }

    /// Remove a part
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.parts.remove(path)
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the package has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartSink for &mut MemoryPackage {
    fn write_part(&mut self, path: &str, data: &[u8]) -> XlsxResult<()> {
        self.insert(path, data);
        Ok(())
    }

    fn finish(self) -> XlsxResult<()> {
        Ok(())
    }
}

impl PartSource for MemoryPackage {
    fn read_part(&mut self, path: &str) -> XlsxResult<Option<Vec<u8>>> {
        Ok(self.parts.get(path).cloned())
    }

    fn part_names(&self) -> Vec<String> {
        self.parts.keys().cloned().collect()
    }

    fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }
}
