//! The `.docx` zip package, held in memory as ordered parts.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use patentdoc_core::{LoadError, read_package};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{WriteError, XmlError};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

/// Every file in the package, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Read a package from disk, decrypting it first if it is protected.
    pub fn open(path: &Path, passphrase: Option<&str>) -> Result<Self, LoadError> {
        let bytes = read_package(path, passphrase)?;
        Self::from_bytes(&bytes).map_err(|e| LoadError::Package {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, zip::result::ZipError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push((file.name().to_string(), data));
        }
        debug!(parts = parts.len(), "read package");
        Ok(Self { parts })
    }

    pub fn from_parts(parts: Vec<(String, Vec<u8>)>) -> Self {
        Self { parts }
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// A part as UTF-8 text.
    pub fn text_part(&self, name: &str) -> Result<&str, XmlError> {
        let data = self
            .part(name)
            .ok_or_else(|| XmlError::MissingPart(name.to_string()))?;
        std::str::from_utf8(data).map_err(|_| XmlError::NotUtf8(name.to_string()))
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Replace a part, or append it if the package does not have it yet.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WriteError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data).map_err(zip::result::ZipError::Io)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to `path` through a temporary file in the same
    /// directory. Nothing is left at `path` if any step fails.
    pub fn write_atomic(&self, path: &Path) -> Result<(), WriteError> {
        let bytes = self.to_bytes()?;
        let io_err = |source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote package");
        Ok(())
    }
}
