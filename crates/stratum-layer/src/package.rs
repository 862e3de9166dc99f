//! Plugin package formats and descriptor extraction.
//!
//! Only the `Module.toml` entry is read; nothing is unpacked to disk.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::descriptor::{DESCRIPTOR_FILE_NAME, ModuleDescriptor, PackageDescriptor};
use crate::error::{LayerError, LayerResult};
use crate::naming::parse_artifact_name;

/// Maximum descriptor size (256 KB).
const MAX_DESCRIPTOR_SIZE: u64 = 262_144;

/// Recognized package formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// Java-style archive (zip container).
    Jar,
    /// Zip archive.
    Zip,
    /// Uncompressed tarball.
    Tar,
    /// Gzip-compressed tarball.
    TarGz,
}

impl PackageKind {
    /// All kinds, longest extension first.
    pub const ALL: [Self; 4] = [Self::TarGz, Self::Jar, Self::Zip, Self::Tar];

    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jar => "jar",
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
        }
    }

    /// Detect the package kind from a file name.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            file_name
                .strip_suffix(kind.extension())
                .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
        })
    }

    /// Detect the package kind from a path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
    }

    /// Strip this kind's extension from a file name.
    #[must_use]
    pub fn file_stem(self, file_name: &str) -> &str {
        file_name
            .strip_suffix(self.extension())
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(file_name)
    }
}

/// A package whose descriptor has been read.
#[derive(Debug, Clone)]
pub struct Package {
    /// Path to the package file.
    pub path: PathBuf,
    /// Package format.
    pub kind: PackageKind,
    /// Declared modules, or a single automatic module.
    pub descriptor: PackageDescriptor,
}

impl Package {
    /// Read a package's descriptor.
    ///
    /// A package without `Module.toml` yields one automatic module named
    /// after the artifact id, or the file stem if the name doesn't follow
    /// the `{id}-{version}` convention.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UnsupportedPackage`] for unknown extensions,
    /// [`LayerError::Io`] if the file cannot be opened, and
    /// [`LayerError::InvalidPackage`] for corrupt archives or descriptors.
    pub fn read(path: &Path) -> LayerResult<Self> {
        let kind =
            PackageKind::from_path(path).ok_or_else(|| LayerError::UnsupportedPackage(path.into()))?;

        let descriptor = match read_descriptor(path, kind)? {
            Some(content) => PackageDescriptor::parse(&content, path)?,
            None => {
                let name = automatic_module_name(path, kind);
                debug!(path = %path.display(), module = %name, "no descriptor, using automatic module");
                PackageDescriptor {
                    modules: vec![ModuleDescriptor::automatic(name)],
                }
            },
        };

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            descriptor,
        })
    }
}

fn automatic_module_name(path: &Path, kind: PackageKind) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_artifact_name(&file_name)
        .map(|n| n.id)
        .unwrap_or_else(|| kind.file_stem(&file_name).to_string())
}

fn invalid(path: &Path, message: impl std::fmt::Display) -> LayerError {
    LayerError::InvalidPackage {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_descriptor(path: &Path, kind: PackageKind) -> LayerResult<Option<String>> {
    let file = File::open(path).map_err(|e| LayerError::io(path, e))?;
    match kind {
        PackageKind::Jar | PackageKind::Zip => read_zip_descriptor(path, file),
        PackageKind::Tar => read_tar_descriptor(path, file),
        PackageKind::TarGz => read_tar_descriptor(path, GzDecoder::new(file)),
    }
}

fn read_zip_descriptor(path: &Path, file: File) -> LayerResult<Option<String>> {
    let mut archive = zip::ZipArchive::new(file).map_err(|e| invalid(path, e))?;
    let entry = match archive.by_name(DESCRIPTOR_FILE_NAME) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(invalid(path, e)),
    };
    check_size(path, entry.size())?;
    read_limited(path, entry).map(Some)
}

fn read_tar_descriptor<R: Read>(path: &Path, reader: R) -> LayerResult<Option<String>> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(|e| invalid(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| invalid(path, e))?;
        let entry_path = entry.path().map_err(|e| invalid(path, e))?;
        let is_descriptor = entry_path
            .strip_prefix(".")
            .unwrap_or(&entry_path)
            .as_os_str()
            == DESCRIPTOR_FILE_NAME;
        if is_descriptor {
            let size = entry.header().size().map_err(|e| invalid(path, e))?;
            check_size(path, size)?;
            return read_limited(path, entry).map(Some);
        }
    }
    Ok(None)
}

fn check_size(path: &Path, size: u64) -> LayerResult<()> {
    if size > MAX_DESCRIPTOR_SIZE {
        return Err(invalid(
            path,
            format!("{DESCRIPTOR_FILE_NAME} exceeds {MAX_DESCRIPTOR_SIZE} bytes"),
        ));
    }
    Ok(())
}

/// Reads at most one byte past the cap so a lying header still fails.
fn read_limited<R: Read>(path: &Path, reader: R) -> LayerResult<String> {
    let mut content = String::new();
    let read = reader
        .take(MAX_DESCRIPTOR_SIZE.saturating_add(1))
        .read_to_string(&mut content)
        .map_err(|e| invalid(path, format!("{DESCRIPTOR_FILE_NAME}: {e}")))?;
    check_size(path, u64::try_from(read).unwrap_or(u64::MAX))?;
    Ok(content)
}
