//! Plugin package fixtures.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// File name of the module descriptor at the root of a package.
pub const DESCRIPTOR_FILE_NAME: &str = "Module.toml";

/// Builder for an on-disk plugin package.
///
/// The archive format is picked from the file name: `.jar` and `.zip` are
/// written as zip archives, `.tar` as a plain tarball and `.tar.gz` as a
/// gzip-compressed tarball.
///
/// ```rust,ignore
/// let path = PackageFixture::new("greeter-1.0.jar")
///     .descriptor("[[module]]\nname = \"demo.greeter\"\n")
///     .write_to(tmp.path())?;
/// ```
#[derive(Debug, Clone)]
pub struct PackageFixture {
    file_name: String,
    entries: Vec<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Zip,
    Tar,
    TarGz,
}

impl Format {
    fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".jar") || name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

impl PackageFixture {
    /// Start a package that will be written as `file_name`.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            entries: Vec::new(),
        }
    }

    /// Put a module descriptor at the package root.
    #[must_use]
    pub fn descriptor(self, content: &str) -> Self {
        self.file(DESCRIPTOR_FILE_NAME, content)
    }

    /// Add an arbitrary entry to the package.
    #[must_use]
    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries
            .push((name.to_owned(), content.as_ref().to_vec()));
        self
    }

    /// The file name the package will be written under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Write the package into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file name has no supported package extension
    /// or the archive cannot be written.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let format = Format::from_file_name(&self.file_name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported package extension: {}", self.file_name),
            )
        })?;

        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        let file = File::create(&path)?;

        match format {
            Format::Zip => self.write_zip(file)?,
            Format::Tar => {
                self.write_tar(file)?.flush()?;
            },
            Format::TarGz => {
                let encoder = GzEncoder::new(file, Compression::default());
                self.write_tar(encoder)?.finish()?.flush()?;
            },
        }

        Ok(path)
    }

    fn write_zip(&self, file: File) -> io::Result<()> {
        let mut zip = ZipWriter::new(file);
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), SimpleFileOptions::default())
                .map_err(io::Error::other)?;
            zip.write_all(data)?;
        }
        zip.finish().map_err(io::Error::other)?.flush()
    }

    fn write_tar<W: Write>(&self, writer: W) -> io::Result<W> {
        let mut builder = tar::Builder::new(writer);
        for (name, data) in &self.entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_slice())?;
        }
        builder.into_inner()
    }
}
