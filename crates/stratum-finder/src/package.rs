//! Writing the finder package.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stratum_layer::DESCRIPTOR_FILE_NAME;
use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::finder::MODULE_DESCRIPTOR;

/// File name of the finder package for `artifact_key`.
///
/// The bootstrap search matches on the `artifact_key` prefix and the
/// `.jar` extension; the version is informational.
#[must_use]
pub fn package_file_name(artifact_key: &str) -> String {
    format!("{artifact_key}-{}.jar", env!("CARGO_PKG_VERSION"))
}

/// Write the finder package into `dir`, replacing any existing one.
///
/// `dir` must not be a watch directory, or the finder module would also be
/// loaded into a plugin layer.
///
/// # Errors
///
/// Returns an error if the directory or archive cannot be written.
pub fn write_package(dir: &Path, artifact_key: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(package_file_name(artifact_key));

    let mut zip = ZipWriter::new(File::create(&path)?);
    zip.start_file(DESCRIPTOR_FILE_NAME, SimpleFileOptions::default())
        .map_err(io::Error::other)?;
    zip.write_all(MODULE_DESCRIPTOR.as_bytes())?;
    zip.finish().map_err(io::Error::other)?.flush()?;

    info!(path = %path.display(), "wrote finder package");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_layer::{FINDER_CAPABILITY, Package, find_finder_artifact};

    #[test]
    fn written_package_is_found_and_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_package(&tmp.path().join("libs"), "plugin-service-loader").unwrap();

        assert_eq!(
            find_finder_artifact(tmp.path(), "plugin-service-loader"),
            Some(path.clone())
        );

        let package = Package::read(&path).unwrap();
        let module = &package.descriptor.modules[0];
        assert_eq!(module.name, crate::FINDER_MODULE);
        assert_eq!(
            module.providers_of(FINDER_CAPABILITY).collect::<Vec<_>>(),
            vec![crate::FINDER_TYPE]
        );
    }

    #[test]
    fn file_name_carries_key_and_version() {
        let name = package_file_name("custom-finder");
        assert!(name.starts_with("custom-finder-"));
        assert!(name.ends_with(".jar"));
    }
}
