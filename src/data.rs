use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use log::info;
use zip::ZipArchive;

use crate::{config::DataConfig, errors::Result};

/// Makes sure the sample data directory exists, fetching and extracting
/// the archive when it does not.
pub fn ensure_sample_data(config: &DataConfig) -> Result<PathBuf> {
    if config.data_dir.is_dir() {
        info!("{} already exists", config.data_dir.display());
        return Ok(config.data_dir.clone());
    }
    let archive = fetch(&config.archive_url)?;
    let extracted = extract_archive(&archive, &config.extract_dir())?;
    info!(
        "extracted {extracted} entries into {}",
        config.extract_dir().display()
    );
    Ok(config.data_dir.clone())
}

/// Unpacks a zip archive held in memory under `destination`.
///
/// Returns the number of entries.
pub fn extract_archive(bytes: &[u8], destination: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    archive.extract(destination)?;
    Ok(archive.len())
}

#[cfg(feature = "download")]
pub fn fetch(url: &str) -> Result<Vec<u8>> {
    info!("downloading {url}");
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

#[cfg(not(feature = "download"))]
pub fn fetch(url: &str) -> Result<Vec<u8>> {
    Err(crate::errors::GeocompError::UnsupportedOperation(format!(
        "downloading {url} needs the download feature"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::{write::SimpleFileOptions, ZipWriter};

    fn archive() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("data/world.geojson", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(br#"{"type": "FeatureCollection", "features": []}"#)
            .unwrap();
        writer
            .start_file("data/readme.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"sample data").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn archive_lands_under_destination() {
        let dir = TempDir::new().unwrap();
        assert_eq!(extract_archive(&archive(), dir.path()).unwrap(), 2);
        let readme = std::fs::read_to_string(dir.path().join("data/readme.txt")).unwrap();
        assert_eq!(readme, "sample data");
        assert!(crate::vector::read_file(dir.path().join("data/world.geojson"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let dir = TempDir::new().unwrap();
        assert!(extract_archive(b"not a zip", dir.path()).is_err());
    }

    #[test_log::test]
    fn existing_directory_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let config = DataConfig {
            data_dir: dir.path().to_path_buf(),
            archive_url: "http://127.0.0.1:9/unreachable.zip".into(),
        };
        assert_eq!(ensure_sample_data(&config).unwrap(), dir.path());
    }
}
