use anyhow::{Context, Result, anyhow};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::document::DocumentFormat;

// @module: File and directory utilities

/// Suffix inserted before the extension of generated project files
pub const PROJECT_SUFFIX: &str = "docweave";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path `<stem>.<suffix>.<ext>` next to the input or in output_dir
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension.trim_start_matches('.'));

        output_dir.join(output_filename)
    }

    /// Default project file for a document: `<stem>.docweave.json` beside it
    pub fn project_path_for<P: AsRef<Path>>(document: P) -> PathBuf {
        let document = document.as_ref();
        Self::generate_output_path(document, Self::parent_dir(document), PROJECT_SUFFIX, "json")
    }

    /// Directory containing a path, `.` for bare file names
    pub fn parent_dir(path: &Path) -> &Path {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Temporary file in the directory that will hold `target`
    pub fn temp_file_for<P: AsRef<Path>>(target: P) -> Result<NamedTempFile> {
        let dir = Self::parent_dir(target.as_ref());
        Self::ensure_dir(dir)?;
        NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))
    }

    /// Write bytes to a temporary sibling and rename it over `path`
    pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let mut temp = Self::temp_file_for(path)?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
        temp.flush()?;
        Self::persist(temp, path)
    }

    /// Move a finished temporary file into place
    pub fn persist<P: AsRef<Path>>(temp: NamedTempFile, path: P) -> Result<()> {
        let path = path.as_ref();
        temp.persist(path)
            .map_err(|e| anyhow!("Failed to move output into place at {:?}: {}", path, e.error))?;
        Ok(())
    }

    /// Hex SHA-256 of a file's contents
    pub fn sha256_file<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let mut file = fs::File::open(path)
            .with_context(|| format!("Failed to open file for hashing: {:?}", path))?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(Self::hex(&hasher.finalize()))
    }

    /// Hex SHA-256 of a byte slice
    pub fn sha256_bytes(bytes: &[u8]) -> String {
        Self::hex(&Sha256::digest(bytes))
    }

    fn hex(digest: &[u8]) -> String {
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Detect the document format of a file from its extension
    pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
        let path = path.as_ref();
        DocumentFormat::from_path(path)
            .with_context(|| format!("Cannot determine document format of {:?}", path))
    }
}
