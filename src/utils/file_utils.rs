use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_into_missing_dir_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("file.txt");
        let err = write_text(&path, "x").unwrap_err();
        assert!(format!("{:#}", err).contains("file.txt"));

        ensure_dir(&dir.path().join("absent")).unwrap();
        write_text(&path, "x").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }
}
