use crate::Result;
use crate::diagnostics;

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes generated files into one output directory.
///
/// A file whose content is already up to date is left untouched so that
/// repeated runs do not bump timestamps and trigger rebuilds.
#[derive(Debug, Clone, Copy)]
pub struct FileManager<'a> {
    dir: &'a Path,
}

impl<'a> FileManager<'a> {
    pub fn new(dir: &'a Path) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.join(filename);

        if let Ok(existing) = fs::read_to_string(&path)
            && existing == contents
        {
            debug!(path = %path.display(), "unchanged");
            return Ok(path);
        }

        fs::write(&path, contents).with_context(|| {
            diagnostics::error_message(format!("write generated file {}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn overwrites_changed_content_and_keeps_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::new(dir.path());

        let path = fm.write("a.cpp", "one").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
        let first = fs::metadata(&path).unwrap().modified().unwrap();

        fm.write("a.cpp", "one").unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), first);

        fm.write("a.cpp", "two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let err = FileManager::new(&missing).write("a.cpp", "x").unwrap_err();
        assert!(err.to_string().contains("write generated file"));
    }
}
