use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const RESOURCES_DIR: &str = "tests/resources";

/// Resolves a fixture under `tests/resources` of the crate being tested.
///
/// `name` may point into subfolders, e.g. `"subfolder/otherfile.txt"`.
pub fn resource(name: &str) -> Result<PathBuf, ResourceError> {
    let manifest_dir = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_default();
    resource_in(manifest_dir.join(RESOURCES_DIR), name)
}

pub fn resource_in(root: impl AsRef<Path>, name: &str) -> Result<PathBuf, ResourceError> {
    let path = root.as_ref().join(name);
    if !path.exists() {
        return Err(ResourceError::NotFound(name.to_string()));
    }
    Ok(path)
}

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Test resource not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_files() {
        assert!(resource("somefile.txt").unwrap().exists());
    }

    #[test]
    fn test_files_in_subfolders() {
        let path = resource("subfolder/otherfile.txt").unwrap();
        assert!(path.is_file());
        assert!(path.ends_with("subfolder/otherfile.txt"));
    }

    #[test]
    fn test_file_not_found() {
        let err = resource("doesNotExist.txt").unwrap_err();
        assert_eq!(err.to_string(), "Test resource not found: doesNotExist.txt");
    }

    #[test]
    fn test_explicit_root() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests");
        assert!(resource_in(&root, "resources/somefile.txt").is_ok());
        assert!(resource_in(&root, "somefile.txt").is_err());
    }
}
