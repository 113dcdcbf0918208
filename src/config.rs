use std::fs;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// Reads the list of VM names, one token per name, in file order.
pub fn load_vm_list(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let names: Vec<String> = contents.split_whitespace().map(str::to_owned).collect();
    tracing::debug!(count = names.len(), path = %path.display(), "loaded VM list");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn splits_on_any_whitespace_and_keeps_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "vmA vmB\n\tvmC\n\n  vmA  \n").unwrap();

        let names = load_vm_list(file.path()).unwrap();
        assert_eq!(names, vec!["vmA", "vmB", "vmC", "vmA"]);
    }

    #[test]
    fn empty_file_gives_empty_list() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_vm_list(file.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmlist.conf");

        let err = load_vm_list(&path).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigRead { .. }));
        assert!(err.to_string().contains("vmlist.conf"));
    }
}
