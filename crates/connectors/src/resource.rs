use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves a configured location: first as a direct path, then relative to
/// each resource root in order. Returns `None` when nothing exists.
pub fn resolve(location: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(location);
    if direct.exists() {
        return Some(direct.to_path_buf());
    }

    // Leading separators would make `join` discard the root.
    let relative = location.trim_start_matches(['/', '\\']);
    roots.iter().find_map(|root| {
        let candidate = root.join(relative);
        if candidate.exists() {
            debug!(location, resolved = %candidate.display(), "Resolved resource from root");
            Some(candidate)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prefers_direct_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.csv");
        fs::write(&file, "a,b\n").unwrap();

        let resolved = resolve(file.to_str().unwrap(), &[]).unwrap();
        assert_eq!(resolved, file);
    }

    #[test]
    fn falls_back_to_resource_roots() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::create_dir_all(second.path().join("mapping")).unwrap();
        fs::write(second.path().join("mapping/report.json"), "{}").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let resolved = resolve("mapping/report.json", &roots).unwrap();
        assert_eq!(resolved, second.path().join("mapping/report.json"));
    }

    #[test]
    fn missing_everywhere() {
        let root = tempdir().unwrap();
        assert!(resolve("nope.csv", &[root.path().to_path_buf()]).is_none());
    }
}
