use dashmap::DashMap;
use log::{debug, trace};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::{parser::imports_for, resolver::resolve, types::ImportSite};

/// Every module reachable from `start`, `start` included.
///
/// Unreadable modules count as leaves; unresolvable requests are skipped.
pub fn reachable_modules(
    root: Option<&Path>,
    start: &Path,
    import_cache: &DashMap<PathBuf, Vec<ImportSite>>,
    resolve_cache: &DashMap<(PathBuf, String), Option<PathBuf>>,
) -> HashSet<PathBuf> {
    trace!("Computing reachable modules from: {}", start.display());
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack: Vec<PathBuf> = vec![start.to_path_buf()];

    while let Some(cur) = stack.pop() {
        if !visited.insert(cur.clone()) {
            continue;
        }
        trace!("Visiting module: {}", cur.display());

        let sites = match imports_for(&cur, import_cache) {
            Ok(sites) => sites,
            Err(e) => {
                debug!("Treating {} as a leaf: {:#}", cur.display(), e);
                continue;
            }
        };

        for site in sites {
            if let Some(next) = resolve(root, &cur, &site.request, resolve_cache)
                && !visited.contains(&next)
            {
                stack.push(next);
            }
        }
    }

    debug!("Computed {} reachable modules from {}", visited.len(), start.display());
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path.canonicalize().unwrap()
    }

    fn reachable(root: &Path, start: &Path) -> HashSet<PathBuf> {
        reachable_modules(Some(root), start, &DashMap::new(), &DashMap::new())
    }

    #[test]
    fn test_reachable_modules_simple() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let entry = create_test_file(root, "pkg/index.js", "import './a'; import './b';");
        let a = create_test_file(root, "pkg/a.js", "// a");
        let b = create_test_file(root, "pkg/b.js", "// b");

        let set = reachable(root, &entry);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&entry));
        assert!(set.contains(&a));
        assert!(set.contains(&b));
    }

    #[test]
    fn test_reachable_modules_circular() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let entry = create_test_file(root, "pkg/index.js", "import './a';");
        create_test_file(root, "pkg/a.js", "import './b';");
        create_test_file(root, "pkg/b.js", "import './a';");

        assert_eq!(reachable(root, &entry).len(), 3);
    }

    #[test]
    fn test_reachable_modules_follow_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let entry = create_test_file(
            root,
            "node_modules/outer/index.js",
            "module.exports = require('inner');",
        );
        let inner = create_test_file(root, "node_modules/inner/index.js", "// inner");

        let set = reachable(root, &entry);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&inner));
    }

    #[test]
    fn test_reachable_modules_skip_builtins_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let entry = create_test_file(
            root,
            "pkg/index.js",
            "const fs = require('fs');\nimport 'node:path';\nimport './missing';",
        );

        let set = reachable(root, &entry);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&entry));
    }

    #[test]
    fn test_reachable_modules_shared_dependency_counted_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let entry = create_test_file(root, "pkg/index.js", "import './a'; import './b';");
        create_test_file(root, "pkg/a.js", "import './c';");
        create_test_file(root, "pkg/b.js", "import './c';");
        create_test_file(root, "pkg/c.js", "// c");

        assert_eq!(reachable(root, &entry).len(), 4);
    }
}
