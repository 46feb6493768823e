use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{INDEX_FILES, NODE_BUILTIN_PREFIX, RESOLVE_EXTENSIONS};
use crate::types::split_package_request;

/// Resolve `request` as imported from `from_file`.
///
/// Relative requests resolve against the importing file; bare requests walk up
/// `node_modules` directories, stopping at `root` when given. Builtins and
/// anything that cannot be found resolve to `None`.
pub fn resolve(
    root: Option<&Path>,
    from_file: &Path,
    request: &str,
    cache: &DashMap<(PathBuf, String), Option<PathBuf>>,
) -> Option<PathBuf> {
    let key = (from_file.to_path_buf(), request.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
        return v.clone();
    }
    trace!("Resolving: '{}' from {}", request, from_file.display());

    let base = from_file.parent().unwrap_or(Path::new("."));
    let resolved = if request.starts_with("./") || request.starts_with("../") || request == "." {
        let p = clean(base.join(request).to_string_lossy().to_string());
        resolve_file(Path::new(&p))
    } else if request.starts_with('/') {
        resolve_file(Path::new(request))
    } else if request.starts_with(NODE_BUILTIN_PREFIX) {
        None
    } else {
        resolve_package(base, request, root)
    };

    if resolved.is_none() {
        trace!("Failed to resolve '{}' from {}", request, from_file.display());
    }
    cache.insert(key, resolved.clone());
    resolved
}

/// Locate the entry module of a bare package request, searching
/// `node_modules` from `start_dir` upwards.
pub fn resolve_package(start_dir: &Path, request: &str, root: Option<&Path>) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, request);
    let mut current_dir = start_dir;

    loop {
        let result = resolve_node_module(current_dir, request);
        if result.is_some() {
            debug!("Resolved package '{}' to {:?}", request, result);
            return result;
        }

        if Some(current_dir) == root {
            break;
        }

        current_dir = current_dir.parent()?;
    }

    None
}

pub(crate) fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }

    if p.is_dir() {
        if let Some(entry) = entry_from_manifest(p) {
            return Some(entry);
        }
        for index_file in INDEX_FILES {
            let candidate = p.join(index_file);
            if candidate.is_file() {
                return Some(candidate.canonicalize().unwrap_or(candidate));
            }
        }
    }

    None
}

fn resolve_node_module(dir: &Path, request: &str) -> Option<PathBuf> {
    let (name, subpath) = split_package_request(request);
    let nm = dir.join("node_modules").join(name);
    if !nm.is_dir() {
        return None;
    }
    trace!("Checking node_modules at: {:?}", nm);

    match subpath {
        Some(sub) => resolve_file(&nm.join(sub)),
        None => resolve_file(&nm),
    }
}

/// Entry point named by `package.json` in `dir`: `exports`, then `module`, then `main`.
fn entry_from_manifest(dir: &Path) -> Option<PathBuf> {
    let txt = fs::read_to_string(dir.join("package.json")).ok()?;
    let v: Value = serde_json::from_str(&txt).ok()?;
    let join = |s: &str| resolve_entry_target(&dir.join(s.trim_start_matches("./")));

    if let Some(exports) = v.get("exports") {
        if let Some(s) = exports.as_str()
            && let Some(resolved) = join(s)
        {
            return Some(resolved);
        }
        // { ".": "./x.js" } or { ".": { "import": ..., "require": ... } } or a bare condition map
        let dot_export = exports.get(".").unwrap_or(exports);
        if let Some(s) = dot_export.as_str()
            && let Some(resolved) = join(s)
        {
            return Some(resolved);
        }
        if let Some(conditions) = dot_export.as_object() {
            for key in ["import", "require", "default"] {
                if let Some(s) = conditions.get(key).and_then(|x| x.as_str())
                    && let Some(resolved) = join(s)
                {
                    return Some(resolved);
                }
            }
        }
    }

    for field in ["module", "main"] {
        if let Some(s) = v.get(field).and_then(|x| x.as_str())
            && let Some(resolved) = join(s)
        {
            return Some(resolved);
        }
    }

    None
}

// Manifest targets never recurse into another manifest.
fn resolve_entry_target(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(p.canonicalize().unwrap_or_else(|_| p.to_path_buf()));
    }
    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(candidate.canonicalize().unwrap_or(candidate));
        }
    }
    INDEX_FILES
        .iter()
        .map(|index_file| p.join(index_file))
        .find(|candidate| candidate.is_file())
        .map(|candidate| candidate.canonicalize().unwrap_or(candidate))
}
