use serde::Serialize;
use std::path::PathBuf;

use crate::constants::NODE_BUILTIN_PREFIX;

/// An import, require or dynamic import found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub request: String,
    /// 1-based line of the statement
    pub line: usize,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Pending,
    Calculated,
    Error,
}

/// Size report for one imported package, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    /// 1-based line of the import statement
    pub line: usize,
    /// Byte count, absent until calculated
    pub size: Option<u64>,
    pub status: PackageStatus,
}

impl PackageInfo {
    pub fn pending(name: impl Into<String>, line: usize) -> Self {
        Self { name: name.into(), line, size: None, status: PackageStatus::Pending }
    }

    pub fn calculated(&self, size: u64) -> Self {
        Self { size: Some(size), status: PackageStatus::Calculated, ..self.clone() }
    }

    pub fn failed(&self) -> Self {
        Self { size: None, status: PackageStatus::Error, ..self.clone() }
    }
}

impl From<&ImportSite> for PackageInfo {
    fn from(site: &ImportSite) -> Self {
        PackageInfo::pending(site.request.clone(), site.line)
    }
}

/// Everything an analyzer needs to cost one editor buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file_path: PathBuf,
    pub content: String,
    pub extension: String,
}

/// True for bare package requests (`lodash`, `@scope/pkg/sub`), false for
/// relative or absolute paths and `node:` builtins.
pub fn is_package_request(request: &str) -> bool {
    !request.is_empty()
        && !request.starts_with('.')
        && !request.starts_with('/')
        && !request.starts_with(NODE_BUILTIN_PREFIX)
}

/// Split a bare request into the package name and an optional subpath.
///
/// `@scope/pkg/lib/a` yields `("@scope/pkg", Some("lib/a"))`.
pub fn split_package_request(request: &str) -> (&str, Option<&str>) {
    let name_segments = if request.starts_with('@') { 2 } else { 1 };
    let mut boundary = None;
    for (seen, (idx, _)) in request.match_indices('/').enumerate() {
        if seen + 1 == name_segments {
            boundary = Some(idx);
            break;
        }
    }

    match boundary {
        Some(idx) => {
            let sub = &request[idx + 1..];
            (&request[..idx], if sub.is_empty() { None } else { Some(sub) })
        }
        None => (request, None),
    }
}
