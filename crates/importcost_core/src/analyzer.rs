use anyhow::{Result, anyhow};
use dashmap::DashMap;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    constants::JS_TS_EXTENSIONS,
    event::{AnalysisEvent, EventSink},
    graph::reachable_modules,
    parser::parse_imports,
    resolver::resolve_package,
    types::{AnalysisRequest, ImportSite, PackageInfo, is_package_request},
};

/// A package-cost engine.
///
/// `analyze` starts costing one buffer and reports through `sink`; the
/// returned handle stops delivery when detached.
pub trait CostAnalyzer {
    fn supports_extension(&self, extension: &str) -> bool {
        JS_TS_EXTENSIONS.contains(&extension)
    }

    fn analyze(&self, request: AnalysisRequest, sink: EventSink)
    -> Result<Box<dyn AnalysisHandle>>;

    /// Release engine-wide resources. Called once at teardown.
    fn clean_up(&self);
}

pub trait AnalysisHandle {
    /// Stop delivering events. Calling it again is a no-op.
    fn detach(&mut self);
}

/// Costs packages by summing the on-disk size of every module reachable from
/// each package's entry point in `node_modules`.
pub struct FsCostAnalyzer {
    shared: Arc<Shared>,
}

struct Shared {
    root: Option<PathBuf>,
    import_cache: DashMap<PathBuf, Vec<ImportSite>>,
    resolve_cache: DashMap<(PathBuf, String), Option<PathBuf>>,
    size_cache: DashMap<PathBuf, u64>,
}

impl FsCostAnalyzer {
    /// `root` bounds the upward `node_modules` search; `None` searches to the filesystem root.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                root,
                import_cache: DashMap::new(),
                resolve_cache: DashMap::new(),
                size_cache: DashMap::new(),
            }),
        }
    }

    pub fn cached_packages(&self) -> usize {
        self.shared.size_cache.len()
    }
}

impl Shared {
    fn package_size(&self, base_dir: &Path, request: &str) -> Result<u64> {
        let root = self.root.as_deref();
        let entry = resolve_package(base_dir, request, root).ok_or_else(|| {
            anyhow!("Cannot find package '{}' from {}", request, base_dir.display())
        })?;

        if let Some(size) = self.size_cache.get(&entry) {
            trace!("Cache hit for package size: {}", entry.display());
            return Ok(*size);
        }

        let modules = reachable_modules(root, &entry, &self.import_cache, &self.resolve_cache);
        let size: u64 =
            modules.iter().filter_map(|m| fs::metadata(m).ok()).map(|md| md.len()).sum();
        debug!("Package '{}' reaches {} modules, {} bytes", request, modules.len(), size);

        self.size_cache.insert(entry, size);
        Ok(size)
    }
}

struct FsAnalysisHandle {
    cancelled: Arc<AtomicBool>,
}

impl AnalysisHandle for FsAnalysisHandle {
    fn detach(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl CostAnalyzer for FsCostAnalyzer {
    fn analyze(
        &self,
        request: AnalysisRequest,
        sink: EventSink,
    ) -> Result<Box<dyn AnalysisHandle>> {
        info!("Analyzing import cost of {} ({})", request.file_path.display(), sink.id());

        // One report per package name; the first import of a name anchors its label
        let mut seen = HashSet::new();
        let packages: Vec<PackageInfo> = parse_imports(&request.file_path, &request.content)
            .iter()
            .filter(|site| is_package_request(&site.request) && seen.insert(site.request.clone()))
            .map(PackageInfo::from)
            .collect();
        debug!("{} package imports in {}", packages.len(), request.file_path.display());

        let base_dir = request
            .file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("{} has no parent directory", request.file_path.display()))?;

        let cancelled = Arc::new(AtomicBool::new(false));
        sink.emit(AnalysisEvent::Start(packages.clone()));

        let shared = Arc::clone(&self.shared);
        let flag = Arc::clone(&cancelled);

        rayon::spawn(move || {
            packages.par_iter().for_each(|package| {
                if flag.load(Ordering::Relaxed) {
                    return;
                }
                let event = match shared.package_size(&base_dir, &package.name) {
                    Ok(size) => AnalysisEvent::Calculated(package.calculated(size)),
                    Err(e) => {
                        warn!("Failed to cost '{}': {:#}", package.name, e);
                        AnalysisEvent::Failed { package: package.failed(), reason: e.to_string() }
                    }
                };
                if !flag.load(Ordering::Relaxed) {
                    sink.emit(event);
                }
            });

            if flag.load(Ordering::Relaxed) {
                debug!("Analysis {} detached before completion", sink.id());
            } else {
                sink.emit(AnalysisEvent::Finished);
            }
        });

        Ok(Box::new(FsAnalysisHandle { cancelled }))
    }

    fn clean_up(&self) {
        debug!(
            "Dropping analyzer caches: imports={}, resolutions={}, packages={}",
            self.shared.import_cache.len(),
            self.shared.resolve_cache.len(),
            self.shared.size_cache.len()
        );
        self.shared.import_cache.clear();
        self.shared.resolve_cache.clear();
        self.shared.size_cache.clear();
    }
}
