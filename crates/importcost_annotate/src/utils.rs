use importcost_core::CostAnalyzer;
use std::path::Path;

/// Extension of `path` if the analyzer accepts it.
pub fn analyzable_extension<A: CostAnalyzer + ?Sized>(path: &Path, analyzer: &A) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    analyzer.supports_extension(ext).then(|| ext.to_string())
}
