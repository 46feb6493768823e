use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SizeUnits {
    /// Exact byte counts, e.g. "24000 B"
    Bytes,
    /// 1024-based kilobytes with one decimal, e.g. "23.4 KB"
    Kilobytes,
}

/// How import cost labels are rendered.
#[derive(Debug, Clone, Parser)]
#[command(name = "import-cost")]
pub struct Config {
    /// Packages below this size (KB) are labelled small
    #[arg(long, default_value = "50")]
    pub small_package_kb: u64,

    /// Packages below this size (KB) are labelled medium, anything larger is large
    #[arg(long, default_value = "100")]
    pub medium_package_kb: u64,

    /// Units used for calculated sizes
    #[arg(long, value_enum, default_value_t = SizeUnits::Kilobytes)]
    pub units: SizeUnits,

    /// Label shown while a package is still being costed
    #[arg(long, default_value = "Calculating...")]
    pub pending_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            small_package_kb: 50,
            medium_package_kb: 100,
            units: SizeUnits::Kilobytes,
            pending_label: "Calculating...".to_string(),
        }
    }
}
