use importcost_core::{PackageInfo, PackageStatus};
use log::trace;

use crate::{
    config::{Config, SizeUnits},
    host::{DecorationSpec, LabelStyle, TextEditor},
};

const KB: u64 = 1024;

/// Build the label for `info`, anchored at the current end of its line.
///
/// Returns `None` for packages with no label to show: line 0 or a failed status.
pub fn decoration_for(
    editor: &dyn TextEditor,
    info: &PackageInfo,
    config: &Config,
) -> Option<DecorationSpec> {
    let row = info.line.checked_sub(1)?;
    let (label, style) = label_for(info, config)?;
    let column = editor.line_length_for_row(row);
    trace!("Anchoring '{}' at {}:{}", info.name, row, column);
    Some(DecorationSpec { package_name: info.name.clone(), row, column, label, style })
}

pub fn label_for(info: &PackageInfo, config: &Config) -> Option<(String, LabelStyle)> {
    match (info.status, info.size) {
        (PackageStatus::Error, _) => None,
        (PackageStatus::Calculated, Some(size)) => {
            Some((format_size(size, config.units), style_for(size, config)))
        }
        _ => Some((config.pending_label.clone(), LabelStyle::Pending)),
    }
}

pub fn format_size(bytes: u64, units: SizeUnits) -> String {
    match units {
        SizeUnits::Bytes => format!("{} B", bytes),
        SizeUnits::Kilobytes if bytes < KB => format!("{} B", bytes),
        SizeUnits::Kilobytes => format!("{:.1} KB", bytes as f64 / KB as f64),
    }
}

fn style_for(bytes: u64, config: &Config) -> LabelStyle {
    if bytes < config.small_package_kb * KB {
        LabelStyle::Small
    } else if bytes < config.medium_package_kb * KB {
        LabelStyle::Medium
    } else {
        LabelStyle::Large
    }
}
