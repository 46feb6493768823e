use colored::Colorize;
use importcost_annotate::{DecorationSpec, LabelStyle};
use log::debug;
use serde::Serialize;
use std::io::{self, Write};

use crate::host::BufferEditor;

/// Annotations captured for one file once its analysis went idle.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub decorations: Vec<DecorationSpec>,
}

pub fn print_file_tree<W: Write>(writer: &mut W, editor: &BufferEditor) -> io::Result<()> {
    let decorations = editor.decorations();
    debug!("Printing {} annotations for {}", decorations.len(), editor.file_path().display());

    writeln!(writer, "{}", editor.file_path().display().to_string().blue())?;
    if decorations.is_empty() {
        writeln!(writer, "{}  {}", "└──".dimmed(), "no package imports".dimmed())?;
        writeln!(writer)?;
        return Ok(());
    }

    let width = decorations.iter().map(|d| d.row + 1).max().unwrap_or(1).to_string().len();
    for (idx, decoration) in decorations.iter().enumerate() {
        let is_last = idx == decorations.len() - 1;
        let prefix = if is_last { "└──" } else { "├──" };
        let code = editor.line(decoration.row).unwrap_or_default().trim_end();

        writeln!(
            writer,
            "{}  {:>width$}  {}  {}",
            prefix.dimmed(),
            decoration.row + 1,
            code,
            styled_label(decoration),
            width = width
        )?;
    }

    writeln!(writer)?;
    Ok(())
}

pub fn print_json<W: Write>(writer: &mut W, reports: &[FileReport]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, reports)?;
    writeln!(writer)?;
    writer.flush()
}

fn styled_label(decoration: &DecorationSpec) -> String {
    let label = decoration.label.as_str();
    match decoration.style {
        LabelStyle::Pending => label.dimmed().to_string(),
        LabelStyle::Small => label.green().to_string(),
        LabelStyle::Medium => label.yellow().to_string(),
        LabelStyle::Large => label.red().bold().to_string(),
    }
}
