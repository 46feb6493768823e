mod host;
mod reporter;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use importcost_annotate::{AnnotationController, Config};
use importcost_core::{CostAnalyzer, FsCostAnalyzer, find_project_root};
use log::{debug, info, warn};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::host::{BufferEditor, ConsoleWorkspace};
use crate::reporter::{FileReport, print_file_tree, print_json};

#[derive(Parser)]
#[command(name = "importcost")]
#[command(about = "Show the size of imported packages inline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Annotate the package imports of JavaScript/TypeScript files with their size
    Annotate(AnnotateArgs),
}

#[derive(Debug, Args)]
struct AnnotateArgs {
    /// Files to annotate, focused one after another
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory where the node_modules search stops (defaults to the first file's project root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Print a JSON report instead of a tree
    #[arg(long)]
    json: bool,

    /// Give up waiting on a file's analysis after this many milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    #[command(flatten)]
    config: Config,
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    match cli.command {
        Commands::Annotate(args) => annotate(args, &mut stdout),
    }
}

fn annotate<W: Write>(args: AnnotateArgs, stdout: &mut W) -> Result<()> {
    let start = Instant::now();

    let editors = args
        .files
        .iter()
        .map(|file| BufferEditor::open(file).map(Rc::new))
        .collect::<Result<Vec<_>>>()?;
    let Some(first) = editors.first() else {
        bail!("No files to annotate");
    };

    let root = match args.root {
        Some(root) => Some(root.canonicalize().unwrap_or(root)),
        None => first.file_path().parent().and_then(|dir| find_project_root(dir).ok()),
    };
    info!("Resolving packages up to {:?} (using {} threads)", root, rayon::current_num_threads());

    let workspace = ConsoleWorkspace::new(editors);
    let mut controller = AnnotationController::new(FsCostAnalyzer::new(root), args.config);
    let timeout = Duration::from_millis(args.timeout_ms);
    let mut reports = Vec::new();

    controller.activate(&workspace);
    for (index, editor) in workspace.editors().iter().enumerate() {
        if let Some(event) = workspace.focus(index) {
            controller.handle_host_event(&workspace, event);
        }
        wait_until_idle(&mut controller, timeout);

        if args.json {
            reports.push(FileReport {
                path: editor.file_path().display().to_string(),
                decorations: editor.decorations(),
            });
        } else {
            print_file_tree(stdout, editor)?;
        }
    }
    controller.deactivate();

    if args.json {
        print_json(stdout, &reports)?;
    } else {
        writeln!(
            stdout,
            "{} Finished in {}ms on {} files.",
            "●".bright_blue(),
            start.elapsed().as_millis().to_string().cyan(),
            workspace.editors().len().to_string().cyan()
        )?;
    }
    stdout.flush()?;
    Ok(())
}

fn wait_until_idle<A: CostAnalyzer>(controller: &mut AnnotationController<A>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    controller.pump();
    while !controller.is_idle() {
        if Instant::now() >= deadline {
            warn!(
                "Analysis still running after {}ms, reporting partial results",
                timeout.as_millis()
            );
            return;
        }
        controller.pump_timeout(POLL_INTERVAL);
    }
}
