use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::cli::{OutputFlags, generate_file, run_cli_async};
use crate::config::Config;

const DOCUMENT_SUFFIX: &str = ".d.ts";

#[derive(Args, Debug, Clone)]
pub struct GenFolderArgs {
    #[arg(long = "in", value_name = "DIR", help = "Folder containing .d.ts documents")]
    pub input: PathBuf,
    #[command(flatten)]
    pub options: OutputFlags,
    #[arg(
        long = "skip-errors",
        help = "Log failing documents and keep going instead of aborting"
    )]
    pub skip_errors: bool,
}

pub async fn run(args: GenFolderArgs) -> i32 {
    run_cli_async(|| async {
        let config = Config::load_from_cwd()?;
        run_inner(args, &config).await
    })
    .await
}

pub(crate) async fn run_inner(args: GenFolderArgs, config: &Config) -> Result<(), String> {
    let settings = args.options.settings(&config.generate)?;
    let skip_errors = args.skip_errors || config.generate.skip_errors.unwrap_or(false);

    let documents = list_documents(&args.input)?;
    info!(folder = %args.input.display(), count = documents.len(), "Generating folder.");

    let mut failed = 0usize;
    for path in &documents {
        match generate_file(path, &settings).await {
            Ok(written) => {
                for path in written {
                    println!("{}", path.display());
                }
            }
            Err(err) if skip_errors => {
                warn!(path = %path.display(), error = %err, "Skipping document.");
                failed += 1;
            }
            Err(err) => return Err(format!("{}: {err}", path.display())),
        }
    }

    if failed > 0 {
        eprintln!("Skipped {failed} of {} documents", documents.len());
    }
    Ok(())
}

/// Top-level `.d.ts` files in `dir`, in file name order.
fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| format!("Failed to read {}: {err}", dir.display()))?;
        let is_document = entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(DOCUMENT_SUFFIX));
        if is_document {
            documents.push(entry.into_path());
        }
    }
    Ok(documents)
}
