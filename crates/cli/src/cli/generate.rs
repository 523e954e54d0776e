use clap::Args;
use std::path::PathBuf;

use crate::cli::{OutputFlags, generate_file, run_cli_async};
use crate::config::Config;

#[derive(Args, Debug, Clone)]
pub struct GenArgs {
    #[arg(long = "in", value_name = "FILE", help = "The .d.ts document to generate from")]
    pub input: PathBuf,
    #[command(flatten)]
    pub options: OutputFlags,
}

pub async fn run(args: GenArgs) -> i32 {
    run_cli_async(|| async {
        let config = Config::load_from_cwd()?;
        run_inner(args, &config).await
    })
    .await
}

pub(crate) async fn run_inner(args: GenArgs, config: &Config) -> Result<(), String> {
    let settings = args.options.settings(&config.generate)?;
    let written = generate_file(&args.input, &settings).await?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gen_writes_api_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("calc.d.ts");
        std::fs::write(
            &input,
            "/*\nid: acme/calc\ntype: api\n*/\nexport default interface Calc {\n  add(a: number, b: number): Promise<number>\n}\n",
        )
        .unwrap();
        let out = dir.path().join("out");
        let args = GenArgs {
            input,
            options: OutputFlags {
                out: Some(out.clone()),
                env: Some("node-userland".into()),
            },
        };
        run_inner(args, &Config::default()).await.unwrap();

        let client = std::fs::read_to_string(out.join("acme/calc.ts")).unwrap();
        assert!(client.contains(" * env=node-userland\n"));
        assert!(client.contains("export default class CalcClient extends AtekRpcClient {"));
        assert!(out.join("acme/calc.server.ts").exists());
    }

    #[tokio::test]
    async fn test_gen_reports_document_errors() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.d.ts");
        std::fs::write(&input, "/*\nid: acme/bad\ntype: api\n*/\ninterface NoDefault {}\n").unwrap();
        let args = GenArgs {
            input,
            options: OutputFlags {
                out: Some(dir.path().join("out")),
                env: None,
            },
        };
        let err = run_inner(args, &Config::default()).await.unwrap_err();
        assert!(err.starts_with("acme/bad: validation error"));
        assert!(!dir.path().join("out").exists());
    }
}
