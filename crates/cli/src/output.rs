//! Writing artifacts to disk.

use std::path::{Path, PathBuf};

use tracing::info;
use tsgen_core::Artifact;

/// Writes every artifact to `<out>/<domain>/<name>`, creating directories,
/// and returns the written paths.
pub async fn write_artifacts(
    out: &Path,
    domain: &str,
    artifacts: &[Artifact],
) -> Result<Vec<PathBuf>, String> {
    let dir = out.join(domain);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|err| format!("Failed to create {}: {err}", dir.display()))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.name);
        tokio::fs::write(&path, &artifact.text)
            .await
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        info!(path = %path.display(), "Wrote artifact.");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_under_domain_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen");
        let artifacts = vec![
            Artifact {
                name: "chat.ts".into(),
                text: "client".into(),
            },
            Artifact {
                name: "chat.server.ts".into(),
                text: "server".into(),
            },
        ];
        let written = write_artifacts(&out, "acme", &artifacts).await.unwrap();
        assert_eq!(
            written,
            vec![out.join("acme/chat.ts"), out.join("acme/chat.server.ts")]
        );
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "server");
    }
}
