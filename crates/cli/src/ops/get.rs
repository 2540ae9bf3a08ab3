use std::path::PathBuf;

use clap::Args;
use store::BlobStorage;

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Identifier returned by `put` (or a catalogued stored key)
    pub identifier: String,

    /// Write the blob to this file instead of printing it
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Get {
    type Error = GetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let data = state
            .engine()
            .read(&self.identifier)
            .await?
            .ok_or_else(|| GetError::NotFound(self.identifier.clone()))?;

        if let Some(out) = &self.out {
            tokio::fs::write(out, &data)
                .await
                .map_err(|e| GetError::Write(out.clone(), e))?;
            return Ok(format!("Wrote {} bytes to {}", data.len(), out.display()));
        }

        // Show text as is, binary as hex
        match std::str::from_utf8(&data) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                let hex = data
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                Ok(format!(
                    "Size: {} bytes\nBinary content (hex): {}",
                    data.len(),
                    hex
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Op, OpContext};
    use crate::ops::Put;
    use crate::state::AppState;

    #[tokio::test]
    async fn test_put_then_get_on_local_filestore() {
        let temp_dir = tempfile::tempdir().unwrap();
        let stash_dir = temp_dir.path().join("stash");
        AppState::init(Some(stash_dir.clone()), None).unwrap();
        let ctx = OpContext::new(Some(stash_dir));

        let file = temp_dir.path().join("note.txt");
        std::fs::write(&file, "remember the milk").unwrap();

        let identifier = Put { path: file }.execute(&ctx).await.unwrap();
        let output = Get {
            identifier: identifier.clone(),
            out: None,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(output, "remember the milk");

        let missing = Get {
            identifier: "00/0000".to_string(),
            out: None,
        }
        .execute(&ctx)
        .await;
        assert!(matches!(missing, Err(GetError::NotFound(_))));
    }
}
