use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use store::BlobStorage;

#[derive(Args, Debug, Clone)]
pub struct Put {
    /// File to store
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

#[async_trait::async_trait]
impl crate::op::Op for Put {
    type Error = PutError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| PutError::Read(self.path.clone(), e))?;

        let identifier = state.engine().write(Bytes::from(data)).await?;
        Ok(identifier)
    }
}
