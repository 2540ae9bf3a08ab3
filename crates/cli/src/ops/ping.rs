use clap::Args;
use store::StorageMode;

#[derive(Args, Debug, Clone)]
pub struct Ping;

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("state error: {0}")]
    State(#[from] crate::state::StateError),

    #[error("invalid location: {0}")]
    Location(#[from] store::ParseError),

    #[error("connection failed: {0}")]
    Connection(#[from] store::ConnectionError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ping {
    type Error = PingError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;

        match StorageMode::resolve(&state.config.location)? {
            StorageMode::Local => Ok(format!(
                "Location is local, filestore at {}",
                state.filestore().root().display()
            )),
            StorageMode::Remote(descriptor) => {
                let target = state.factory().get_or_create_target(&descriptor).await?;
                Ok(format!(
                    "Bucket '{}' is ready at {}",
                    target.bucket(),
                    state.config.s3.endpoint()
                ))
            }
        }
    }
}
