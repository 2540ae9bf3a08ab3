//! Shared setup for the attachment store integration tests
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::RwLock;
use stash_store::{BlobEngine, EngineConfig, LocalFilestore, MemoryConnector, TargetFactory};
use tempfile::TempDir;

pub const NAMESPACE: &str = "db1";
pub const LOCATION: &str = "s3://AKIA123:secret@attachments";

/// Everything a test needs: the engine, the pieces it was built from, and
/// the temp dir backing the local filestore.
pub struct TestEnv {
    pub engine: BlobEngine,
    pub connector: Arc<MemoryConnector>,
    pub factory: TargetFactory,
    pub filestore: Arc<LocalFilestore>,
    pub location: Arc<RwLock<String>>,
    pub temp_dir: TempDir,
}

/// Engine pointed at an in-memory bucket, with a temp-dir filestore behind it.
pub fn setup_test_env(location: &str) -> TestEnv {
    setup_test_env_with(location, EngineConfig::new(NAMESPACE))
}

pub fn setup_test_env_with(location: &str, config: EngineConfig) -> TestEnv {
    init_tracing();

    let temp_dir = TempDir::new().unwrap();
    let connector = Arc::new(MemoryConnector::new());
    let factory = TargetFactory::new(connector.clone());
    let filestore = Arc::new(LocalFilestore::new(temp_dir.path(), NAMESPACE));
    let location = Arc::new(RwLock::new(location.to_string()));

    let engine = BlobEngine::new(config, location.clone(), factory.clone(), filestore.clone());

    TestEnv {
        engine,
        connector,
        factory,
        filestore,
        location,
        temp_dir,
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
