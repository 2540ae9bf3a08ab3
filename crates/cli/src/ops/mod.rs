pub mod audit;
pub mod get;
pub mod init;
pub mod migrate;
pub mod ping;
pub mod put;
pub mod version;

pub use audit::Audit;
pub use get::Get;
pub use init::Init;
pub use migrate::Migrate;
pub use ping::Ping;
pub use put::Put;
pub use version::Version;
