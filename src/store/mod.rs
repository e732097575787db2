pub mod bundles;
pub mod cache;
pub mod catalogue;
pub mod connections;
pub mod credentials;
pub mod crypto;
pub mod persist;
pub mod workspace;

pub use bundles::BundleStore;
pub use cache::CacheStore;
pub use catalogue::CatalogueStore;
pub use connections::ConnectionRegistry;
pub use credentials::CredentialStore;
pub use workspace::Workspace;
