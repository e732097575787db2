pub mod bundle;
pub mod catalogue;
pub mod connection;
pub mod launcher;
pub mod settings;

pub use bundle::{Bundle, BundleIndex, BundleServerEntry, BundleUpdate, StoredServerEntry};
pub use catalogue::{
    ArgumentKind, CatalogueEntry, EnvironmentVariableSpec, Package, PackageArgumentSpec,
    RegistryKind,
};
pub use connection::{Connection, ConnectionIndex, ConnectionUpdate};
pub use launcher::LauncherConfig;
pub use settings::{ExportFormat, Settings};
