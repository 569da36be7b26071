pub mod discovery;
pub mod migrator;
pub mod waiter;

#[cfg(test)]
pub(crate) mod mock;

pub use crate::domain::model::{Instance, MigrationReport, Volume, VolumeModification};
pub use crate::domain::ports::{CloudProvider, ProviderResult};
pub use crate::utils::error::Result;
