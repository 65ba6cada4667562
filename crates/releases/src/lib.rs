//! Release management for over-the-air JS bundles: ordering of native app
//! versions, bundle sequencing per release line, rollback, the client update
//! decision and rollout telemetry.

pub mod bundles;
pub mod catalog;
pub mod decision;
pub mod error;
pub mod registry;
pub mod rollback;
pub mod sequencer;
pub mod telemetry;
pub mod version_number;

pub use bundles::BundleAdmin;
pub use catalog::Catalog;
pub use decision::UpdateDecisionEngine;
pub use error::ReleaseError;
pub use registry::VersionRegistry;
pub use rollback::RollbackEngine;
pub use sequencer::BundleSequencer;
pub use telemetry::RolloutTelemetry;
