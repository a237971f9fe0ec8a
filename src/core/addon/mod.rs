pub mod deploy;
pub mod tracker;
pub mod version_file;

pub use deploy::deploy_archive;
pub use tracker::{AddonOutcome, AddonTracker};
pub use version_file::{read_version_record, write_version_record, AddonVersionRecord, VERSION_FILE};
