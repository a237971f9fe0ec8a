pub mod relaunch;

pub use relaunch::{ProcessRelauncher, Relauncher};
