pub mod init;
pub mod scan;

pub use init::run_init;
pub use scan::{run_scan, ScanRunOptions, ScanStatus};
