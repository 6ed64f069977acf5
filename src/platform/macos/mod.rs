//! macOS implementations of the counter source, topology provider and auxiliary readers.

mod bindings;
mod cf;
mod ioreport;
mod smc;
mod sysctl;
mod system;
mod topology;

pub use ioreport::{IoReportSnapshot, IoReportSource};
pub use smc::SmcConnection;
pub use system::SystemReaders;
pub use topology::IoKitTopology;
