//! `jig-agent` library crate.
//!
//! Hardware collaborators, the Ethernet device group, the dispatcher and
//! the serial request loop. Re-exported for integration testing; the
//! binary entrypoint lives in `main.rs`.

pub mod dispatcher;
pub mod error;
pub mod ethernet;
pub mod hardware;
pub mod link;
pub mod provisioning;
pub mod serial;
pub mod settings;
pub mod throughput;
