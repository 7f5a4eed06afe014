//! `jig-core`: hardware-independent logic of the JIG device-check agent.
//!
//! Wire codec, action vocabulary, device state, configuration file and
//! retry policy. Nothing in this crate touches real hardware, so all of
//! it is testable on a development machine.

pub mod action;
pub mod config;
pub mod error;
pub mod iperf;
pub mod mac;
pub mod protocol;
pub mod retry;
pub mod state;
pub mod types;
