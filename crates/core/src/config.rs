//! Ethernet test configuration file.
//!
//! A single line `peer_address, pass_threshold_mbps` stored under the
//! boot partition. Missing files are created with the built-in defaults
//! so a freshly flashed unit works out of the box.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::CoreError;
use crate::types::Mbps;

/// File name of the Ethernet config inside the config directory.
pub const ETHERNET_CONFIG_FILE: &str = "jig-ethernet.cfg";

/// Bandwidth peer used when no config file exists.
pub const DEFAULT_PEER_ADDRESS: &str = "192.168.20.45";

/// Minimum measured throughput counted as a pass when no config file exists.
pub const DEFAULT_PASS_THRESHOLD_MBPS: Mbps = 800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetConfig {
    pub peer_address: String,
    pub pass_threshold_mbps: Mbps,
}

impl Default for EthernetConfig {
    fn default() -> Self {
        Self {
            peer_address: DEFAULT_PEER_ADDRESS.to_string(),
            pass_threshold_mbps: DEFAULT_PASS_THRESHOLD_MBPS,
        }
    }
}

impl EthernetConfig {
    /// Parse the file contents. Blank lines and `#` comments are skipped;
    /// the first remaining line holds the two fields.
    pub fn parse(contents: &str) -> Result<Self, CoreError> {
        let line = contents
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .ok_or_else(|| CoreError::Config("no settings line".into()))?;

        let mut fields = line.split(',').map(str::trim);
        let (Some(peer), Some(threshold), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CoreError::Config(format!(
                "expected 'peer, threshold', found '{line}'"
            )));
        };

        if peer.is_empty() || peer.chars().any(char::is_whitespace) {
            return Err(CoreError::Config(format!("invalid peer address '{peer}'")));
        }
        let pass_threshold_mbps = threshold
            .parse()
            .map_err(|e| CoreError::Config(format!("invalid threshold '{threshold}': {e}")))?;

        Ok(Self {
            peer_address: peer.to_string(),
            pass_threshold_mbps,
        })
    }

    pub fn render(&self) -> String {
        format!("{}, {}\n", self.peer_address, self.pass_threshold_mbps)
    }

    /// Load the config at `path`, writing defaults first when it is absent.
    ///
    /// A present but malformed file is left untouched and the defaults are
    /// used for this run.
    pub fn load_or_init(path: &Path) -> Result<Self, CoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Config file unreadable, using defaults",
                    );
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, config.render())?;
                tracing::info!(path = %path.display(), "Wrote default config");
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }
}
