//! Parsing of `iperf3` client output.
//!
//! The summary of a client run ends with two lines, one per end of the
//! session:
//!
//! ```text
//! [  5]   0.00-1.00   sec   112 MBytes   941 Mbits/sec    0             sender
//! [  5]   0.00-1.04   sec   110 MBytes   887 Mbits/sec                  receiver
//! ```
//!
//! The bitrate is the value following the transfer size, converted to
//! whole Mbit/s.

use crate::action::ThroughputRole;
use crate::types::Mbps;

/// Extract the bitrate reported for `role`, or 0 when no summary line
/// for that role is present (peer busy, connection refused, ...).
pub fn parse_bitrate(output: &str, role: ThroughputRole) -> Mbps {
    output
        .lines()
        .filter(|line| line.split_whitespace().any(|tok| tok == role.marker()))
        .filter_map(line_bitrate)
        .last()
        .unwrap_or(0)
}

fn line_bitrate(line: &str) -> Option<Mbps> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let transfer = tokens.iter().position(|tok| tok.ends_with("Bytes"))?;
    let value: f64 = tokens.get(transfer + 1)?.parse().ok()?;
    let scale = match *tokens.get(transfer + 2)? {
        "Gbits/sec" => 1000.0,
        "Mbits/sec" => 1.0,
        "Kbits/sec" => 0.001,
        "bits/sec" => 0.000_001,
        _ => return None,
    };
    let mbps = value * scale;
    if !mbps.is_finite() || mbps < 0.0 {
        return None;
    }
    Some(mbps.floor() as Mbps)
}
