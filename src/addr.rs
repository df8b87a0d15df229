use std::fmt::Display;

/// The port peers are expected to serve cluster traffic on.
pub const PEER_PORT: u16 = 8081;

/// Formats a raw host into the canonical peer address used everywhere else
/// in the system.
///
/// The host can be an IP or a resolvable name, whichever identity the
/// membership source advertises.
pub fn format_peer_addr(host: impl Display) -> String {
    format!("http://{}:{}", host, PEER_PORT)
}

/// Checks whether two peer lists contain the same members, ignoring the
/// order the source returned them in.
///
/// Lists are compared as multisets, so a duplicated address counts as many
/// times as it appears.
pub fn same_members(left: &[String], right: &[String]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort_unstable();
    right.sort_unstable();

    left == right
}
