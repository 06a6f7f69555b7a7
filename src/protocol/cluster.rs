//! `CLUSTER NODES` and `CLUSTER INFO` text.
//!
//! Node record layout:
//! `<id> <ip:port@cport> <flags> <master> <ping-sent> <pong-recv> <config-epoch> <link-state> <slot> ...`

use crate::domain::{NodeRecord, NodeRole, TOTAL_SLOTS};
use crate::error::ParseError;

/// Index of the first slot token in a node record.
const SLOT_TOKENS_START: usize = 8;

/// Highest valid slot number.
const MAX_SLOT: u32 = TOTAL_SLOTS - 1;

/// Strip the cluster bus suffix: `ip:port@bus` becomes `ip:port`.
#[must_use]
pub fn normalize_address(address: &str) -> &str {
    address.split_once('@').map_or(address, |(addr, _)| addr)
}

/// Count the slots a token owns: `N` is one slot, `A-B` is inclusive.
///
/// Bracketed tokens (`[N->-id]`, `[N-<-id]`) are in-flight migrations and
/// count as zero, as does anything unparsable. Ranges are clamped to the
/// valid slot space.
fn slot_count(token: &str) -> u32 {
    if token.starts_with('[') {
        return 0;
    }
    match token.split_once('-') {
        Some((start, end)) => match (start.parse::<u32>(), end.parse::<u32>()) {
            (Ok(start), Ok(end)) if end >= start && start <= MAX_SLOT => {
                end.min(MAX_SLOT) - start + 1
            }
            _ => 0,
        },
        None => u32::from(token.parse::<u32>().is_ok_and(|slot| slot <= MAX_SLOT)),
    }
}

fn parse_node_line(line: &str) -> Option<NodeRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }

    let flags: Vec<String> = parts[2].split(',').map(String::from).collect();
    let role = if flags.iter().any(|f| f == "master") {
        NodeRole::Master
    } else {
        NodeRole::Slave
    };
    let assigned_slot_count = parts
        .iter()
        .skip(SLOT_TOKENS_START)
        .map(|token| slot_count(token))
        .fold(0, u32::saturating_add);

    Some(NodeRecord {
        id: parts[0].to_string(),
        address: normalize_address(parts[1]).to_string(),
        role,
        assigned_slot_count,
        flags,
    })
}

/// Parse a `CLUSTER NODES` reply, one record per line.
///
/// Lines with fewer than three fields are skipped.
///
/// # Errors
///
/// Returns [`ParseError::NoClusterNodes`] when no record could be parsed.
pub fn parse_cluster_nodes(text: &str) -> Result<Vec<NodeRecord>, ParseError> {
    let nodes: Vec<NodeRecord> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(parse_node_line)
        .collect();

    if nodes.is_empty() {
        return Err(ParseError::NoClusterNodes);
    }
    Ok(nodes)
}

/// Value of `cluster_state` in a `CLUSTER INFO` reply, or `""` when absent.
#[must_use]
pub fn parse_cluster_state(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("cluster_state:"))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TOTAL_SLOTS;

    const THREE_MASTERS: &str = "\
a1 10.0.0.1:7000@17000 myself,master - 0 0 1 connected 0-5460
b2 10.0.0.2:7001@17001 master - 0 1700000000000 2 connected 5461-10922
c3 10.0.0.3:7002@17002 master - 0 1700000000000 3 connected 10923-16383
d4 10.0.0.4:7003@17003 slave a1 0 1700000000000 1 connected
";

    #[test]
    fn single_master_record() {
        let nodes =
            parse_cluster_nodes("abc 127.0.0.1:7000@17000 master - 0 0 0 connected 0-5460")
                .unwrap();
        assert_eq!(nodes.len(), 1);
        let node = &nodes[0];
        assert_eq!(node.id, "abc");
        assert_eq!(node.address, "127.0.0.1:7000");
        assert_eq!(node.role, NodeRole::Master);
        assert_eq!(node.assigned_slot_count, 5461);
    }

    #[test]
    fn three_contiguous_ranges_cover_all_slots() {
        let nodes = parse_cluster_nodes(THREE_MASTERS).unwrap();
        let total: u32 = nodes
            .iter()
            .filter(|n| n.is_master())
            .map(|n| n.assigned_slot_count)
            .sum();
        assert_eq!(total, TOTAL_SLOTS);
        assert_eq!(nodes[3].role, NodeRole::Slave);
        assert_eq!(nodes[3].assigned_slot_count, 0);
    }

    #[test]
    fn single_slots_count_and_migrations_do_not() {
        let line = "e5 10.0.0.5:7000@17000 master - 0 0 4 connected 0 5 10-19 [20->-f6] [21-<-f7]";
        let nodes = parse_cluster_nodes(line).unwrap();
        assert_eq!(nodes[0].assigned_slot_count, 12);
    }

    #[test]
    fn out_of_range_slots_are_clamped() {
        let line = "e5 10.0.0.5:7000@17000 master - 0 0 4 connected 0-4294967295 4294967295 20000-30000";
        let nodes = parse_cluster_nodes(line).unwrap();
        assert_eq!(nodes[0].assigned_slot_count, TOTAL_SLOTS);
        assert_eq!(slot_count("16383-99999"), 1);
        assert_eq!(slot_count("16384"), 0);
    }

    #[test]
    fn flags_are_kept() {
        let nodes = parse_cluster_nodes(THREE_MASTERS).unwrap();
        assert_eq!(nodes[0].flags, vec!["myself".to_string(), "master".to_string()]);
    }

    #[test]
    fn address_without_bus_port_is_unchanged() {
        assert_eq!(normalize_address("10.0.0.1:6379"), "10.0.0.1:6379");
        assert_eq!(normalize_address("10.0.0.1:6379@16379"), "10.0.0.1:6379");
    }

    #[test]
    fn no_records_is_an_error() {
        assert_eq!(parse_cluster_nodes(""), Err(ParseError::NoClusterNodes));
        assert_eq!(parse_cluster_nodes("garbage\n\n"), Err(ParseError::NoClusterNodes));
    }

    #[test]
    fn cluster_state_lookup() {
        let info = "cluster_enabled:1\r\ncluster_state:ok\r\ncluster_slots_assigned:16384\r\n";
        assert_eq!(parse_cluster_state(info), "ok");
        assert_eq!(parse_cluster_state("cluster_enabled:1\n"), "");
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(
            parse_cluster_nodes(THREE_MASTERS),
            parse_cluster_nodes(THREE_MASTERS)
        );
    }
}
