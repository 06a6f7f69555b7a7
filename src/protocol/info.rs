//! Key-value `INFO` status text.

use std::collections::HashMap;

use crate::domain::{format_uptime, KeyspaceStats, RedisInfo};

/// Split status text into lines, accepting both `\r\n` and `\n` endings.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#'))
}

fn int(value: &str) -> i64 {
    value.parse().unwrap_or_default()
}

fn float(value: &str) -> f64 {
    value.parse().unwrap_or_default()
}

/// `db0`, `db15`, ...
fn is_keyspace_key(key: &str) -> bool {
    key.strip_prefix("db")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_keyspace(value: &str) -> KeyspaceStats {
    let mut stats = KeyspaceStats::default();
    for pair in value.split(',') {
        let Some((k, v)) = pair.split_once('=') else {
            continue;
        };
        match k.trim() {
            "keys" => stats.keys = int(v.trim()),
            "expires" => stats.expires = int(v.trim()),
            "avg_ttl" => stats.avg_ttl = int(v.trim()),
            _ => {}
        }
    }
    stats
}

/// Parse a full `INFO` reply into a [`RedisInfo`].
///
/// Unknown keys are ignored; a malformed numeric value leaves its field at
/// zero. Memory usage percent and hit rate are derived after the scan.
#[must_use]
pub fn parse_status_text(text: &str) -> RedisInfo {
    let mut info = RedisInfo::default();

    for line in lines(text) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "role" => info.role = value.to_string(),
            "connected_clients" => info.connected_clients = int(value),
            "blocked_clients" => info.blocked_clients = int(value),
            "used_memory" => info.used_memory = int(value),
            "used_memory_human" => info.used_memory_human = value.to_string(),
            "used_memory_rss" => info.used_memory_rss = int(value),
            "used_memory_peak" => info.used_memory_peak = int(value),
            "used_memory_peak_human" => info.used_memory_peak_human = value.to_string(),
            "maxmemory" => info.max_memory = int(value),
            "mem_fragmentation_ratio" => info.fragmentation_ratio = float(value),
            "used_cpu_user" => info.cpu_usage = float(value),
            "used_cpu_sys" => info.cpu_usage_sys = float(value),
            "total_commands_processed" => info.total_commands = int(value),
            "instantaneous_ops_per_sec" => info.instantaneous_ops_per_sec = int(value),
            "keyspace_hits" => info.keyspace_hits = int(value),
            "keyspace_misses" => info.keyspace_misses = int(value),
            "evicted_keys" => info.evicted_keys = int(value),
            "expired_keys" => info.expired_keys = int(value),
            "total_net_input_bytes" => info.net_input_bytes = int(value),
            "total_net_output_bytes" => info.net_output_bytes = int(value),
            "rejected_connections" => info.rejected_connections = int(value),
            "uptime_in_seconds" => info.uptime = int(value),
            "connected_slaves" => info.connected_slaves = int(value),
            "master_repl_offset" => info.master_repl_offset = int(value),
            "slave_repl_offset" => info.replica_offset = int(value),
            "loading" => info.loading = value == "1",
            "rdb_last_save_time" => info.rdb_last_save_time = int(value),
            "rdb_changes_since_last_save" => info.rdb_changes_since_last_save = int(value),
            "aof_enabled" => info.aof_enabled = value == "1",
            k if is_keyspace_key(k) => {
                info.keyspace.insert(k.to_string(), parse_keyspace(value));
            }
            _ => {}
        }
    }

    info.uptime_human = format_uptime(info.uptime);
    info.total_keys = info.keyspace.values().map(|db| db.keys).sum();
    info.database_count = info.keyspace.len();

    if info.max_memory > 0 {
        info.memory_usage_percent = info.used_memory as f64 / info.max_memory as f64 * 100.0;
    }
    let lookups = info.keyspace_hits + info.keyspace_misses;
    if lookups > 0 {
        info.hit_rate = info.keyspace_hits as f64 / lookups as f64 * 100.0;
    }

    info
}

/// Raw `key -> value` map of a status text section. Later keys win.
#[must_use]
pub fn parse_info_map(text: &str) -> HashMap<String, String> {
    lines(text)
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}
