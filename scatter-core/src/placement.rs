//! Block placement
//!
//! Placement is deterministic: block `i` goes to `machines[i mod M]` and is
//! written at `{machine storage path}/{file hash}_block_{i}`. Re-distributing
//! identical content to the same machine set reuses the same remote paths.

/// Index of the machine that receives `block_number`
///
/// # Panics
///
/// Panics if `machine_count` is zero. Callers check for an empty machine set
/// before placing anything.
pub fn assign_round_robin(block_number: u32, machine_count: usize) -> usize {
    assert!(machine_count > 0, "no machines to assign to");
    block_number as usize % machine_count
}

/// Remote path for block `block_number` of the file hashed to `file_hash`
pub fn storage_path(machine_storage_path: &str, file_hash: &str, block_number: u32) -> String {
    let base = machine_storage_path.trim_end_matches('/');
    format!("{}/{}_block_{}", base, file_hash, block_number)
}

/// Prefix `http://` onto a node address that carries no scheme
pub fn normalize_machine_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
