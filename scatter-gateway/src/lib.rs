//! Scatter Gateway
//!
//! Provides:
//! - Distribution of uploaded files as fixed-size blocks across block nodes
//! - Ordered, integrity-checked reassembly of distributed files
//! - File deletion with best-effort remote cleanup
//! - Machine registry and gateway settings
//! - JSON HTTP API over all of the above

pub mod api;
pub mod deletion;
pub mod distribution;
pub mod error;
pub mod node_client;
pub mod reassembly;
pub mod registry;
pub mod settings;
pub mod state;

#[cfg(test)]
mod testing;

pub use api::{router, ApiError, FileDetails};
pub use deletion::{delete_file, DeletionReport};
pub use distribution::{DistributionEngine, DistributionReceipt};
pub use error::{EngineError, EngineResult};
pub use node_client::{BlockTransport, HttpBlockClient, NodeClientError, TransferConfig};
pub use reassembly::{ReassembledFile, ReassemblyEngine};
pub use registry::{MachineRegistry, MachineStatus};
pub use settings::SettingsService;
pub use state::{AppState, GatewayConfig};

/// Reduce a user-supplied file name to a safe basename
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\my file.txt"), "my_file.txt");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }
}
