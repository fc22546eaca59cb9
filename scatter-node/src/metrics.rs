//! Prometheus metrics for the block node

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Metric names as constants
pub mod names {
    pub const BLOCKS_STORED: &str = "scatter_node_blocks_stored_total";
    pub const BLOCKS_SERVED: &str = "scatter_node_blocks_served_total";
    pub const BLOCKS_DELETED: &str = "scatter_node_blocks_deleted_total";
    pub const BLOCKS_MISSING: &str = "scatter_node_blocks_missing_total";

    pub const BYTES_IN: &str = "scatter_node_bytes_in_total";
    pub const BYTES_OUT: &str = "scatter_node_bytes_out_total";

    pub const AUTH_REJECTED: &str = "scatter_node_auth_rejected_total";
    pub const STORAGE_ERRORS: &str = "scatter_node_storage_errors_total";

    pub const NODE_UP: &str = "scatter_node_up";
}

/// Install the global Prometheus recorder and describe every metric.
///
/// Can only succeed once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!(names::BLOCKS_STORED, "Blocks written to local storage");
    describe_counter!(names::BLOCKS_SERVED, "Blocks returned to readers");
    describe_counter!(names::BLOCKS_DELETED, "Blocks removed on request");
    describe_counter!(
        names::BLOCKS_MISSING,
        "Read or delete requests for paths with no block"
    );
    describe_counter!(names::BYTES_IN, "Block payload bytes received");
    describe_counter!(names::BYTES_OUT, "Block payload bytes sent");
    describe_counter!(
        names::AUTH_REJECTED,
        "Write requests rejected for a missing or wrong API key"
    );
    describe_counter!(names::STORAGE_ERRORS, "Local filesystem failures");
    describe_gauge!(names::NODE_UP, "Whether the node is up (1) or down (0)");

    gauge!(names::NODE_UP).set(1.0);
    Ok(handle)
}

/// Recording helpers; no-ops when no recorder is installed
pub struct NodeMetrics;

impl NodeMetrics {
    pub fn record_store(size: usize) {
        counter!(names::BLOCKS_STORED).increment(1);
        counter!(names::BYTES_IN).increment(size as u64);
    }

    pub fn record_serve(size: u64) {
        counter!(names::BLOCKS_SERVED).increment(1);
        counter!(names::BYTES_OUT).increment(size);
    }

    pub fn record_delete() {
        counter!(names::BLOCKS_DELETED).increment(1);
    }

    pub fn record_missing() {
        counter!(names::BLOCKS_MISSING).increment(1);
    }

    pub fn record_auth_rejected() {
        counter!(names::AUTH_REJECTED).increment(1);
    }

    pub fn record_storage_error() {
        counter!(names::STORAGE_ERRORS).increment(1);
    }
}
