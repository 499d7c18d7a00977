//! Structured observability hooks for record lifecycle events.
//!
//! - `record_span` for record-scoped spans
//! - one `emit_*` function per lifecycle event
//!
//! Content is never logged. Anything that might echo a secret must be
//! masked before it reaches these functions.

use std::fmt::Display;

use tracing::{info, warn, Span};

/// Record-scoped span, attached to async store operations with
/// `tracing::Instrument`.
///
/// ```ignore
/// store.promote(&scope, req).instrument(record_span("mem_lx2k9a_1f2e3d4c", "promote"))
/// ```
pub fn record_span(record_id: &str, operation: &str) -> Span {
    tracing::info_span!("memstore.record", record_id = %record_id, op = %operation)
}

pub fn emit_record_captured(record_id: &str, scope: &str, conflict_key: &str, evidence: &str) {
    info!(
        event = "record.captured",
        record_id = %record_id,
        scope = %scope,
        conflict_key = %conflict_key,
        evidence = %evidence,
    );
}

pub fn emit_record_promoted(record_id: &str, from: &str, to: &str, constitution_approved: bool) {
    info!(
        event = "record.promoted",
        record_id = %record_id,
        from = %from,
        to = %to,
        constitution_approved = constitution_approved,
    );
}

pub fn emit_record_deprecated(record_id: &str, reason: &str) {
    info!(event = "record.deprecated", record_id = %record_id, reason = %reason);
}

/// `pattern` is the detector name, never the matched text.
pub fn emit_record_quarantined(record_id: &str, pattern: Option<&str>) {
    warn!(
        event = "record.quarantined",
        record_id = %record_id,
        pattern = pattern.unwrap_or("manual"),
    );
}

pub fn emit_secret_warning(pattern: &str, masked: &str) {
    warn!(event = "scan.warning", pattern = %pattern, preview = %masked);
}

pub fn emit_conflict_resolved(conflict_key: &str, winner: &str, candidates: usize, reason: &str) {
    info!(
        event = "conflict.resolved",
        conflict_key = %conflict_key,
        winner = %winner,
        candidates = candidates,
        reason = %reason,
    );
}

pub fn emit_record_skipped(path: &str, error: &dyn Display) {
    warn!(event = "record.skipped", path = %path, error = %error);
}

pub fn emit_audit_append_failed(record_id: &str, error: &dyn Display) {
    warn!(event = "audit.append_failed", record_id = %record_id, error = %error);
}

pub fn emit_storage_retry(op: &str, attempt: u32, delay_ms: u64, error: &dyn Display) {
    warn!(
        event = "storage.retry",
        op = %op,
        attempt = attempt,
        delay_ms = delay_ms,
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_promoted_event_fields() {
        emit_record_promoted("mem_lx2k9a_1f2e3d4c", "E0", "E2", true);
        assert!(logs_contain("record.promoted"));
        assert!(logs_contain("mem_lx2k9a_1f2e3d4c"));
        assert!(logs_contain("constitution_approved=true"));
    }

    #[traced_test]
    #[test]
    fn test_manual_quarantine_is_labelled() {
        emit_record_quarantined("mem_lx2k9a_1f2e3d4c", None);
        assert!(logs_contain("manual"));
    }

    #[test]
    fn test_record_span_create() {
        let _entered = record_span("mem_lx2k9a_1f2e3d4c", "capture").entered();
    }
}
