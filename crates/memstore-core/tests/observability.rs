//! Observability tests for memstore record lifecycle tracing.
//!
//! These tests verify that structured tracing events are emitted without
//! panicking for key lifecycle events: capture, promotion, deprecation,
//! quarantine, conflict resolution and storage retries.

use memstore_core::obs::{
    emit_audit_append_failed, emit_conflict_resolved, emit_record_captured,
    emit_record_deprecated, emit_record_promoted, emit_record_quarantined, emit_record_skipped,
    emit_secret_warning, emit_storage_retry, record_span,
};
use memstore_core::{CaptureRequest, MemoryStore, PromoteRequest, Scope, ScopeType};
use tracing_test::traced_test;

/// Test: emit_record_captured creates an info-level event
#[traced_test]
#[test]
fn test_emit_record_captured() {
    emit_record_captured("mem_lx2k9a_1f2e3d4c", "project/3f2a", "pkg.manager", "E0");
}

/// Test: emit_record_promoted creates an info-level event
#[traced_test]
#[test]
fn test_emit_record_promoted() {
    emit_record_promoted("mem_lx2k9a_1f2e3d4c", "E0", "E2", false);
}

#[traced_test]
#[test]
fn test_emit_record_deprecated() {
    emit_record_deprecated("mem_lx2k9a_1f2e3d4c", "superseded");
}

/// Test: quarantine events are warn-level and name the detector, not the match
#[traced_test]
#[test]
fn test_emit_record_quarantined() {
    emit_record_quarantined("mem_lx2k9a_1f2e3d4c", Some("AWS access key"));
    emit_record_quarantined("mem_lx2k9a_1f2e3d4c", None);
}

#[traced_test]
#[test]
fn test_emit_secret_warning_takes_masked_preview() {
    let masked = memstore_core::mask_secret("password=hunter2hunter2");
    emit_secret_warning("Secret-looking assignment", &masked);
}

#[traced_test]
#[test]
fn test_emit_conflict_resolved() {
    emit_conflict_resolved("pkg.manager", "mem_lx2k9a_1f2e3d4c", 3, "highest evidence level");
}

/// Test: warn-level failure events accept any Display error
#[traced_test]
#[test]
fn test_emit_failure_events() {
    let error_msg = "resource busy";
    emit_record_skipped("/store/records/project/x/mem_1_aabbccdd.json", &error_msg);
    emit_audit_append_failed("mem_lx2k9a_1f2e3d4c", &error_msg);
    emit_storage_retry("write_record", 1, 100, &error_msg);
}

/// Test: record_span can be entered and dropped
#[traced_test]
#[test]
fn test_record_span_enter() {
    let span = record_span("mem_lx2k9a_1f2e3d4c", "promote").entered();
    drop(span);
}

/// Test: a full capture + promote cycle runs under a tracing subscriber
#[traced_test]
#[tokio::test]
async fn test_store_lifecycle_emits_events() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::init(dir.path().join(".memstore"))
        .await
        .expect("init store");
    let scope = Scope::resolve(ScopeType::Project, "github.com/org/repo");

    let captured = store
        .capture(&scope, CaptureRequest::new("pkg.manager", "use pnpm"))
        .await
        .expect("capture");
    let promotion = store
        .promote(
            &scope,
            PromoteRequest::new(captured.record.id.as_str(), "verified in CI"),
        )
        .await
        .expect("promote");

    assert_eq!(promotion.record.id, captured.record.id);
}
