//! Integration tests for the item list manager
//!
//! These tests verify the subscription lifecycle, snapshot policy, and
//! mutation semantics against the in-memory backend. The service wiring is
//! exactly what the CLI uses; only the backend is in-process.

use std::sync::Arc;

use taskline_core::adapters::memory::MemoryBackend;
use taskline_core::config::Config;
use taskline_core::services::ItemListManager;
use taskline_core::{Identity, IdentityProvider, ItemFilter, TasklineContext};

// ============================================================================
// Test Helpers
// ============================================================================

fn demo_context() -> (Arc<MemoryBackend>, TasklineContext) {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = TasklineContext::with_backends(Config::default(), backend.clone(), backend.clone());
    (backend, ctx)
}

async fn signed_in(backend: &Arc<MemoryBackend>, email: &str) -> Identity {
    backend
        .create_credential(email, "hunter22")
        .await
        .expect("signup")
}

/// Bind a manager to the identity and consume the initial snapshot.
async fn bound_manager(ctx: &TasklineContext, identity: &Identity) -> ItemListManager {
    let mut manager = ctx.list_manager();
    manager.bind(Some(identity));
    assert!(manager.next_change().await, "initial snapshot");
    manager
}

// ============================================================================
// The full scenario: create, toggle, edit, delete
// ============================================================================

#[tokio::test]
async fn test_buy_milk_lifecycle() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;
    assert!(manager.items().is_empty());

    // Create: appears with completed=false, owned by the user, sorted first.
    manager.create("Buy milk").await;
    assert!(manager.next_change().await);
    assert_eq!(manager.items().len(), 1);
    let created = manager.items()[0].clone();
    assert_eq!(created.text, "Buy milk");
    assert!(!created.completed);
    assert_eq!(created.owner_id, user.id);
    assert!(created.created_at.is_some());

    // Toggle: flips completed without touching text or id.
    manager.toggle(&created).await;
    assert!(manager.next_change().await);
    let toggled = manager.items()[0].clone();
    assert!(toggled.completed);
    assert_eq!(toggled.text, created.text);
    assert_eq!(toggled.id, created.id);

    // Toggling again restores the original state.
    manager.toggle(&toggled).await;
    assert!(manager.next_change().await);
    assert!(!manager.items()[0].completed);

    // Edit: only text and updated_at change; edit mode clears.
    let current = manager.items()[0].clone();
    manager.begin_edit(&current);
    assert_eq!(manager.editing(), Some(current.id.as_str()));
    manager.save("Buy oat milk").await;
    assert!(manager.editing().is_none());
    assert!(manager.next_change().await);
    let edited = manager.items()[0].clone();
    assert_eq!(edited.text, "Buy oat milk");
    assert_eq!(edited.id, current.id);
    assert_eq!(edited.owner_id, current.owner_id);
    assert_eq!(edited.created_at, current.created_at);
    assert!(edited.updated_at >= current.updated_at);

    // Delete: gone from the next snapshot.
    manager.delete(&edited.id).await;
    assert!(manager.next_change().await);
    assert!(manager.items().is_empty());
}

// ============================================================================
// Owner scoping
// ============================================================================

#[tokio::test]
async fn test_lists_never_cross_owners() {
    let (backend, ctx) = demo_context();
    let user_a = signed_in(&backend, "a@example.com").await;
    let user_b = signed_in(&backend, "b@example.com").await;

    let mut manager_a = bound_manager(&ctx, &user_a).await;
    let mut manager_b = bound_manager(&ctx, &user_b).await;

    manager_a.create("a's errand").await;
    manager_b.create("b's errand").await;

    // Each manager hears about its own create only; drain both deliveries
    // where present.
    manager_a.next_change().await;
    manager_b.next_change().await;
    manager_a.poll_changes();
    manager_b.poll_changes();

    assert!(manager_a.items().iter().all(|i| i.owner_id == user_a.id));
    assert!(manager_b.items().iter().all(|i| i.owner_id == user_b.id));
    assert_eq!(manager_a.items().len(), 1);
    assert_eq!(manager_b.items().len(), 1);
}

#[tokio::test]
async fn test_rebinding_to_another_user_clears_the_cache() {
    let (backend, ctx) = demo_context();
    let user_a = signed_in(&backend, "a@example.com").await;
    let user_b = signed_in(&backend, "b@example.com").await;

    let mut manager = bound_manager(&ctx, &user_a).await;
    manager.create("a's errand").await;
    assert!(manager.next_change().await);
    assert_eq!(manager.items().len(), 1);

    // Re-login as B: the prior subscription is torn down first and the
    // cache never shows A's items.
    manager.bind(Some(&user_b));
    assert!(manager.items().is_empty());
    assert!(manager.next_change().await);
    assert!(manager.items().iter().all(|i| i.owner_id == user_b.id));
}

#[tokio::test]
async fn test_null_identity_clears_list_and_subscription() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;

    let mut manager = bound_manager(&ctx, &user).await;
    manager.create("errand").await;
    assert!(manager.next_change().await);

    manager.bind(None);
    assert!(manager.items().is_empty());
    assert!(!manager.is_bound());
    assert!(!manager.next_change().await);
}

// ============================================================================
// Snapshot policy and filtering
// ============================================================================

#[tokio::test]
async fn test_snapshots_arrive_newest_first() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    for text in ["first", "second", "third"] {
        manager.create(text).await;
        assert!(manager.next_change().await);
        // Keep the server-assigned timestamps strictly ordered.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let texts: Vec<&str> = manager.items().iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_filter_views_are_pure_projections() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    manager.create("open errand").await;
    manager.next_change().await;
    manager.create("done errand").await;
    manager.next_change().await;
    manager.poll_changes();

    let done = manager
        .items()
        .iter()
        .find(|i| i.text == "done errand")
        .unwrap()
        .clone();
    manager.toggle(&done).await;
    manager.next_change().await;

    manager.set_filter(ItemFilter::Active);
    assert_eq!(manager.visible().len(), 1);
    assert!(manager.visible().iter().all(|i| !i.completed));

    manager.set_filter(ItemFilter::Completed);
    assert_eq!(manager.visible().len(), 1);
    assert!(manager.visible().iter().all(|i| i.completed));

    // Switching the filter never touches the underlying list.
    manager.set_filter(ItemFilter::All);
    assert_eq!(manager.items().len(), 2);
    assert_eq!(manager.visible().len(), 2);
}

// ============================================================================
// No-ops and absorbed failures
// ============================================================================

#[tokio::test]
async fn test_create_with_whitespace_text_is_noop() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    manager.create("").await;
    manager.create("   \t").await;
    manager.save("  ").await;

    // No request was issued and no snapshot is pending.
    assert_eq!(backend.item_count(), 0);
    assert_eq!(manager.poll_changes(), 0);
    assert!(manager.items().is_empty());
}

#[tokio::test]
async fn test_mutation_failures_are_swallowed() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    manager.create("survivor").await;
    assert!(manager.next_change().await);
    let item = manager.items()[0].clone();

    // Each failed request logs and leaves the cache exactly as it was.
    backend.fail_next_mutation();
    manager.toggle(&item).await;
    backend.fail_next_mutation();
    manager.delete(&item.id).await;
    backend.fail_next_mutation();
    manager.create("casualty").await;

    assert_eq!(manager.poll_changes(), 0);
    assert_eq!(manager.items().len(), 1);
    assert!(!manager.items()[0].completed);
}

#[tokio::test]
async fn test_subscription_failure_freezes_but_does_not_break_the_list() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    manager.create("kept").await;
    assert!(manager.next_change().await);

    // A transient delivery failure is swallowed; the cached list survives.
    backend.push_snapshot_error(&user.id);
    assert!(!manager.next_change().await);
    assert_eq!(manager.items().len(), 1);

    // The next real snapshot resumes updates.
    manager.create("resumed").await;
    assert!(manager.next_change().await);
    assert_eq!(manager.items().len(), 2);
}

#[tokio::test]
async fn test_save_in_edit_mode_clears_marker_even_on_failure() {
    let (backend, ctx) = demo_context();
    let user = signed_in(&backend, "u1@example.com").await;
    let mut manager = bound_manager(&ctx, &user).await;

    manager.create("original").await;
    assert!(manager.next_change().await);
    let item = manager.items()[0].clone();

    manager.begin_edit(&item);
    backend.fail_next_mutation();
    manager.save("revised").await;

    // Edit mode exits locally and immediately, independent of completion.
    assert!(manager.editing().is_none());
    assert_eq!(manager.poll_changes(), 0);
    assert_eq!(manager.items()[0].text, "original");
}
