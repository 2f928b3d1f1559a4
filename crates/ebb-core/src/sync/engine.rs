//! Sync orchestrator: drains the pending action queue against the remote store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;

use super::connectivity::Connectivity;
use super::resolver::{handle_delete_conflict, merge_todos, resolve_conflict};
use super::writer::TodoWriter;
use crate::models::{
    ActionKind, ActionPayload, ConflictDetails, ConflictRecord, ConflictResolution,
    PendingAction, ResolutionStrategy, Todo, TodoId, TodoPatch, UserChoice,
};
use crate::remote::RemoteStore;
use crate::services::LocalStore;
use crate::state::SyncState;
use crate::util::now_millis;
use crate::{Error, Result};

/// Per-cycle counts, for observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Replayed, or superseded by an equivalent server record
    pub succeeded: usize,
    /// Left queued after a remote failure
    pub failed: usize,
    /// Left queued awaiting a manual decision
    pub conflicted: usize,
    /// Dropped because the target no longer exists remotely
    pub voided: usize,
}

impl SyncReport {
    const fn replayed_any(&self) -> bool {
        self.succeeded > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(SyncReport),
    /// Nothing was attempted because the client is offline
    Offline,
    /// Another cycle owns the queue
    AlreadyRunning,
}

/// A queued action parked on a `manual` resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeldConflict {
    pub action: PendingAction,
    pub details: ConflictDetails,
}

enum Step {
    Replayed,
    Superseded,
    Voided,
    Held(ConflictDetails),
}

struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns both stores, the connectivity flag, and the held conflicts of the session.
pub struct SyncEngine<L, R> {
    local: L,
    remote: R,
    connectivity: Connectivity,
    held: Mutex<Vec<HeldConflict>>,
    last_report: Mutex<Option<SyncReport>>,
    draining: AtomicBool,
}

impl<L: LocalStore, R: RemoteStore> SyncEngine<L, R> {
    pub fn new(local: L, remote: R, connectivity: Connectivity) -> Self {
        Self {
            local,
            remote,
            connectivity,
            held: Mutex::new(Vec::new()),
            last_report: Mutex::new(None),
            draining: AtomicBool::new(false),
        }
    }

    pub const fn local(&self) -> &L {
        &self.local
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Optimistic write path bound to this engine
    pub fn writer(&self) -> TodoWriter<'_, L, R> {
        TodoWriter::new(self)
    }

    /// Conflicts found by the latest drain that still wait on a decision
    pub async fn held_conflicts(&self) -> Vec<HeldConflict> {
        self.held.lock().await.clone()
    }

    pub async fn last_report(&self) -> Option<SyncReport> {
        *self.last_report.lock().await
    }

    pub async fn state(&self) -> SyncState {
        if self.draining.load(Ordering::Acquire) {
            SyncState::Syncing
        } else if !self.connectivity.is_online() {
            SyncState::Offline
        } else if !self.held.lock().await.is_empty() {
            SyncState::Conflicted
        } else if self.last_report().await.is_some_and(|report| report.failed > 0) {
            SyncState::Error
        } else {
            SyncState::Synced
        }
    }

    /// Run one drain cycle: fetch, replay the queue in order, reconcile, report.
    pub async fn drain(&self) -> Result<DrainOutcome> {
        if !self.connectivity.is_online() {
            return Ok(DrainOutcome::Offline);
        }
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            return Ok(DrainOutcome::AlreadyRunning);
        };

        let actions = self.local.list_pending_actions().await?;
        self.held.lock().await.clear();
        let mut report = SyncReport::default();

        let remote_todos = match self.remote.list().await {
            Ok(todos) => todos,
            Err(error) => {
                tracing::warn!("Sync fetch failed, {} actions stay queued: {error}", actions.len());
                report.failed = actions.len();
                *self.last_report.lock().await = Some(report);
                return Ok(DrainOutcome::Completed(report));
            }
        };

        let mut lookup: HashMap<TodoId, Todo> =
            remote_todos.into_iter().map(|todo| (todo.id, todo)).collect();
        let mut remap: HashMap<TodoId, TodoId> = HashMap::new();
        // Temporary ids whose Create is still queued after this cycle
        let mut unsent: HashSet<TodoId> = HashSet::new();
        let mut held = Vec::new();

        for action in actions {
            let target = action.target_id();
            if unsent.contains(&target) {
                report.failed += 1;
                tracing::warn!(
                    action = %action.id,
                    id = %target,
                    "Create for this todo is still queued, keeping action queued"
                );
                continue;
            }

            match self.replay_queued(&action, &mut lookup, &mut remap).await {
                Ok(Step::Replayed | Step::Superseded) => report.succeeded += 1,
                Ok(Step::Voided) => report.voided += 1,
                Ok(Step::Held(details)) => {
                    report.conflicted += 1;
                    if action.kind() == ActionKind::Create {
                        unsent.insert(target);
                    }
                    held.push(HeldConflict { action, details });
                }
                Err(error) => {
                    report.failed += 1;
                    if action.kind() == ActionKind::Create {
                        unsent.insert(target);
                    }
                    if error.is_remote_unavailable() {
                        tracing::warn!(action = %action.id, "Replay failed, keeping queued: {error}");
                    } else {
                        tracing::error!(action = %action.id, "Replay failed locally: {error}");
                    }
                }
            }
        }
        *self.held.lock().await = held;

        if report.replayed_any() {
            match self.refresh().await {
                Ok(()) => {}
                Err(error) if error.is_remote_unavailable() => {
                    tracing::warn!("Post-sync refresh failed: {error}");
                }
                Err(error) => return Err(error),
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            conflicted = report.conflicted,
            voided = report.voided,
            "Sync cycle finished"
        );
        *self.last_report.lock().await = Some(report);
        Ok(DrainOutcome::Completed(report))
    }

    /// Replace the local snapshot with the remote set, keeping still-queued intent visible.
    pub async fn refresh(&self) -> Result<()> {
        let remote_todos = self.remote.list().await?;
        let pending = self.local.list_pending_actions().await?;

        let mut merged: BTreeMap<TodoId, Todo> =
            remote_todos.into_iter().map(|todo| (todo.id, todo)).collect();
        for action in pending {
            match action.payload {
                ActionPayload::Create(todo) | ActionPayload::Update(todo) => {
                    merged.insert(todo.id, todo);
                }
                ActionPayload::Delete(target) => {
                    let base = match merged.remove(&target.id) {
                        Some(todo) => Some(todo),
                        None => self.local.get(target.id).await?,
                    };
                    if let Some(todo) = base {
                        merged.insert(target.id, todo.into_tombstone());
                    }
                }
            }
        }

        let todos = merged.into_values().collect::<Vec<_>>();
        self.local.replace_all(&todos).await
    }

    /// Settle a held conflict with the user's choice and replay it.
    ///
    /// A remote failure leaves the conflict held and the action queued.
    pub async fn resolve_held(&self, action_id: &str, choice: UserChoice) -> Result<Todo> {
        let Some(_guard) = DrainGuard::acquire(&self.draining) else {
            return Err(Error::SyncInProgress);
        };

        let conflict = self
            .held
            .lock()
            .await
            .iter()
            .find(|conflict| conflict.action.id == action_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("held conflict {action_id}")))?;

        let details = &conflict.details;
        let (strategy, resolved) = match choice {
            UserChoice::Server => (ResolutionStrategy::ServerWins, details.server_version.clone()),
            UserChoice::Client => (ResolutionStrategy::ClientWins, details.client_version.clone()),
            UserChoice::Merge => (
                ResolutionStrategy::Merge,
                merge_todos(&details.server_version, &details.client_version),
            ),
        };

        let stored = self.push(conflict.action.kind(), &resolved).await?;
        self.local.remove_pending_action(&conflict.action.id).await?;
        self.held
            .lock()
            .await
            .retain(|held| held.action.id != conflict.action.id);
        self.local
            .record_conflict(&ConflictRecord::from_details(strategy, details, now_millis()))
            .await?;
        self.local.upsert(&stored).await?;
        tracing::info!(action = %conflict.action.id, %strategy, "Held conflict resolved");

        if let Err(error) = self.refresh().await {
            if !error.is_remote_unavailable() {
                return Err(error);
            }
            tracing::warn!("Refresh after resolution failed: {error}");
        }
        Ok(stored)
    }

    /// Send one resolved record to the remote store; returns what it now holds.
    pub(crate) async fn push(&self, kind: ActionKind, todo: &Todo) -> Result<Todo> {
        match kind {
            ActionKind::Create => self.remote.create(todo).await,
            ActionKind::Update => self.remote.update(&TodoPatch::from(todo)).await,
            ActionKind::Delete => {
                self.remote.delete(todo.id).await?;
                Ok(todo.clone().into_tombstone())
            }
        }
    }

    async fn replay_queued(
        &self,
        action: &PendingAction,
        lookup: &mut HashMap<TodoId, Todo>,
        remap: &mut HashMap<TodoId, TodoId>,
    ) -> Result<Step> {
        let kind = action.kind();
        let target = remap
            .get(&action.target_id())
            .copied()
            .unwrap_or_else(|| action.target_id());
        let server = lookup.get(&target);

        let (client, resolution) = match action.payload.clone().retargeted(target) {
            ActionPayload::Delete(_) => {
                let client = self
                    .local
                    .get(action.target_id())
                    .await?
                    .map_or_else(|| Todo::tombstone(target), |todo| Todo { id: target, ..todo })
                    .into_tombstone();
                let resolution = handle_delete_conflict(server, &client);
                (client, resolution)
            }
            ActionPayload::Update(client)
                if server.is_some_and(|server| server.deleted != client.deleted) =>
            {
                let resolution = handle_delete_conflict(server, &client);
                (client, resolution)
            }
            ActionPayload::Create(client) | ActionPayload::Update(client) => {
                let resolution = resolve_conflict(server, &client, kind);
                (client, resolution)
            }
        };

        let ConflictResolution {
            strategy,
            resolved,
            details,
        } = resolution;
        tracing::debug!(action = %action.id, %kind, id = %target, %strategy, "Resolved queued action");

        let details = match (strategy, details) {
            (ResolutionStrategy::Manual, Some(details)) => return Ok(Step::Held(details)),
            (_, details) => details,
        };

        let Some(resolved) = resolved else {
            self.local.remove_pending_action(&action.id).await?;
            return Ok(Step::Voided);
        };

        if kind == ActionKind::Create && strategy == ResolutionStrategy::ServerWins {
            self.local.remove_pending_action(&action.id).await?;
            return Ok(Step::Superseded);
        }

        if kind == ActionKind::Delete && !resolved.deleted {
            self.local.remove_pending_action(&action.id).await?;
            return Ok(Step::Voided);
        }

        let stored = self.push(kind, &resolved).await?;
        self.local.remove_pending_action(&action.id).await?;

        if let (ResolutionStrategy::Merge, Some(details)) = (strategy, &details) {
            self.local
                .record_conflict(&ConflictRecord::from_details(strategy, details, now_millis()))
                .await?;
        }

        if kind == ActionKind::Create && stored.id != client.id {
            remap.insert(action.target_id(), stored.id);
            self.local
                .retarget_pending_actions(action.target_id(), stored.id)
                .await?;
            self.local.remove_by_id(client.id).await?;
            self.local.upsert(&stored).await?;
        }
        lookup.insert(stored.id, stored);
        Ok(Step::Replayed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{ConflictField, TodoRef};
    use crate::remote::MemoryRemoteStore;
    use crate::services::DatabaseService;

    type TestEngine = SyncEngine<DatabaseService, MemoryRemoteStore>;

    async fn engine(online: bool) -> (TestEngine, MemoryRemoteStore) {
        let local = DatabaseService::open_in_memory().await.unwrap();
        let remote = MemoryRemoteStore::new();
        let engine = SyncEngine::new(local, remote.clone(), Connectivity::new(online));
        (engine, remote)
    }

    async fn enqueue(engine: &TestEngine, payload: ActionPayload) -> PendingAction {
        let action = PendingAction::new(payload);
        engine.local().enqueue_pending_action(&action).await.unwrap();
        action
    }

    async fn queued_ids(engine: &TestEngine) -> Vec<String> {
        engine
            .local()
            .list_pending_actions()
            .await
            .unwrap()
            .into_iter()
            .map(|action| action.id)
            .collect()
    }

    fn completed(report: DrainOutcome) -> SyncReport {
        match report {
            DrainOutcome::Completed(report) => report,
            other => panic!("expected a completed cycle, got {other:?}"),
        }
    }

    /// Server tombstone at T2 and a live local edit at T1 < T2.
    async fn seed_delete_vs_edit(
        engine: &TestEngine,
        remote: &MemoryRemoteStore,
    ) -> PendingAction {
        let base = Todo::new(TodoId::new(5), "X");
        let t1 = base.created_at + Duration::milliseconds(10);
        let t2 = base.created_at + Duration::milliseconds(20);
        remote
            .seed(Todo {
                deleted: true,
                updated_at: Some(t2),
                ..base.clone()
            })
            .await;

        let client = Todo {
            title: "Y".to_string(),
            updated_at: Some(t1),
            ..base
        };
        engine.local().upsert(&client).await.unwrap();
        enqueue(engine, ActionPayload::Update(client)).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drain_while_offline_touches_nothing() {
        let (engine, remote) = engine(false).await;
        enqueue(&engine, ActionPayload::Create(Todo::new(TodoId::new(1001), "x"))).await;

        assert_eq!(engine.drain().await.unwrap(), DrainOutcome::Offline);
        assert_eq!(queued_ids(&engine).await.len(), 1);
        assert_eq!(remote.write_calls().await, 0);
        assert_eq!(engine.state().await, SyncState::Offline);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn offline_create_syncs_and_store_matches_remote() {
        let (engine, remote) = engine(true).await;
        let todo = Todo::new(TodoId::new(1001), "buy milk");
        engine.local().upsert(&todo).await.unwrap();
        enqueue(&engine, ActionPayload::Create(todo)).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(
            report,
            SyncReport {
                succeeded: 1,
                ..SyncReport::default()
            }
        );
        assert!(queued_ids(&engine).await.is_empty());

        let local = engine.local().read_all().await.unwrap();
        assert_eq!(local, remote.snapshot().await);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].title, "buy milk");
        assert_eq!(engine.state().await, SyncState::Synced);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queued_edits_follow_a_create_that_got_a_new_id() {
        let (engine, remote) = engine(true).await;
        let created = Todo::new(TodoId::new(1001), "draft");
        let renamed = Todo {
            title: "final".to_string(),
            ..created.clone()
        }
        .touched();
        enqueue(&engine, ActionPayload::Create(created)).await;
        enqueue(&engine, ActionPayload::Update(renamed)).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 2);

        let remote_todos = remote.snapshot().await;
        assert_eq!(remote_todos.len(), 1);
        assert_eq!(remote_todos[0].id, TodoId::new(1));
        assert_eq!(remote_todos[0].title, "final");
        assert_eq!(engine.local().read_all().await.unwrap(), remote_todos);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn manual_conflict_does_not_block_later_actions() {
        let (engine, remote) = engine(true).await;
        let a1 = seed_delete_vs_edit(&engine, &remote).await;

        let live = Todo::new(TodoId::new(6), "live");
        remote.seed(live.clone()).await;
        let a2 = enqueue(
            &engine,
            ActionPayload::Update(Todo {
                completed: true,
                ..live
            }
            .touched()),
        )
        .await;
        let a3 = enqueue(&engine, ActionPayload::Create(Todo::new(TodoId::new(2001), "new"))).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.conflicted, 1);
        assert_eq!(queued_ids(&engine).await, vec![a1.id.clone()]);
        assert!(!queued_ids(&engine).await.contains(&a2.id));
        assert!(!queued_ids(&engine).await.contains(&a3.id));

        let held = engine.held_conflicts().await;
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].action.id, a1.id);
        assert_eq!(held[0].details.conflict_fields, vec![ConflictField::Deleted]);
        assert_eq!(engine.state().await, SyncState::Conflicted);

        assert!(remote.get(TodoId::new(6)).await.unwrap().completed);
        // The held edit stays visible locally
        let local = engine.local().get(TodoId::new(5)).await.unwrap().unwrap();
        assert_eq!(local.title, "Y");
        assert!(!local.deleted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_drains_keep_the_same_held_conflict() {
        let (engine, remote) = engine(true).await;
        let held = seed_delete_vs_edit(&engine, &remote).await;

        for _ in 0..2 {
            let report = completed(engine.drain().await.unwrap());
            assert_eq!(report.conflicted, 1);
            let conflicts = engine.held_conflicts().await;
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].action.id, held.id);
        }
        assert_eq!(remote.write_calls().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolving_with_client_choice_restores_the_record() {
        let (engine, remote) = engine(true).await;
        let held = seed_delete_vs_edit(&engine, &remote).await;
        engine.drain().await.unwrap();

        let stored = engine.resolve_held(&held.id, UserChoice::Client).await.unwrap();
        assert_eq!(stored.title, "Y");
        assert!(!stored.deleted);

        assert!(queued_ids(&engine).await.is_empty());
        assert!(engine.held_conflicts().await.is_empty());
        assert!(!remote.get(TodoId::new(5)).await.unwrap().deleted);

        let log = engine.local().list_conflicts(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].strategy, ResolutionStrategy::ClientWins);
        assert_eq!(log[0].todo_id, TodoId::new(5));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn resolving_with_merge_keeps_the_tombstone() {
        let (engine, remote) = engine(true).await;
        let held = seed_delete_vs_edit(&engine, &remote).await;
        engine.drain().await.unwrap();

        let stored = engine.resolve_held(&held.id, UserChoice::Merge).await.unwrap();
        assert!(stored.deleted);
        assert_eq!(stored.title, "X");
        assert!(engine.local().get(TodoId::new(5)).await.unwrap().unwrap().deleted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_resolution_keeps_the_conflict_held() {
        let (engine, remote) = engine(true).await;
        let held = seed_delete_vs_edit(&engine, &remote).await;
        engine.drain().await.unwrap();

        remote.set_available(false).await;
        let error = engine
            .resolve_held(&held.id, UserChoice::Server)
            .await
            .unwrap_err();
        assert!(error.is_remote_unavailable());
        assert_eq!(engine.held_conflicts().await.len(), 1);
        assert_eq!(queued_ids(&engine).await, vec![held.id]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_held_conflict_is_not_found() {
        let (engine, _remote) = engine(true).await;
        let error = engine
            .resolve_held("UPDATE_0_missing", UserChoice::Server)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn actions_against_missing_targets_are_voided() {
        let (engine, remote) = engine(true).await;
        enqueue(&engine, ActionPayload::Update(Todo::new(TodoId::new(40), "gone").touched())).await;
        enqueue(&engine, ActionPayload::Delete(TodoRef { id: TodoId::new(41) })).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.voided, 2);
        assert_eq!(report.succeeded, 0);
        assert!(queued_ids(&engine).await.is_empty());
        assert_eq!(remote.write_calls().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_for_an_existing_server_id_is_superseded() {
        let (engine, remote) = engine(true).await;
        let server = Todo::new(TodoId::new(9), "server copy");
        remote.seed(server.clone()).await;
        enqueue(&engine, ActionPayload::Create(Todo::new(TodoId::new(9), "local copy"))).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 1);
        assert_eq!(remote.write_calls().await, 0);
        assert_eq!(remote.snapshot().await, vec![server.clone()]);
        assert_eq!(engine.local().read_all().await.unwrap(), vec![server]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn queued_delete_tombstones_a_live_server_record() {
        let (engine, remote) = engine(true).await;
        let live = Todo::new(TodoId::new(3), "remove me");
        remote.seed(live.clone()).await;
        engine.local().upsert(&live.clone().into_tombstone().touched()).await.unwrap();
        enqueue(&engine, ActionPayload::Delete(TodoRef { id: live.id })).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 1);
        assert!(remote.get(live.id).await.unwrap().deleted);
        assert!(engine.local().get(live.id).await.unwrap().unwrap().deleted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remote_failure_isolates_one_action() {
        let (engine, remote) = engine(true).await;
        let broken = Todo::new(TodoId::new(1), "broken");
        let fine = Todo::new(TodoId::new(2), "fine");
        remote.seed(broken.clone()).await;
        remote.seed(fine.clone()).await;
        remote.fail_writes_to(broken.id).await;

        let stuck = enqueue(
            &engine,
            ActionPayload::Update(Todo { completed: true, ..broken }.touched()),
        )
        .await;
        enqueue(
            &engine,
            ActionPayload::Update(Todo { completed: true, ..fine }.touched()),
        )
        .await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(queued_ids(&engine).await, vec![stuck.id]);
        assert_eq!(engine.state().await, SyncState::Error);

        // The stuck edit is still what the user sees locally
        assert!(engine.local().get(TodoId::new(1)).await.unwrap().unwrap().completed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_fetch_counts_every_action_as_failed() {
        let (engine, remote) = engine(true).await;
        remote.set_available(false).await;
        enqueue(&engine, ActionPayload::Create(Todo::new(TodoId::new(1001), "a"))).await;
        enqueue(&engine, ActionPayload::Create(Todo::new(TodoId::new(1002), "b"))).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.failed, 2);
        assert_eq!(queued_ids(&engine).await.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn edit_behind_a_failed_create_stays_queued() {
        let (engine, remote) = engine(false).await;
        let draft = engine.writer().create_todo("draft").await.unwrap().into_todo();
        engine.writer().update_title(draft.id, "final").await.unwrap();

        engine.connectivity().set_online(true);
        remote.fail_writes_to(draft.id).await;
        let report = completed(engine.drain().await.unwrap());
        assert_eq!(
            report,
            SyncReport {
                failed: 2,
                ..SyncReport::default()
            }
        );
        assert_eq!(queued_ids(&engine).await.len(), 2);
        let local = engine.local().get(draft.id).await.unwrap().unwrap();
        assert_eq!(local.title, "final");

        remote.clear_failures().await;
        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 2);
        assert!(queued_ids(&engine).await.is_empty());

        let stored = remote.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "final");
        assert_eq!(engine.local().read_all().await.unwrap(), stored);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn voided_only_cycle_leaves_the_local_store_alone() {
        let (engine, remote) = engine(true).await;
        let orphan = Todo::new(TodoId::new(40), "local only");
        engine.local().upsert(&orphan).await.unwrap();
        enqueue(&engine, ActionPayload::Update(orphan.clone().touched())).await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.voided, 1);
        assert!(remote.snapshot().await.is_empty());
        assert_eq!(engine.local().read_all().await.unwrap(), vec![orphan]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn newer_server_edit_is_merged_and_logged() {
        let (engine, remote) = engine(true).await;
        let base = Todo::new(TodoId::new(4), "original");
        remote
            .seed(Todo {
                title: "server title".to_string(),
                updated_at: Some(base.created_at + Duration::milliseconds(50)),
                ..base.clone()
            })
            .await;
        enqueue(
            &engine,
            ActionPayload::Update(Todo {
                completed: true,
                updated_at: Some(base.created_at + Duration::milliseconds(10)),
                ..base
            }),
        )
        .await;

        let report = completed(engine.drain().await.unwrap());
        assert_eq!(report.succeeded, 1);

        let merged = remote.get(TodoId::new(4)).await.unwrap();
        assert_eq!(merged.title, "server title");
        assert!(merged.completed);

        let log = engine.local().list_conflicts(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].strategy, ResolutionStrategy::Merge);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overlapping_drains_are_rejected() {
        let (engine, _remote) = engine(true).await;
        let _guard = DrainGuard::acquire(&engine.draining).unwrap();
        assert_eq!(engine.drain().await.unwrap(), DrainOutcome::AlreadyRunning);
        assert_eq!(engine.state().await, SyncState::Syncing);
        assert!(matches!(
            engine.resolve_held("x", UserChoice::Client).await,
            Err(Error::SyncInProgress)
        ));
    }
}
