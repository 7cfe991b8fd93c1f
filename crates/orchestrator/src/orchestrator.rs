// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator Core (spec.md §4.4): owns the spawn registry, the two
//! counter maps, and the pending queue under a single non-reentrant mutex
//! (spec.md §5), generic over a [`Store`] and driving a [`WorkspaceManager`]
//! and a [`BindingRegistry`] — matching the teacher's `Executor<S, A, N, C>`
//! generic-over-adapter-traits shape in `oj-engine::executor`.

use crate::active_spawn::ActiveSpawn;
use crate::binding::{BindingRegistry, ChildLoopConfig, PromptBuilder};
use crate::error::OrchestratorError;
use crate::queue::{can_admit, effective_instance_cap, PendingQueue, PendingSpawn};
use crate::state_machine::{apply_merge, apply_reject, classify_termination, ChildTermination};
use conclave_core::delegation::DEFAULT_TIMEOUT_UNIT;
use conclave_core::env::child_env;
use conclave_core::{
    Clock, DelegationEntry, Event, ProfileSet, SessionId, SpawnId, SpawnIdGen, SpawnRecord, SpawnRequest, SpawnSnapshot,
    SpawnStatus, TurnId,
};
use conclave_store::Store;
use conclave_workspace::{branch_name, readonly_worktree_name, WorkspaceManager};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// How often the interrupt watcher polls the store's pending-interrupt
/// column, and the fallback poll granularity for `Wait`/`WaitAny`/`WaitOne`
/// (spec.md §4.4.2 step 8, §4.4.5).
const POLL_INTERVAL: Duration = Duration::from_millis(250);

struct RegistryState {
    active: HashMap<SpawnId, Arc<ActiveSpawn>>,
    running_by_parent: HashMap<String, u32>,
    instances_by_child: HashMap<String, u32>,
    queue: PendingQueue,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            active: HashMap::new(),
            running_by_parent: HashMap::new(),
            instances_by_child: HashMap::new(),
            queue: PendingQueue::new(),
        }
    }

    fn increment(&mut self, parent_profile: &str, child_profile: &str) {
        *self.running_by_parent.entry(parent_profile.to_string()).or_insert(0) += 1;
        *self.instances_by_child.entry(child_profile.to_string()).or_insert(0) += 1;
    }

    /// Decrement-to-zero deletes the key, preserving cheap iteration
    /// (spec.md §5 "Counter discipline").
    fn decrement(&mut self, parent_profile: &str, child_profile: &str) {
        if let Some(count) = self.running_by_parent.get_mut(parent_profile) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.running_by_parent.remove(parent_profile);
            }
        }
        if let Some(count) = self.instances_by_child.get_mut(child_profile) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.instances_by_child.remove(child_profile);
            }
        }
    }

    fn running_count(&self, parent_profile: &str) -> u32 {
        self.running_by_parent.get(parent_profile).copied().unwrap_or(0)
    }

    fn instance_count(&self, child_profile: &str) -> u32 {
        self.instances_by_child.get(child_profile).copied().unwrap_or(0)
    }

    fn active_snapshot(&self) -> Vec<SpawnSnapshot> {
        self.active
            .values()
            .map(|a| SpawnSnapshot {
                id: a.id,
                child_profile: a.child_profile.clone(),
                role: a.role.clone(),
                status: SpawnStatus::Running,
            })
            .collect()
    }
}

/// Outcome of [`Orchestrator::wait_any`] (spec.md §4.4.5 `WaitAny`).
pub enum WaitAnyOutcome {
    /// At least one spawn reached a terminal status.
    Completed {
        newly_terminal: Vec<SpawnRecord>,
        more_pending: bool,
    },
    /// The configured review interval elapsed with nothing yet terminal; a
    /// synthetic checkpoint of the still-running spawns for the parent.
    ///
    /// Per-spawn runtime metrics (tokens in/out, read/write/compaction
    /// counts) named in spec.md §4.4.5 are not modeled here: nothing in the
    /// Data Model (spec.md §3) carries them, and deriving them requires
    /// parsing an external agent's event stream format, which spec.md §1
    /// places out of scope. The checkpoint instead carries spawn identity
    /// and elapsed running time.
    Review { running: Vec<(SpawnId, Duration)> },
}

/// Process-wide orchestrator instance (spec.md §9 "Global singleton"):
/// constructed once at daemon start, torn down at daemon exit.
pub struct Orchestrator<C: Clock> {
    session_id: SessionId,
    profiles: ProfileSet,
    store: Arc<dyn Store>,
    workspace: Arc<WorkspaceManager>,
    bindings: BindingRegistry,
    prompt_builder: Arc<dyn PromptBuilder>,
    clock: C,
    id_gen: SpawnIdGen,
    /// Shared event-sink channel (spec.md §4.4 "the shared event-sink
    /// channel used for external observation"). `None` once a send has
    /// observed the receiver dropped (spec.md §4.5.3 "Closed-channel
    /// emit").
    event_tx: Mutex<Option<mpsc::Sender<Event>>>,
    /// Periodic review interval for `WaitAny` (spec.md §4.4.5, configured
    /// via an environment variable read by the caller at construction).
    review_interval: Option<Duration>,
    /// Unit a `TimeoutMinutes` entry is multiplied by (spec.md §8 scenario
    /// 4's "time-unit hook"). Defaults to `DEFAULT_TIMEOUT_UNIT` (one
    /// minute); tests shrink it so a `TimeoutMinutes=1` rule fires in
    /// milliseconds instead of real minutes.
    timeout_unit: Duration,
    state: Mutex<RegistryState>,
}

impl<C: Clock> Orchestrator<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: SessionId,
        profiles: ProfileSet,
        store: Arc<dyn Store>,
        workspace: Arc<WorkspaceManager>,
        bindings: BindingRegistry,
        prompt_builder: Arc<dyn PromptBuilder>,
        clock: C,
        event_tx: mpsc::Sender<Event>,
        review_interval: Option<Duration>,
    ) -> Self {
        Self {
            session_id,
            profiles,
            store,
            workspace,
            bindings,
            prompt_builder,
            clock,
            id_gen: SpawnIdGen::new(),
            event_tx: Mutex::new(Some(event_tx)),
            review_interval,
            timeout_unit: DEFAULT_TIMEOUT_UNIT,
            state: Mutex::new(RegistryState::new()),
        }
    }

    /// Overrides the timeout unit (spec.md §8 scenario 4). Test-only hook.
    #[cfg(test)]
    pub fn with_timeout_unit(mut self, unit: Duration) -> Self {
        self.timeout_unit = unit;
        self
    }

    /// Non-blocking emit discipline (spec.md §4.5.3, §8 "Non-blocking
    /// emit"/"Closed-channel emit"): a full channel silently drops the
    /// event; a channel whose receiver has been dropped nils the reference
    /// so every later call is a no-op.
    fn emit(&self, event: Event) {
        let mut slot = self.event_tx.lock();
        let Some(tx) = slot.as_ref() else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                *slot = None;
            }
        }
    }

    fn emit_spawn_set_changed(&self) {
        let spawns = self.state.lock().active_snapshot();
        self.emit(Event::SpawnStatusChanged { spawns });
    }

    /// `Spawn` (spec.md §4.4.1): validate preconditions, admit or enqueue,
    /// and (if `request.wait`) block until the spawn reaches a terminal
    /// status.
    #[instrument(skip(self, request), fields(parent_profile = %request.parent_profile, child_profile = %request.child_profile))]
    pub async fn spawn(self: &Arc<Self>, request: SpawnRequest) -> Result<SpawnId, OrchestratorError> {
        let (entry, role) = self.validate(&request).await?;

        let parallel_cap = request.delegation_rule.effective_max_parallel();
        let instance_cap = effective_instance_cap(entry.instance_cap, self.profiles.get(&request.child_profile).and_then(|p| p.max_instances));

        let id = self.id_gen.next();
        let admitted = {
            let mut state = self.state.lock();
            if can_admit(
                state.running_count(&request.parent_profile),
                parallel_cap,
                state.instance_count(&request.child_profile),
                instance_cap,
            ) {
                state.increment(&request.parent_profile, &request.child_profile);
                true
            } else {
                false
            }
        };

        let wait = request.wait;
        let started = if admitted {
            self.start_spawn(id, request, entry, role).await
        } else {
            let (reply, recv) = oneshot::channel();
            let parent_profile = request.parent_profile.clone();
            let child_profile = request.child_profile.clone();
            {
                let mut state = self.state.lock();
                state.queue.enqueue(PendingSpawn {
                    request,
                    parent_profile,
                    child_profile,
                    instance_cap,
                    parallel_cap,
                    reply,
                });
            }
            recv.await.unwrap_or(Err(OrchestratorError::UnknownSpawn(id)))
        };

        let spawn_id = started?;
        if wait {
            self.wait_one(spawn_id).await?;
        }
        Ok(spawn_id)
    }

    /// Preconditions 1–5 (spec.md §4.4.1), checked in order.
    async fn validate(&self, request: &SpawnRequest) -> Result<(DelegationEntry, Option<String>), OrchestratorError> {
        if !self.profiles.contains(&request.parent_profile) {
            return Err(OrchestratorError::Validation(format!(
                "unknown parent profile {:?}",
                request.parent_profile
            )));
        }
        if !self.profiles.contains(&request.child_profile) {
            return Err(OrchestratorError::Validation(format!(
                "unknown child profile {:?}",
                request.child_profile
            )));
        }
        let entry = request
            .delegation_rule
            .resolve(&request.child_profile, request.requested_role.as_deref())
            .map_err(|e| OrchestratorError::Validation(e.to_string()))?
            .clone();
        let role = request.requested_role.clone().or_else(|| entry.role.clone());

        if let Some(source_id) = request.workspace_from_spawn_id {
            let source = self
                .store
                .get_spawn(source_id)
                .await?
                .ok_or_else(|| OrchestratorError::Validation(format!("workspace-from spawn {source_id} does not exist")))?;
            if !source.is_valid_workspace_source() {
                return Err(OrchestratorError::Validation(format!(
                    "workspace-from spawn {source_id} is not a valid base (status {})",
                    source.status
                )));
            }
        }

        Ok((entry, role))
    }

    /// `StartSpawn` (spec.md §4.4.2), steps 1–9.
    #[instrument(skip(self, request, entry), fields(spawn_id = %id))]
    async fn start_spawn(
        self: &Arc<Self>,
        id: SpawnId,
        request: SpawnRequest,
        entry: DelegationEntry,
        role: Option<String>,
    ) -> Result<SpawnId, OrchestratorError> {
        let parent_profile = request.parent_profile.clone();
        let child_profile = request.child_profile.clone();

        // Step 2: create a workspace.
        let workspace_result = self.create_workspace(&id, &request).await;
        let (branch, workspace_path) = match workspace_result {
            Ok(pair) => pair,
            Err(e) => {
                self.rollback_admission(&parent_profile, &child_profile);
                return Err(e);
            }
        };

        // Step 3: persist the running record.
        let created_at_ms = self.clock.epoch_ms();
        let mut record = SpawnRecord::new(id, &request, role.clone(), created_at_ms);
        record.branch_name = branch.clone();
        record.workspace_path = workspace_path.clone();
        record.speed_hint = entry.speed_hint.clone();
        record.handoff = entry.handoff;

        if let Err(e) = self.store.put_spawn(&record).await {
            if let Some(path) = &workspace_path {
                let _ = self.workspace.remove(path, branch.as_deref(), true).await;
            }
            self.rollback_admission(&parent_profile, &child_profile);
            return Err(OrchestratorError::Persistence(e));
        }

        // Step 4: resolve the agent binding.
        let Some(profile) = self.profiles.get(&child_profile).cloned() else {
            self.rollback_admission(&parent_profile, &child_profile);
            return Err(OrchestratorError::Validation(format!("unknown child profile {child_profile:?}")));
        };
        let Some(binding) = self.bindings.get(&profile.agent_type) else {
            record.status = SpawnStatus::Failed;
            record.result = Some(format!("no agent binding registered for profile {child_profile:?}"));
            record.completed_at_ms = Some(self.clock.epoch_ms());
            let _ = self.store.put_spawn(&record).await;
            if let Some(path) = &workspace_path {
                let _ = self.workspace.remove(path, branch.as_deref(), true).await;
            }
            self.rollback_admission(&parent_profile, &child_profile);
            return Err(OrchestratorError::Binding {
                spawn_id: id,
                profile: profile.agent_type.clone(),
            });
        };

        // Step 5: build the prompt.
        let prompt = self.prompt_builder.build(&request.parent_turn_id, &child_profile, &request.task_text);

        // Step 6: construct the child loop configuration.
        let cwd = workspace_path.clone().unwrap_or_else(|| self.workspace.repo_root().to_path_buf());
        let extra_env = child_env(
            self.session_id.as_str(),
            &id.to_string(),
            request.parent_turn_id.as_str(),
            &child_profile,
            request.plan_id.as_deref(),
        );
        let config = ChildLoopConfig {
            spawn_id: id,
            parent_turn_id: request.parent_turn_id.clone(),
            profile: child_profile.clone(),
            plan_id: request.plan_id.clone(),
            prompt,
            cwd,
            extra_env,
        };

        // Step 7: enter the running state.
        let cancel = CancellationToken::new();
        let active = Arc::new(ActiveSpawn::new(
            id,
            request.parent_turn_id.clone(),
            parent_profile.clone(),
            child_profile.clone(),
            role.clone(),
            cancel.clone(),
        ));
        {
            let mut state = self.state.lock();
            state.active.insert(id, Arc::clone(&active));
        }
        self.emit(Event::AgentStarted {
            session_id: self.session_id.clone(),
            turn_id: request.parent_turn_id.clone(),
            step_id: id.to_string(),
            run_id: id.to_string(),
        });
        self.emit_spawn_set_changed();

        // Steps 8–9 run in a detached task: `StartSpawn` itself only blocks
        // long enough to register the Active Spawn (spec.md §5 "Spawn may
        // block in two places: on the admission reply channel ... and on
        // the child's completion signal when wait=true" — notably NOT on
        // the child loop itself). `Spawn` layers the optional `wait` block
        // back on top via `wait_one` after this returns.
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run_child_to_completion(id, request, entry, profile, binding, config, workspace_path, record, active, cancel, parent_profile, child_profile)
                .await;
        });

        Ok(id)
    }

    /// Steps 8–9 of `StartSpawn` (spec.md §4.4.2): auxiliary tasks, the
    /// child loop itself, and finalization. Runs in its own task so the
    /// caller of `Spawn`/`StartSpawn` is never blocked on a running child.
    #[allow(clippy::too_many_arguments)]
    async fn run_child_to_completion(
        self: Arc<Self>,
        id: SpawnId,
        request: SpawnRequest,
        entry: DelegationEntry,
        profile: conclave_core::Profile,
        binding: Arc<dyn crate::binding::ChildAgentBinding>,
        config: ChildLoopConfig,
        workspace_path: Option<PathBuf>,
        mut record: SpawnRecord,
        active: Arc<ActiveSpawn>,
        cancel: CancellationToken,
        parent_profile: String,
        child_profile: String,
    ) {
        // Step 8: auxiliary tasks, stopped together once the child returns.
        let aux_stop = CancellationToken::new();
        let timeout_minutes = entry.timeout_minutes.or_else(|| profile.timeout.map(|d| (d.as_secs() / 60).max(1) as u32));
        let timeout_duration = entry.timeout(self.timeout_unit).or(profile.timeout);
        let timed_out = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let interrupt_task = tokio::spawn(Self::interrupt_watcher(
            Arc::clone(&self.store),
            Arc::clone(&active),
            aux_stop.clone(),
        ));
        let timeout_task = timeout_duration.map(|duration| {
            tokio::spawn(Self::timeout_watch(
                duration,
                Arc::clone(&active),
                aux_stop.clone(),
                Arc::clone(&timed_out),
            ))
        });

        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<String>();
        let raw_buffer: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
        let drain_task = {
            let raw_buffer = Arc::clone(&raw_buffer);
            let active = Arc::clone(&active);
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                while let Some(line) = raw_rx.recv().await {
                    raw_buffer.lock().push_str(&line);
                    raw_buffer.lock().push('\n');
                    let event = Event::AgentRaw {
                        turn_id: None,
                        spawn_id: Some(active.id),
                        text: line,
                    };
                    active.events.add(event.clone());
                    this.emit(event);
                }
            })
        };

        // Step 9: run the child loop, then finalize.
        let outcome = binding.run(&config, cancel.clone(), raw_tx).await;

        drop(config);
        let _ = drain_task.await;
        aux_stop.cancel();
        let _ = interrupt_task.await;
        if let Some(handle) = timeout_task {
            let _ = handle.await;
        }

        let raw_output = raw_buffer.lock().clone();
        let final_message = crate::extraction::extract_final_message(&raw_output);

        let auto_commit = match &workspace_path {
            Some(path) => self
                .workspace
                .auto_commit_if_dirty(path, &format!("auto-commit: spawn {id} finalized"))
                .await
                .ok(),
            None => None,
        };

        let timed_out = timed_out.load(std::sync::atomic::Ordering::SeqCst);
        let termination = ChildTermination::from_outcome(outcome);
        let (mut status, exit_code) = classify_termination(&termination);
        let (result, summary) =
            self.compose_result_and_summary(&termination, status, timed_out, timeout_minutes, id, final_message.as_deref(), &auto_commit);
        if timed_out {
            status = SpawnStatus::Failed;
        }

        record.status = status;
        record.exit_code = Some(exit_code);
        record.result = Some(result);
        record.summary = Some(summary);
        record.completed_at_ms = Some(self.clock.epoch_ms());
        if let Some(commit) = auto_commit.as_ref().filter(|c| c.committed) {
            record.merge_commit = Some(commit.commit_hash.clone());
        }
        let _ = self.store.put_spawn(&record).await;

        active.mark_completed();
        self.emit(Event::AgentFinished {
            turn_id: request.parent_turn_id.clone(),
            exit_code,
            duration_ms: active.elapsed().as_millis() as u64,
            wait_for_spawns: false,
            error: record.result.clone(),
        });

        self.on_spawn_complete(&parent_profile, &child_profile, id);
    }

    async fn create_workspace(&self, id: &SpawnId, request: &SpawnRequest) -> Result<(Option<String>, Option<PathBuf>), OrchestratorError> {
        if request.read_only {
            let name = readonly_worktree_name(&self.clock, request.parent_turn_id.as_str(), &request.child_profile);
            let path = self.workspace.create_detached(&name).await?;
            return Ok((None, Some(path)));
        }

        let branch = branch_name(&self.clock, request.parent_turn_id.as_str(), &request.child_profile);
        let path = if let Some(source_id) = request.workspace_from_spawn_id {
            let source = self
                .store
                .get_spawn(source_id)
                .await?
                .ok_or_else(|| OrchestratorError::Validation(format!("workspace-from spawn {source_id} does not exist")))?;
            let source_ref = source.branch_name.ok_or(conclave_workspace::WorkspaceError::InvalidSourceSpawn)?;
            self.workspace.create_from(&branch, &source_ref).await?
        } else {
            self.workspace.create(&branch).await?
        };
        let _ = id;
        Ok((Some(branch), Some(path)))
    }

    fn rollback_admission(&self, parent_profile: &str, child_profile: &str) {
        self.state.lock().decrement(parent_profile, child_profile);
    }

    /// Compose the terminal result/summary text (spec.md §4.3 "Classification
    /// rules for the terminal summary text").
    #[allow(clippy::too_many_arguments)]
    fn compose_result_and_summary(
        &self,
        termination: &ChildTermination,
        status: SpawnStatus,
        timed_out: bool,
        timeout_minutes: Option<u32>,
        id: SpawnId,
        final_message: Option<&str>,
        auto_commit: &Option<conclave_workspace::AutoCommitResult>,
    ) -> (String, String) {
        if timed_out {
            let minutes = timeout_minutes.unwrap_or(0);
            let resume = format!("resume with: conclave spawn resume {id}");
            let text = format!("timed out after {minutes} minute(s); {resume}");
            return (text.clone(), text);
        }

        let base_summary = final_message
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("no final message could be extracted; inspect spawn {id}'s raw output manually"));

        match status {
            SpawnStatus::Canceled => {
                let mut note = "the run was canceled before completion.".to_string();
                if auto_commit.as_ref().is_some_and(|c| c.committed) {
                    note = format!("{note} Partial work was auto-committed.");
                }
                let summary = format!("{base_summary}\n\n{note}");
                (summary.clone(), summary)
            }
            SpawnStatus::Failed => {
                let error = match termination {
                    ChildTermination::Failed { error, .. } => error.clone(),
                    _ => "unknown error".to_string(),
                };
                let note = format!(
                    "crash note: the run exited abnormally ({error}); possible partial work, resume with: conclave spawn resume {id}"
                );
                let summary = format!("{note}\n\n{base_summary}");
                (base_summary, summary)
            }
            _ => (base_summary.clone(), base_summary),
        }
    }

    /// `onSpawnComplete` (spec.md §4.4.3): remove the Active Spawn, decrement
    /// counters, then admit exactly one eligible queued entry.
    fn on_spawn_complete(self: &Arc<Self>, parent_profile: &str, child_profile: &str, id: SpawnId) {
        let admitted = {
            let mut state = self.state.lock();
            state.active.remove(&id);
            state.decrement(parent_profile, child_profile);

            let running_by_parent = state.running_by_parent.clone();
            let instances_by_child = state.instances_by_child.clone();
            state.queue.take_first_eligible(|pending| {
                can_admit(
                    running_by_parent.get(&pending.parent_profile).copied().unwrap_or(0),
                    pending.parallel_cap,
                    instances_by_child.get(&pending.child_profile).copied().unwrap_or(0),
                    pending.instance_cap,
                )
            })
        };
        self.emit_spawn_set_changed();

        if let Some(pending) = admitted {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.state.lock().increment(&pending.parent_profile, &pending.child_profile);
                let (entry, role) = match this.validate(&pending.request).await {
                    Ok(pair) => pair,
                    Err(e) => {
                        this.rollback_admission(&pending.parent_profile, &pending.child_profile);
                        let _ = pending.reply.send(Err(e));
                        return;
                    }
                };
                let new_id = this.id_gen.next();
                let result = this.start_spawn(new_id, pending.request, entry, role).await;
                let _ = pending.reply.send(result);
            });
        }
    }

    async fn interrupt_watcher(store: Arc<dyn Store>, active: Arc<ActiveSpawn>, stop: CancellationToken) {
        loop {
            tokio::select! {
                _ = stop.cancelled() => return,
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
            match store.take_pending_interrupt(active.id).await {
                Ok(Some(message)) => {
                    active.mailbox.deliver(message);
                    active.cancel.cancel();
                }
                Ok(None) => {}
                Err(e) => warn!(spawn_id = %active.id, error = %e, "interrupt watcher store read failed"),
            }
        }
    }

    async fn timeout_watch(duration: Duration, active: Arc<ActiveSpawn>, stop: CancellationToken, timed_out: Arc<std::sync::atomic::AtomicBool>) {
        tokio::select! {
            _ = stop.cancelled() => {}
            _ = tokio::time::sleep(duration) => {
                timed_out.store(true, std::sync::atomic::Ordering::SeqCst);
                active.cancel.cancel();
            }
        }
    }

    /// `Wait(parentTurnId)` (spec.md §4.4.5): poll the store every 250ms
    /// until every spawn for the turn is terminal.
    pub async fn wait(&self, parent_turn_id: &TurnId) -> Result<Vec<SpawnRecord>, OrchestratorError> {
        loop {
            let records = self.store.list_spawns_for_turn(parent_turn_id).await?;
            if records.iter().all(|r| r.status.is_terminal()) {
                return Ok(records);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// `WaitAny(parentTurnId)` (spec.md §4.4.5): block until at least one
    /// non-terminal spawn for the parent becomes terminal, the caller's
    /// context is canceled, or (if configured) the review interval elapses.
    pub async fn wait_any(&self, parent_turn_id: &TurnId, cancel: &CancellationToken) -> Result<WaitAnyOutcome, OrchestratorError> {
        let mut seen_terminal: HashSet<SpawnId> = HashSet::new();
        loop {
            if cancel.is_cancelled() {
                return Ok(WaitAnyOutcome::Completed {
                    newly_terminal: Vec::new(),
                    more_pending: false,
                });
            }
            let records = self.store.list_spawns_for_turn(parent_turn_id).await?;
            let newly_terminal: Vec<SpawnRecord> = records
                .iter()
                .filter(|r| r.status.is_terminal() && !seen_terminal.contains(&r.id))
                .cloned()
                .collect();
            if !newly_terminal.is_empty() {
                for r in &newly_terminal {
                    seen_terminal.insert(r.id);
                }
                let more_pending = records.iter().any(|r| !r.status.is_terminal());
                return Ok(WaitAnyOutcome::Completed { newly_terminal, more_pending });
            }

            let wait_slice = self.review_interval.unwrap_or(POLL_INTERVAL);
            tokio::select! {
                _ = cancel.cancelled() => continue,
                _ = tokio::time::sleep(wait_slice) => {}
            }
            if self.review_interval.is_some() {
                let running: Vec<(SpawnId, Duration)> = {
                    let state = self.state.lock();
                    state
                        .active
                        .values()
                        .filter(|a| a.parent_turn_id() == *parent_turn_id)
                        .map(|a| (a.id, a.elapsed()))
                        .collect()
                };
                if !running.is_empty() {
                    return Ok(WaitAnyOutcome::Review { running });
                }
            }
        }
    }

    /// `WaitOne(spawnId)` (spec.md §4.4.5): wait on the Active Spawn's
    /// completion signal if registered, else poll the store.
    pub async fn wait_one(&self, spawn_id: SpawnId) -> Result<SpawnRecord, OrchestratorError> {
        let active = self.state.lock().active.get(&spawn_id).cloned();
        if let Some(active) = active {
            active.wait_completed().await;
        }
        loop {
            if let Some(record) = self.store.get_spawn(spawn_id).await? {
                if record.status.is_terminal() {
                    return Ok(record);
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// `InterruptSpawn(spawnId, msg)` (spec.md §4.4.5): deliver into the
    /// mailbox and cancel the spawn's context.
    pub async fn interrupt_spawn(&self, spawn_id: SpawnId, message: &str) -> Result<(), OrchestratorError> {
        self.store.set_pending_interrupt(spawn_id, message).await?;
        if let Some(active) = self.state.lock().active.get(&spawn_id).cloned() {
            active.mailbox.deliver(message);
            active.cancel.cancel();
            Ok(())
        } else {
            Err(OrchestratorError::UnknownSpawn(spawn_id))
        }
    }

    /// `Cancel(spawnId)` (spec.md §4.4.5): cancel without delivering a
    /// message.
    pub fn cancel(&self, spawn_id: SpawnId) -> Result<(), OrchestratorError> {
        match self.state.lock().active.get(&spawn_id).cloned() {
            Some(active) => {
                active.cancel.cancel();
                Ok(())
            }
            None => Err(OrchestratorError::UnknownSpawn(spawn_id)),
        }
    }

    /// `ReparentSpawn(spawnId, newParentTurnId)` (spec.md §4.4.5):
    /// atomically update the parent-turn pointer in the store and, if the
    /// spawn is active, in the in-memory entry too (so `WaitAny`'s review
    /// checkpoints, keyed by `ActiveSpawn::parent_turn_id`, follow the
    /// handoff instead of reporting under the stale parent).
    pub async fn reparent_spawn(&self, spawn_id: SpawnId, new_parent_turn_id: &TurnId) -> Result<(), OrchestratorError> {
        self.store.reparent_spawn(spawn_id, new_parent_turn_id).await?;
        if let Some(active) = self.state.lock().active.get(&spawn_id).cloned() {
            active.set_parent_turn_id(new_parent_turn_id.clone());
        }
        Ok(())
    }

    /// `CleanupStaleWorktrees` (spec.md §4.4.5): union of (a) workspaces of
    /// spawns the store reports as `{completed, failed, merged, rejected}`
    /// and (b) untracked workspace directories older than `ttl`; delegates
    /// the actual removal to the Workspace Manager's `CleanupStale`, which
    /// implements tier (b) itself given the dead-path set computed here for
    /// tier (a).
    pub async fn cleanup_stale_worktrees(&self, ttl: Duration) -> Result<usize, OrchestratorError> {
        let terminal = self.store.list_terminal_spawns().await?;
        let dead_paths: HashSet<PathBuf> = terminal.into_iter().filter_map(|r| r.workspace_path).collect();
        Ok(self.workspace.cleanup_stale(ttl, &dead_paths).await?)
    }

    /// `Merge(spawnId, message)`: transition a completed spawn to `merged`
    /// and invoke the Workspace Manager's merge.
    pub async fn merge(&self, spawn_id: SpawnId, message: &str) -> Result<String, OrchestratorError> {
        let mut record = self
            .store
            .get_spawn(spawn_id)
            .await?
            .ok_or(OrchestratorError::UnknownSpawn(spawn_id))?;
        record.status = apply_merge(record.status).map_err(|e| OrchestratorError::Validation(e.to_string()))?;
        let branch = record
            .branch_name
            .clone()
            .ok_or_else(|| OrchestratorError::Validation("spawn has no branch to merge".into()))?;
        let commit = self.workspace.merge(&branch, message).await?;
        record.merge_commit = Some(commit.clone());
        self.store.put_spawn(&record).await?;
        Ok(commit)
    }

    /// `Reject(spawnId)`: cancel if running, delete workspace and branch,
    /// transition to `rejected`.
    pub async fn reject(&self, spawn_id: SpawnId) -> Result<(), OrchestratorError> {
        if let Some(active) = self.state.lock().active.get(&spawn_id).cloned() {
            active.cancel.cancel();
            active.wait_completed().await;
        }
        let mut record = self
            .store
            .get_spawn(spawn_id)
            .await?
            .ok_or(OrchestratorError::UnknownSpawn(spawn_id))?;
        record.status = apply_reject(record.status).map_err(|e| OrchestratorError::Validation(e.to_string()))?;
        if let Some(path) = record.workspace_path.take() {
            self.workspace.remove(&path, record.branch_name.as_deref(), true).await?;
        }
        self.store.put_spawn(&record).await?;
        Ok(())
    }
}

impl ChildTermination {
    /// Build a [`ChildTermination`] from a binding's [`crate::binding::ChildOutcome`]
    /// (spec.md §4.3 "On child-loop termination").
    fn from_outcome(outcome: crate::binding::ChildOutcome) -> Self {
        if outcome.canceled {
            ChildTermination::Canceled { exit_code: outcome.exit_code }
        } else if let Some(error) = outcome.error {
            ChildTermination::Failed {
                exit_code: outcome.exit_code,
                error,
            }
        } else {
            ChildTermination::Completed {
                exit_code: outcome.exit_code.unwrap_or(0),
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
