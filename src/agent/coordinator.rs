//! The poll-cycle coordinator.
//!
//! Owns the registry, the extraction boundary, the repositories, the
//! process guard, and the session state. Nothing below this module is
//! allowed to crash the process: per-key, per-item, and per-candidate
//! failures are caught here and surfaced through `PollResult::error`
//! and the session error counter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audit::{AuditLogger, DecisionOutcome};
use crate::config::GlobalConfig;
use crate::extract::{composite_text, deadline, ExtractionContext, Extractor};
use crate::integrations::IntegrationRegistry;
use crate::models::extraction::ExtractedTask;
use crate::models::item::{ActionableItem, SourceType};
use crate::models::poll::PollResult;
use crate::models::suggestion::{ItemContext, PendingSuggestion};
use crate::models::task::{Task, TaskPriority, TaskSource};
use crate::persistence::initiative_repo::InitiativeRepo;
use crate::persistence::recommendation_repo::RecommendationRepo;
use crate::persistence::suggestion_repo::SuggestionRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::policy::{self, AutonomyLevel};
use crate::scoring;
use crate::{AppError, Result};

use super::guard::ProcessGuard;
use super::reasoning;
use super::recommend;
use super::session::{AgentSessionState, AgentStatus, SessionStats};

/// Cadence of the background priority recalculation job.
const RECALC_INTERVAL: Duration = Duration::from_secs(3600);

/// Characters of item body retained as the suggestion snippet.
const SNIPPET_LIMIT: usize = 200;

/// Top-level orchestrator for polling, extraction, and task creation.
pub struct Agent {
    config: Arc<GlobalConfig>,
    registry: Arc<IntegrationRegistry>,
    extractor: Arc<dyn Extractor>,
    audit: Arc<dyn AuditLogger>,
    tasks: TaskRepo,
    suggestions: SuggestionRepo,
    initiatives: InitiativeRepo,
    recommendations: RecommendationRepo,
    guard: ProcessGuard,
    session: Mutex<AgentSessionState>,
    autonomy: Mutex<AutonomyLevel>,
    /// Single-flight guard: a scheduled trigger that fires while a cycle
    /// is still in flight is skipped instead of overlapping it.
    cycle_lock: tokio::sync::Mutex<()>,
    cancel: Mutex<Option<CancellationToken>>,
    /// Handle back to the owning `Arc`, cloned into the spawned jobs.
    weak: Weak<Agent>,
}

impl Agent {
    /// Construct an agent over the given collaborators.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        registry: IntegrationRegistry,
        extractor: Arc<dyn Extractor>,
        audit: Arc<dyn AuditLogger>,
        db: Arc<SqlitePool>,
    ) -> Arc<Self> {
        let guard = ProcessGuard::new(config.lock_path());
        let autonomy = config.autonomy;
        Arc::new_cyclic(|weak| Self {
            registry: Arc::new(registry),
            extractor,
            audit,
            tasks: TaskRepo::new(Arc::clone(&db)),
            suggestions: SuggestionRepo::new(Arc::clone(&db)),
            initiatives: InitiativeRepo::new(Arc::clone(&db)),
            recommendations: RecommendationRepo::new(db),
            guard,
            session: Mutex::new(AgentSessionState::default()),
            autonomy: Mutex::new(autonomy),
            cycle_lock: tokio::sync::Mutex::new(()),
            cancel: Mutex::new(None),
            weak: weak.clone(),
            config,
        })
    }

    /// The process guard, exposed for the CLI `stop` command.
    #[must_use]
    pub fn guard(&self) -> &ProcessGuard {
        &self.guard
    }

    /// Start the agent: acquire the process guard, reset session state,
    /// and schedule the poll, recommendation, and recalculation jobs.
    /// The first poll cycle runs immediately.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the agent is already running in
    /// this process or another live process holds the lock.
    pub async fn start(&self, level: Option<AutonomyLevel>) -> Result<AgentStatus> {
        if let Some(level) = level {
            self.set_level(level);
        }
        if self.with_session(|s| s.running) {
            return Err(AppError::Conflict(
                "agent already running in this process".to_owned(),
            ));
        }
        self.guard.acquire()?;
        self.with_session(|s| s.reset(Utc::now()));

        let token = CancellationToken::new();
        *lock_or_recover(&self.cancel) = Some(token.clone());
        self.spawn_jobs(token);

        info!(level = %self.level(), "agent started");
        self.status().await
    }

    /// Stop the agent: cancel future scheduled triggers and release the
    /// process guard. An in-flight cycle is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the agent is not running.
    pub async fn stop(&self) -> Result<AgentStatus> {
        if !self.with_session(|s| s.running) {
            return Err(AppError::Conflict("agent is not running".to_owned()));
        }
        if let Some(token) = lock_or_recover(&self.cancel).take() {
            token.cancel();
        }
        self.guard.release()?;
        self.with_session(|s| s.running = false);
        info!("agent stopped");
        self.status().await
    }

    /// Run one poll cycle on demand, waiting for any in-flight cycle to
    /// finish first. Usable while running or stand-alone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a repository listing fails outright;
    /// per-source failures are reported inside the results instead.
    pub async fn poll_now(&self) -> Result<Vec<PollResult>> {
        let _flight = self.cycle_lock.lock().await;
        self.run_cycle().await
    }

    /// Run one recommendation pass on demand.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a repository operation fails.
    pub async fn recommend_now(&self) -> Result<usize> {
        let count = recommend::generate_recommendations(
            &self.tasks,
            &self.initiatives,
            &self.recommendations,
            self.level(),
        )
        .await?;
        self.with_session(|s| s.last_recommendation = Some(Utc::now()));
        Ok(count)
    }

    /// Change the autonomy level in force.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if assembling the status payload fails.
    pub async fn set_autonomy(&self, level: AutonomyLevel) -> Result<AgentStatus> {
        self.set_level(level);
        info!(%level, "autonomy level updated");
        self.status().await
    }

    /// Assemble the status snapshot payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if counting pending records fails.
    pub async fn status(&self) -> Result<AgentStatus> {
        let (running, started_at, last_poll, last_recommendation, session_stats) =
            self.with_session(|s| {
                (
                    s.running,
                    s.started_at,
                    s.last_poll,
                    s.last_recommendation,
                    SessionStats {
                        tasks_created: s.tasks_created,
                        items_processed: s.items_processed,
                        errors: s.errors,
                    },
                )
            });
        let pending_suggestion_count = self.suggestions.count_pending().await?;
        let pending_recommendation_count = self.recommendations.count_pending().await?;
        let sources = self
            .registry
            .source_types()
            .into_iter()
            .map(|source| {
                (
                    source.as_str().to_owned(),
                    self.registry.is_enabled(source, None),
                )
            })
            .collect();

        Ok(AgentStatus {
            running,
            autonomy_level: self.level().as_str().to_owned(),
            started_at,
            last_poll,
            last_recommendation,
            session_stats,
            pending_suggestion_count,
            pending_recommendation_count,
            sources,
        })
    }

    /// List pending suggestions in FIFO review order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_pending_suggestions(&self) -> Result<Vec<PendingSuggestion>> {
        self.suggestions.list_pending().await
    }

    /// Approve the 1-based `index`-th pending suggestion, creating its
    /// task and re-scoring.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an out-of-range index and the
    /// store's `AlreadyResolved`/`Db` errors otherwise.
    pub async fn approve_suggestion(&self, index: usize) -> Result<String> {
        let id = self.pending_id_at(index).await?;
        let task_id = self.suggestions.approve(&id).await?;
        self.with_session(|s| s.tasks_created += 1);
        if let Err(err) = scoring::recalculate_all(&self.tasks, &self.initiatives).await {
            error!(%err, "post-approval recalculation failed");
        }
        info!(suggestion_id = %id, %task_id, "suggestion approved");
        Ok(task_id)
    }

    /// Reject the 1-based `index`-th pending suggestion.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an out-of-range index and the
    /// store's `AlreadyResolved`/`Db` errors otherwise.
    pub async fn reject_suggestion(&self, index: usize) -> Result<()> {
        let id = self.pending_id_at(index).await?;
        self.suggestions.reject(&id).await?;
        info!(suggestion_id = %id, "suggestion rejected");
        Ok(())
    }

    /// Bulk-delete pending suggestions, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear_pending(&self) -> Result<u64> {
        self.suggestions.clear_pending().await
    }

    async fn pending_id_at(&self, index: usize) -> Result<String> {
        let pending = self.suggestions.list_pending().await?;
        index
            .checked_sub(1)
            .and_then(|i| pending.get(i))
            .map(|suggestion| suggestion.id.clone())
            .ok_or_else(|| AppError::NotFound(format!("no pending suggestion at index {index}")))
    }

    /// Spawn the three periodic jobs under one cancellation token.
    ///
    /// The poll job's first tick fires immediately; the recommendation
    /// and recalculation jobs wait one full interval before their first
    /// pass.
    fn spawn_jobs(&self, cancel: CancellationToken) {
        let Some(this) = self.weak.upgrade() else {
            return;
        };
        let poll_interval = Duration::from_secs(self.config.intervals.poll_seconds);
        let agent = Arc::clone(&this);
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        info!("poll job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        agent.try_poll().await;
                    }
                }
            }
        });

        let recommend_interval = Duration::from_secs(self.config.intervals.recommend_seconds);
        let agent = Arc::clone(&this);
        let token = cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(recommend_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        info!("recommendation job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(err) = agent.recommend_now().await {
                            error!(%err, "scheduled recommendation pass failed");
                        }
                    }
                }
            }
        });

        let agent = this;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RECALC_INTERVAL);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("recalculation job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(err) =
                            scoring::recalculate_all(&agent.tasks, &agent.initiatives).await
                        {
                            error!(%err, "scheduled recalculation failed");
                        }
                    }
                }
            }
        });
    }

    /// Scheduled poll trigger: skip if the previous cycle is in flight.
    async fn try_poll(&self) {
        match self.cycle_lock.try_lock() {
            Ok(_flight) => {
                if let Err(err) = self.run_cycle().await {
                    error!(%err, "scheduled poll cycle failed");
                }
            }
            Err(_) => {
                info!("previous poll cycle still in flight, skipping scheduled trigger");
            }
        }
    }

    /// One end-to-end poll cycle. Must be called holding `cycle_lock`.
    async fn run_cycle(&self) -> Result<Vec<PollResult>> {
        let level = self.level();
        info!(%level, "poll cycle starting");
        let outcomes = self.registry.poll_all_detailed().await;

        let mut items_by_source: HashMap<SourceType, Vec<ActionableItem>> = HashMap::new();
        let mut poll_errors: HashMap<SourceType, String> = HashMap::new();
        let mut poll_durations: HashMap<SourceType, Duration> = HashMap::new();
        for outcome in outcomes {
            let source = outcome.key.source;
            *poll_durations.entry(source).or_default() += outcome.duration;
            if let Some(err) = outcome.error {
                self.with_session(|s| s.errors += 1);
                poll_errors.insert(source, err);
            }
            items_by_source
                .entry(source)
                .or_default()
                .extend(outcome.items);
        }

        // One result per registered source, zero-item sources included.
        let mut results = Vec::new();
        for source in self.registry.source_types() {
            let items = items_by_source.remove(&source).unwrap_or_default();
            let processing_started = Instant::now();
            let mut result = PollResult::empty(source);
            result.items_found = items.len();
            result.error = poll_errors.remove(&source);

            if !items.is_empty() {
                self.process_source(source, &items, level, &mut result).await;
            }
            self.with_session(|s| {
                s.items_processed += u64::try_from(items.len()).unwrap_or(u64::MAX);
            });

            let total = poll_durations.remove(&source).unwrap_or_default()
                + processing_started.elapsed();
            result.duration_ms = u64::try_from(total.as_millis()).unwrap_or(u64::MAX);
            results.push(result);
        }

        let created: usize = results.iter().map(|r| r.tasks_created.len()).sum();
        if created > 0 {
            if let Err(err) = scoring::recalculate_all(&self.tasks, &self.initiatives).await {
                error!(%err, "post-cycle recalculation failed");
            }
        }

        self.with_session(|s| s.last_poll = Some(Utc::now()));
        info!(
            sources = results.len(),
            tasks_created = created,
            "poll cycle complete"
        );
        Ok(results)
    }

    /// Process one source's items; a failure on one item is captured in
    /// the result and does not stop the remaining items.
    async fn process_source(
        &self,
        source: SourceType,
        items: &[ActionableItem],
        level: AutonomyLevel,
        result: &mut PollResult,
    ) {
        for item in items {
            if let Err(err) = self.process_item(item, level, result).await {
                warn!(%source, %err, "item processing failed");
                result.error = Some(err.to_string());
                self.with_session(|s| s.errors += 1);
            }
        }
    }

    /// Extraction routing for one item: extract then decide per
    /// candidate; on extraction failure fall back to a basic task under
    /// auto/full autonomy, otherwise skip the item for this cycle.
    async fn process_item(
        &self,
        item: &ActionableItem,
        level: AutonomyLevel,
        result: &mut PollResult,
    ) -> Result<()> {
        let text = composite_text(item);
        let context = ExtractionContext {
            sender: item.sender().map(str::to_owned),
        };
        match self
            .extractor
            .extract(&text, item.source, Some(&context))
            .await
        {
            Ok(candidates) => {
                for candidate in candidates {
                    self.apply_decision(item, &candidate, level, result).await?;
                }
                Ok(())
            }
            Err(err) => {
                self.with_session(|s| s.errors += 1);
                result.error = Some(err.to_string());
                if level.allows_fallback_create() {
                    let task = self.fallback_task(item, &text);
                    if let Some(id) = self.create_task(task).await? {
                        result.tasks_created.push(id);
                    }
                    info!(source = %item.source, "extraction failed, created basic task directly");
                } else {
                    info!(source = %item.source, "extraction failed, item skipped this cycle");
                }
                Ok(())
            }
        }
    }

    /// Run the autonomy gate for one candidate and apply the outcome.
    async fn apply_decision(
        &self,
        item: &ActionableItem,
        candidate: &ExtractedTask,
        level: AutonomyLevel,
        result: &mut PollResult,
    ) -> Result<()> {
        let decision = policy::decide(candidate, level);
        if let Err(err) = self.audit.log_entry(decision.to_record(candidate, level)) {
            warn!(%err, "decision audit write failed");
        }

        match decision.outcome {
            DecisionOutcome::AutoCreate => {
                let task = self.task_from_candidate(item, candidate);
                if let Some(id) = self.create_task(task).await? {
                    result.tasks_created.push(id);
                }
            }
            DecisionOutcome::Suggest => {
                let suggestion = self.suggestion_from_candidate(item, candidate);
                let created = self.suggestions.create(&suggestion).await?;
                result.tasks_suggested.push(created.id);
            }
        }
        Ok(())
    }

    /// Persist a task unless its source fingerprint already produced one.
    async fn create_task(&self, task: Task) -> Result<Option<String>> {
        if let Some(ref fingerprint) = task.source_ref {
            if let Some(existing) = self.tasks.find_by_source_ref(fingerprint).await? {
                info!(task_id = %existing.id, "item already produced a task, skipping duplicate");
                return Ok(None);
            }
        }
        let created = self.tasks.create(&task).await?;
        self.with_session(|s| s.tasks_created += 1);
        Ok(Some(created.id))
    }

    fn task_from_candidate(&self, item: &ActionableItem, candidate: &ExtractedTask) -> Task {
        let mut task = Task::new(candidate.title.clone(), TaskSource::from(item.source));
        task.description = candidate
            .description
            .clone()
            .or_else(|| item.description.clone());
        task.priority = candidate.priority;
        task.due_date = candidate.due_date.or(item.due_hint);
        task.tags = candidate.tags.clone();
        task.account_id = item.account_id.clone();
        task.source_ref = source_fingerprint(item, &candidate.title);
        task
    }

    /// Basic task mapped directly from the item, no LLM involved.
    fn fallback_task(&self, item: &ActionableItem, text: &str) -> Task {
        let mut task = Task::new(item.title.clone(), TaskSource::Agent);
        task.description = item.description.clone();
        task.priority = TaskPriority::from_hint(&item.priority_hint);
        task.due_date = item
            .due_hint
            .or_else(|| deadline::detect_deadline(text, Utc::now()));
        task.tags = item.tags.clone();
        task.account_id = item.account_id.clone();
        task.source_ref = source_fingerprint(item, &item.title);
        task
    }

    fn suggestion_from_candidate(
        &self,
        item: &ActionableItem,
        candidate: &ExtractedTask,
    ) -> PendingSuggestion {
        let reasoning = reasoning::suggestion_reasoning(candidate, item.source);
        let mut suggestion = PendingSuggestion::new(
            candidate.title.clone(),
            item.source,
            candidate.confidence,
            reasoning,
        );
        suggestion.description = candidate
            .description
            .clone()
            .or_else(|| item.description.clone());
        suggestion.priority = candidate.priority;
        suggestion.due_date = candidate.due_date.or(item.due_hint);
        suggestion.tags = candidate.tags.clone();
        suggestion.source_ref = item.source_ref.clone();
        suggestion.source_url = item
            .metadata
            .get("url")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        suggestion.item_context = ItemContext {
            title: Some(item.title.clone()),
            sender: item.sender().map(str::to_owned),
            snippet: item.description.as_ref().map(|body| {
                body.chars().take(SNIPPET_LIMIT).collect()
            }),
        };
        suggestion.account_id = item.account_id.clone();
        suggestion
    }

    fn level(&self) -> AutonomyLevel {
        *lock_or_recover(&self.autonomy)
    }

    fn set_level(&self, level: AutonomyLevel) {
        *lock_or_recover(&self.autonomy) = level;
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut AgentSessionState) -> T) -> T {
        f(&mut lock_or_recover(&self.session))
    }
}

/// Fingerprint of (source, source-ref, title) used for best-effort
/// idempotency. The title keeps distinct candidates from one item apart.
fn source_fingerprint(item: &ActionableItem, title: &str) -> Option<String> {
    let source_ref = item.source_ref.as_deref()?;
    let mut hasher = Sha256::new();
    hasher.update(item.source.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(source_ref.as_bytes());
    hasher.update(b":");
    hasher.update(title.as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}

/// Poisoned session/level mutexes are recovered rather than propagated.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
