/// Query lifecycle controller
///
/// This module owns the completion session: it asks the classifier whether
/// completion applies at the caret, asks the candidate source for the full
/// table exactly once, and narrows the cached table on every keystroke.
///
/// # Lifecycle
///
/// ```text
/// Idle ──trigger──▶ Triggering ──result──▶ Ready ──refine──▶ Filtering
///                        │                   │                   │
///                        └──────────── dispose / stale ──────────┴──▶ Disposed
/// ```
///
/// 1. **Trigger**: classification and production run on a blocking worker;
///    only `trigger` suspends
/// 2. **Refine**: synchronous filtering of the cached table; the candidate
///    source is never consulted again for the session
/// 3. **Dispose**: on dismissal, acceptance, a caret before the anchor, a
///    non-identifier prefix or an edit upstream of the anchor
///
/// A generation counter identifies the current session. A newer `trigger` or
/// a `dispose` bumps it and cancels the in-flight worker, and a worker result
/// is only published if its generation is still current.
///
/// # Example
///
/// ```ignore
/// use cppcomplete_completion::buffer::TextSnapshot;
/// use cppcomplete_completion::engine::QueryController;
/// use cppcomplete_completion::types::QueryKind;
/// use std::sync::Arc;
///
/// let controller = QueryController::builtin();
/// let snapshot = Arc::new(TextSnapshot::cpp("int main() {\n    "));
/// let anchor = controller.trigger(snapshot.clone(), 17, QueryKind::Basic).await;
/// assert_eq!(anchor, Some(17));
///
/// let (typed, _) = snapshot.edit(17, 0, "re");
/// let visible = controller.refine(&typed, 19);
/// ```
use crate::buffer::{BufferEdit, BufferSnapshot};
use crate::config::CompletionSettings;
use crate::context::{ContextClassifier, CppContextClassifier};
use crate::error::CompletionResult;
use crate::filter::{FilterRequest, PrefixFilter};
use crate::language::LanguageVariant;
use crate::providers::{CandidateSource, KeywordCandidateSource};
use crate::ranker::{CandidateRanker, PriorityRanker};
use crate::token::is_identifier_part;
use crate::types::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Lifecycle state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    /// No session yet
    Idle,
    /// Classification and production in flight
    Triggering,
    /// Candidates cached, initial visible set computed
    Ready,
    /// At least one refine applied
    Filtering,
    /// Session ended; a new trigger may start another
    Disposed,
}

impl QueryState {
    /// Ready or Filtering
    pub fn has_session(&self) -> bool {
        matches!(self, QueryState::Ready | QueryState::Filtering)
    }
}

/// One completion interaction, trigger to disposal
#[derive(Debug, Clone)]
pub struct QuerySession {
    pub anchor_offset: AnchorOffset,
    /// Caret offset the session was triggered at
    pub creation_offset: u32,
    pub context_tag: ContextTag,
    /// Ranked output of the single production; shared, never re-produced
    pub cached_candidates: Option<Arc<Vec<Candidate>>>,
    pub case_sensitive: bool,
    pub query_kind: QueryKind,
    pub generation: u64,
}

/// Outbound completion API
///
/// Presenters hold an `Arc<dyn CompletionQuery>`; [`QueryController`] is the
/// implementation.
#[async_trait]
pub trait CompletionQuery: Send + Sync {
    /// Start a session at `caret`, superseding any current one
    ///
    /// # Returns
    ///
    /// The anchor offset, or `None` if completion does not apply here or the
    /// request was superseded before it finished.
    async fn trigger(
        &self,
        snapshot: Arc<dyn BufferSnapshot>,
        caret: u32,
        kind: QueryKind,
    ) -> Option<AnchorOffset>;

    /// Narrow the cached candidates to the text typed since the anchor
    ///
    /// An empty result means either nothing matches or the session ended;
    /// check [`CompletionQuery::state`] to tell them apart.
    fn refine(&self, buffer: &dyn BufferSnapshot, caret: u32) -> Vec<Candidate>;

    /// Whether `refine` at `caret` can be answered from the cache
    fn can_filter(&self, buffer: &dyn BufferSnapshot, caret: u32) -> bool;

    /// Substitution for accepting `candidate`; ends the session
    fn accept(
        &self,
        buffer: &dyn BufferSnapshot,
        caret: u32,
        candidate: &Candidate,
    ) -> Option<Substitution>;

    /// Report a buffer mutation
    fn notify_edit(&self, edit: BufferEdit);

    /// End the session; idempotent
    fn dispose(&self);

    fn state(&self) -> QueryState;
}

/// Refine requested while the trigger was still in flight
#[derive(Debug, Clone)]
struct PendingRefine {
    caret: u32,
    /// Text typed after the trigger offset, read from the live buffer
    typed: Option<String>,
}

impl PendingRefine {
    fn capture(buffer: &dyn BufferSnapshot, caret: u32, creation_offset: u32) -> Self {
        let typed = caret
            .checked_sub(creation_offset)
            .and_then(|len| buffer.read(creation_offset, len));
        Self { caret, typed }
    }

    /// Prefix for the recorded caret, once the anchor is known
    ///
    /// Text between the anchor and the trigger offset comes from the trigger
    /// snapshot; an edit there would already have disposed the session.
    fn prefix(
        &self,
        snapshot: &dyn BufferSnapshot,
        anchor: AnchorOffset,
        creation_offset: u32,
    ) -> Option<String> {
        if self.caret <= creation_offset {
            return FilterRequest::derive(snapshot, anchor, self.caret).prefix;
        }
        let mut prefix = FilterRequest::derive(snapshot, anchor, creation_offset).prefix?;
        let typed = self.typed.as_deref()?;
        if !typed.chars().all(is_identifier_part) {
            return None;
        }
        prefix.push_str(typed);
        Some(prefix)
    }
}

/// In-flight trigger bookkeeping
#[derive(Debug)]
struct Triggering {
    generation: u64,
    creation_offset: u32,
    cancel: CancellationToken,
    /// Refines received while in flight, in request order
    pending: Vec<PendingRefine>,
}

#[derive(Debug)]
struct ControllerInner {
    state: QueryState,
    session: Option<QuerySession>,
    visible: Vec<(Candidate, MatchKind)>,
    triggering: Option<Triggering>,
}

impl ControllerInner {
    fn new() -> Self {
        Self {
            state: QueryState::Idle,
            session: None,
            visible: Vec::new(),
            triggering: None,
        }
    }

    /// Cancel in-flight work and release the session
    fn release(&mut self) {
        if let Some(triggering) = self.triggering.take() {
            trace!(generation = triggering.generation, "Cancelling in-flight trigger");
            triggering.cancel.cancel();
        }
        self.session = None;
        self.visible = Vec::new();
    }
}

/// Disposes the session if a `trigger` future is dropped before it finishes
struct TriggerGuard<'a> {
    controller: &'a QueryController,
    generation: u64,
    armed: bool,
}

impl TriggerGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.controller.inner.lock();
        if self.controller.generation.load(Ordering::SeqCst) == self.generation {
            debug!(generation = self.generation, "Trigger dropped before completion");
            self.controller.dispose_locked(&mut inner);
        }
    }
}

enum WorkerOutcome {
    Suppressed,
    Cancelled,
    Produced {
        anchor_offset: AnchorOffset,
        context_tag: ContextTag,
        candidates: Vec<Candidate>,
    },
}

/// Stateful completion engine
///
/// One producer drives a controller: requests are totally ordered by the
/// internal lock, and only [`QueryController::trigger`] suspends.
pub struct QueryController {
    classifier: Arc<dyn ContextClassifier>,
    source: Arc<dyn CandidateSource>,
    ranker: Arc<dyn CandidateRanker>,
    settings: CompletionSettings,
    generation: AtomicU64,
    inner: Mutex<ControllerInner>,
}

impl QueryController {
    /// Create a new controller
    ///
    /// # Arguments
    ///
    /// * `classifier` - Decides whether and where completion applies
    /// * `source` - Produces the candidate table once per session
    /// * `ranker` - Orders the produced table once per session
    /// * `settings` - Case sensitivity per content type
    pub fn new(
        classifier: Arc<dyn ContextClassifier>,
        source: Arc<dyn CandidateSource>,
        ranker: Arc<dyn CandidateRanker>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            classifier,
            source,
            ranker,
            settings,
            generation: AtomicU64::new(0),
            inner: Mutex::new(ControllerInner::new()),
        }
    }

    /// C/C++ classifier and priority ranker over `source`, default settings
    pub fn with_source(source: Arc<dyn CandidateSource>) -> Self {
        Self::new(
            Arc::new(CppContextClassifier),
            source,
            Arc::new(PriorityRanker),
            CompletionSettings::default(),
        )
    }

    /// Controller over the built-in keyword table
    pub fn builtin() -> Self {
        Self::with_source(Arc::new(KeywordCandidateSource::builtin()))
    }

    /// Controller whose keyword source is built from `settings`
    pub fn from_settings(settings: CompletionSettings) -> CompletionResult<Self> {
        let source = KeywordCandidateSource::from_settings(&settings)?;
        Ok(Self::new(
            Arc::new(CppContextClassifier),
            Arc::new(source),
            Arc::new(PriorityRanker),
            settings,
        ))
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    /// Start a session at `caret`, superseding any current one
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Buffer snapshot the classifier and prefix read from
    /// * `caret` - Caret offset the completion was requested at
    /// * `kind` - `Basic` shows only the first tier on an empty prefix
    ///
    /// # Returns
    ///
    /// The anchor offset, or `None` if completion is suppressed at the caret,
    /// the request was superseded, or the worker failed.
    pub async fn trigger(
        &self,
        snapshot: Arc<dyn BufferSnapshot>,
        caret: u32,
        kind: QueryKind,
    ) -> Option<AnchorOffset> {
        let cancel = CancellationToken::new();
        let generation = {
            let mut inner = self.inner.lock();
            inner.release();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            inner.state = QueryState::Triggering;
            inner.triggering = Some(Triggering {
                generation,
                creation_offset: caret,
                cancel: cancel.clone(),
                pending: Vec::new(),
            });
            generation
        };
        let mut guard = TriggerGuard {
            controller: self,
            generation,
            armed: true,
        };
        debug!(generation, caret, ?kind, "Completion triggered");

        let classifier = Arc::clone(&self.classifier);
        let source = Arc::clone(&self.source);
        let ranker = Arc::clone(&self.ranker);
        let worker_snapshot = Arc::clone(&snapshot);
        let worker_cancel = cancel.clone();
        let variant = match self.settings.variant {
            Some(_) => None,
            None => LanguageVariant::from_content_type(snapshot.content_type()),
        };

        let result = tokio::task::spawn_blocking(move || {
            let decision = {
                let mut cursor = worker_snapshot.token_cursor();
                classifier.classify(cursor.as_mut(), caret)
            };
            let TriggerDecision::AnchorAt {
                anchor_offset,
                context_tag,
            } = decision
            else {
                return WorkerOutcome::Suppressed;
            };
            if worker_cancel.is_cancelled() {
                return WorkerOutcome::Cancelled;
            }
            let mut candidates = source.produce(context_tag);
            if let Some(variant) = variant {
                candidates.retain(|candidate| variant.accepts(candidate));
            }
            let candidates = ranker.rank(candidates);
            WorkerOutcome::Produced {
                anchor_offset,
                context_tag,
                candidates,
            }
        })
        .await;
        guard.disarm();

        let mut inner = self.inner.lock();
        if self.generation.load(Ordering::SeqCst) != generation || cancel.is_cancelled() {
            debug!(generation, "Dropping superseded completion result");
            return None;
        }
        let Some(triggering) = inner.triggering.take() else {
            return None;
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(generation, error = %err, "Completion worker failed");
                self.dispose_locked(&mut inner);
                return None;
            }
        };

        match outcome {
            WorkerOutcome::Suppressed => {
                debug!(generation, caret, "Completion suppressed at caret");
                inner.state = QueryState::Disposed;
                None
            }
            WorkerOutcome::Cancelled => {
                debug!(generation, "Completion cancelled before production");
                inner.state = QueryState::Disposed;
                None
            }
            WorkerOutcome::Produced {
                anchor_offset,
                context_tag,
                candidates,
            } => {
                let case_sensitive = self.settings.case_sensitive(snapshot.content_type());
                let refined = !triggering.pending.is_empty();
                let prefix = if refined {
                    // Replay queued refines in order; any invalid one ends the session
                    triggering
                        .pending
                        .iter()
                        .map(|pending| pending.prefix(&*snapshot, anchor_offset, caret))
                        .try_fold(None, |_, prefix| prefix.map(Some))
                        .flatten()
                } else {
                    FilterRequest::derive(&*snapshot, anchor_offset, caret).prefix
                };
                let Some(prefix) = prefix else {
                    debug!(generation, anchor_offset, "Prefix invalid when result landed");
                    self.dispose_locked(&mut inner);
                    return None;
                };

                let visible = PrefixFilter::filter_with_match_kind(
                    &candidates,
                    Some(&prefix),
                    case_sensitive,
                    kind.tier_only_if_empty(),
                );
                debug!(
                    generation,
                    anchor_offset,
                    ?context_tag,
                    produced = candidates.len(),
                    visible = visible.len(),
                    "Completion session ready"
                );

                inner.session = Some(QuerySession {
                    anchor_offset,
                    creation_offset: caret,
                    context_tag,
                    cached_candidates: Some(Arc::new(candidates)),
                    case_sensitive,
                    query_kind: kind,
                    generation,
                });
                inner.visible = visible;
                inner.state = if refined {
                    QueryState::Filtering
                } else {
                    QueryState::Ready
                };
                Some(anchor_offset)
            }
        }
    }

    /// Narrow the cached candidates to the text typed since the anchor
    ///
    /// Never calls the candidate source. While the trigger is in flight the
    /// request is queued and an empty vector is returned; that empty result
    /// does not mean the session ended, so check [`QueryController::state`].
    /// Queued requests are replayed in order when the result lands: the last
    /// one decides the visible set, and any one with an invalid prefix
    /// disposes the session.
    pub fn refine(&self, buffer: &dyn BufferSnapshot, caret: u32) -> Vec<Candidate> {
        let mut inner = self.inner.lock();
        match inner.state {
            QueryState::Triggering => {
                if let Some(triggering) = inner.triggering.as_mut() {
                    trace!(caret, "Recording refine while triggering");
                    let pending = PendingRefine::capture(buffer, caret, triggering.creation_offset);
                    triggering.pending.push(pending);
                }
                Vec::new()
            }
            QueryState::Ready | QueryState::Filtering => {
                let Some(session) = inner.session.as_ref() else {
                    return Vec::new();
                };
                let request = FilterRequest::derive(buffer, session.anchor_offset, caret);
                let (Some(prefix), Some(cached)) = (request.prefix, session.cached_candidates.clone())
                else {
                    debug!(
                        anchor_offset = session.anchor_offset,
                        caret, "Caret left the completion prefix"
                    );
                    self.dispose_locked(&mut inner);
                    return Vec::new();
                };

                let visible = PrefixFilter::filter_with_match_kind(
                    &cached,
                    Some(&prefix),
                    session.case_sensitive,
                    session.query_kind.tier_only_if_empty(),
                );
                trace!(prefix = %prefix, visible = visible.len(), "Refined completion");
                inner.visible = visible;
                inner.state = QueryState::Filtering;
                inner.visible.iter().map(|(c, _)| c.clone()).collect()
            }
            QueryState::Idle | QueryState::Disposed => Vec::new(),
        }
    }

    /// True iff a session is ready and the prefix at `caret` is valid
    pub fn can_filter(&self, buffer: &dyn BufferSnapshot, caret: u32) -> bool {
        let inner = self.inner.lock();
        if !inner.state.has_session() {
            return false;
        }
        inner
            .session
            .as_ref()
            .is_some_and(|session| FilterRequest::derive(buffer, session.anchor_offset, caret).prefix.is_some())
    }

    /// The current visible set
    pub fn visible(&self) -> Vec<Candidate> {
        self.inner
            .lock()
            .visible
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// The current visible set with each candidate's match kind
    pub fn visible_with_match_kind(&self) -> Vec<(Candidate, MatchKind)> {
        self.inner.lock().visible.clone()
    }

    /// Replace `[anchor, caret)` with the candidate text and end the session
    pub fn accept(
        &self,
        buffer: &dyn BufferSnapshot,
        caret: u32,
        candidate: &Candidate,
    ) -> Option<Substitution> {
        let mut inner = self.inner.lock();
        if !inner.state.has_session() {
            return None;
        }
        let anchor_offset = inner.session.as_ref()?.anchor_offset;
        let substitution = caret
            .checked_sub(anchor_offset)
            .filter(|len| buffer.read(anchor_offset, *len).is_some())
            .map(|replace_len| Substitution {
                anchor_offset,
                replace_len,
                text: candidate.text.clone(),
            });
        debug!(anchor_offset, caret, accepted = %candidate.text, "Completion accepted");
        self.dispose_locked(&mut inner);
        substitution
    }

    /// Dispose if `edit` touches text before the anchor, or before the
    /// trigger offset while the trigger is in flight
    pub fn notify_edit(&self, edit: BufferEdit) {
        let mut inner = self.inner.lock();
        let boundary = match inner.state {
            QueryState::Triggering => inner.triggering.as_ref().map(|t| t.creation_offset),
            QueryState::Ready | QueryState::Filtering => {
                inner.session.as_ref().map(|s| s.anchor_offset)
            }
            QueryState::Idle | QueryState::Disposed => None,
        };
        if let Some(boundary) = boundary {
            if edit.is_upstream_of(boundary) {
                debug!(?edit, boundary, "Edit upstream of completion anchor");
                self.dispose_locked(&mut inner);
            }
        }
    }

    /// End the session from any state; idempotent
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        self.dispose_locked(&mut inner);
    }

    fn dispose_locked(&self, inner: &mut ControllerInner) {
        if inner.state == QueryState::Disposed {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(generation, from = ?inner.state, "Disposing completion session");
        inner.release();
        inner.state = QueryState::Disposed;
    }

    pub fn state(&self) -> QueryState {
        self.inner.lock().state
    }

    pub fn anchor_offset(&self) -> Option<AnchorOffset> {
        let inner = self.inner.lock();
        inner.session.as_ref().map(|s| s.anchor_offset)
    }

    pub fn context_tag(&self) -> Option<ContextTag> {
        let inner = self.inner.lock();
        inner.session.as_ref().map(|s| s.context_tag)
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Option<QuerySession> {
        self.inner.lock().session.clone()
    }

    /// Current session generation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Drop for QueryController {
    fn drop(&mut self) {
        self.inner.get_mut().release();
    }
}

#[async_trait]
impl CompletionQuery for QueryController {
    async fn trigger(
        &self,
        snapshot: Arc<dyn BufferSnapshot>,
        caret: u32,
        kind: QueryKind,
    ) -> Option<AnchorOffset> {
        QueryController::trigger(self, snapshot, caret, kind).await
    }

    fn refine(&self, buffer: &dyn BufferSnapshot, caret: u32) -> Vec<Candidate> {
        QueryController::refine(self, buffer, caret)
    }

    fn can_filter(&self, buffer: &dyn BufferSnapshot, caret: u32) -> bool {
        QueryController::can_filter(self, buffer, caret)
    }

    fn accept(
        &self,
        buffer: &dyn BufferSnapshot,
        caret: u32,
        candidate: &Candidate,
    ) -> Option<Substitution> {
        QueryController::accept(self, buffer, caret, candidate)
    }

    fn notify_edit(&self, edit: BufferEdit) {
        QueryController::notify_edit(self, edit)
    }

    fn dispose(&self) {
        QueryController::dispose(self)
    }

    fn state(&self) -> QueryState {
        QueryController::state(self)
    }
}
