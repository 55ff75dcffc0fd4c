//! Debounced autosave with a bounded undo history.
//!
//! Edits to a custom layout stream in far faster than they should be
//! persisted. The controller coalesces them: each change (re)starts a
//! fixed-delay timer, and only the timer firing — or an explicit
//! [`AutosaveController::flush`] — calls the injected persist sink.
//!
//! State transitions on persist success only: the previous snapshot is
//! pushed onto the undo stack and the last-persisted snapshot advances.
//! A failed persist leaves everything untouched, so the user's edits
//! are never silently lost; the pending save stays queued for a retry.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::layout::LayoutConfig;
use crate::types::Timestamp;

/// Delay between the last edit and the persist call.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Maximum number of undo snapshots kept; the oldest is evicted first.
pub const MAX_UNDO_DEPTH: usize = 20;

/// The asynchronous boundary the controller persists through.
#[async_trait]
pub trait PersistSink: Send + Sync {
    async fn persist(&self, config: &LayoutConfig) -> Result<(), CoreError>;
}

/// A scheduled save that has not fired yet.
struct PendingSave {
    /// Identifies which scheduled timer owns this entry; a superseded
    /// timer finds a different generation and backs off.
    generation: u64,
    cancel: CancellationToken,
    config: LayoutConfig,
}

struct AutosaveInner {
    last_persisted: LayoutConfig,
    last_persisted_at: Option<Timestamp>,
    undo: VecDeque<LayoutConfig>,
    pending: Option<PendingSave>,
    next_generation: u64,
}

/// Debounced persistence of one layout's config edits.
///
/// Callers only feed it changes for non-default, non-immutable layouts;
/// the synthetic Default is never persisted.
pub struct AutosaveController {
    delay: Duration,
    sink: Arc<dyn PersistSink>,
    inner: Arc<Mutex<AutosaveInner>>,
}

impl AutosaveController {
    pub fn new(last_persisted: LayoutConfig, sink: Arc<dyn PersistSink>) -> Self {
        Self::with_delay(last_persisted, sink, AUTOSAVE_DEBOUNCE)
    }

    pub fn with_delay(
        last_persisted: LayoutConfig,
        sink: Arc<dyn PersistSink>,
        delay: Duration,
    ) -> Self {
        Self {
            delay,
            sink,
            inner: Arc::new(Mutex::new(AutosaveInner {
                last_persisted,
                last_persisted_at: None,
                undo: VecDeque::new(),
                pending: None,
                next_generation: 0,
            })),
        }
    }

    /// Record an edited config. Equal to the last-persisted snapshot is
    /// a no-op; otherwise any pending save is superseded and the
    /// debounce timer restarts. Must be called on a tokio runtime.
    pub fn note_change(&self, config: &LayoutConfig) {
        let (generation, cancel) = {
            let mut inner = self.inner.lock().unwrap();
            if *config == inner.last_persisted {
                return;
            }
            if let Some(previous) = inner.pending.take() {
                previous.cancel.cancel();
            }
            let generation = inner.next_generation;
            inner.next_generation += 1;
            let cancel = CancellationToken::new();
            inner.pending = Some(PendingSave {
                generation,
                cancel: cancel.clone(),
                config: config.clone(),
            });
            (generation, cancel)
        };

        let inner = Arc::clone(&self.inner);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    fire(&inner, &sink, generation).await;
                }
            }
        });
    }

    /// Persist the pending save immediately, if any. This is also the
    /// manual retry path after a failed autosave.
    pub async fn flush(&self) -> Result<(), CoreError> {
        let pending = {
            let mut inner = self.inner.lock().unwrap();
            inner.pending.take()
        };
        let Some(pending) = pending else {
            return Ok(());
        };
        pending.cancel.cancel();
        persist_now(&self.inner, &self.sink, pending).await
    }

    /// Pop the most recent undo snapshot. The popped config becomes the
    /// new last-persisted snapshot so subsequent change detection diffs
    /// against what the caller is about to apply.
    pub fn undo(&self) -> Option<LayoutConfig> {
        let mut inner = self.inner.lock().unwrap();
        let config = inner.undo.pop_back()?;
        inner.last_persisted = config.clone();
        Some(config)
    }

    /// Re-seat the controller on a different layout: cancel any pending
    /// save, drop the undo history, and start diffing against `config`.
    pub fn reset(&self, config: LayoutConfig) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pending) = inner.pending.take() {
            pending.cancel.cancel();
        }
        inner.undo.clear();
        inner.last_persisted = config;
        inner.last_persisted_at = None;
    }

    /// Cancel any pending save. Used at session teardown so no stale
    /// persist fires afterwards.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(pending) = inner.pending.take() {
            pending.cancel.cancel();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.inner.lock().unwrap().pending.is_some()
    }

    pub fn undo_depth(&self) -> usize {
        self.inner.lock().unwrap().undo.len()
    }

    pub fn last_persisted(&self) -> LayoutConfig {
        self.inner.lock().unwrap().last_persisted.clone()
    }

    pub fn last_persisted_at(&self) -> Option<Timestamp> {
        self.inner.lock().unwrap().last_persisted_at
    }
}

/// Timer body: claim the pending save (if this timer still owns it) and
/// persist.
async fn fire(inner: &Arc<Mutex<AutosaveInner>>, sink: &Arc<dyn PersistSink>, generation: u64) {
    let pending = {
        let mut guard = inner.lock().unwrap();
        match &guard.pending {
            Some(p) if p.generation == generation => guard.pending.take(),
            _ => None,
        }
    };
    if let Some(pending) = pending {
        // Failure is logged inside; the pending save was re-queued for
        // the next edit or a manual flush.
        let _ = persist_now(inner, sink, pending).await;
    }
}

async fn persist_now(
    inner: &Arc<Mutex<AutosaveInner>>,
    sink: &Arc<dyn PersistSink>,
    pending: PendingSave,
) -> Result<(), CoreError> {
    match sink.persist(&pending.config).await {
        Ok(()) => {
            let mut guard = inner.lock().unwrap();
            let previous = std::mem::replace(&mut guard.last_persisted, pending.config);
            if guard.undo.len() == MAX_UNDO_DEPTH {
                guard.undo.pop_front();
            }
            guard.undo.push_back(previous);
            guard.last_persisted_at = Some(Utc::now());
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Autosave persist failed, keeping edits queued");
            let mut guard = inner.lock().unwrap();
            // Re-queue unless a newer edit already took the slot.
            if guard.pending.is_none() {
                guard.pending = Some(pending);
            }
            Err(CoreError::Internal("Layout autosave failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_layout_config;
    use crate::types::EntityType;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Sink that records every persisted config and can be told to fail.
    #[derive(Default)]
    struct RecordingSink {
        persisted: Mutex<Vec<LayoutConfig>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl PersistSink for RecordingSink {
        async fn persist(&self, config: &LayoutConfig) -> Result<(), CoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Internal("backend unavailable".to_string()));
            }
            self.persisted.lock().unwrap().push(config.clone());
            Ok(())
        }
    }

    fn base_config() -> LayoutConfig {
        default_layout_config(EntityType::Unit)
    }

    /// A config that differs from the base by one widget's height.
    fn edited(h: u32) -> LayoutConfig {
        let mut config = base_config();
        config.widgets[0].h = h;
        config
    }

    fn controller(sink: &Arc<RecordingSink>) -> AutosaveController {
        AutosaveController::new(base_config(), Arc::clone(sink) as Arc<dyn PersistSink>)
    }

    #[tokio::test(start_paused = true)]
    async fn persists_once_after_the_debounce_delay() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        autosave.note_change(&edited(7));
        assert!(autosave.has_pending());
        assert!(sink.persisted.lock().unwrap().is_empty());

        tokio::time::sleep(AUTOSAVE_DEBOUNCE + Duration::from_millis(100)).await;

        assert_eq!(sink.persisted.lock().unwrap().as_slice(), &[edited(7)]);
        assert!(!autosave.has_pending());
        assert_eq!(autosave.last_persisted(), edited(7));
        assert!(autosave.last_persisted_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_the_last_one() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        autosave.note_change(&edited(5));
        tokio::time::sleep(Duration::from_millis(500)).await;
        autosave.note_change(&edited(6));
        tokio::time::sleep(Duration::from_millis(500)).await;
        autosave.note_change(&edited(7));

        // First two timers were superseded before their deadlines.
        tokio::time::sleep(AUTOSAVE_DEBOUNCE + Duration::from_millis(100)).await;
        assert_eq!(sink.persisted.lock().unwrap().as_slice(), &[edited(7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_config_schedules_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        autosave.note_change(&base_config());
        assert!(!autosave.has_pending());

        tokio::time::sleep(AUTOSAVE_DEBOUNCE * 2).await;
        assert!(sink.persisted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_pending_save() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        autosave.note_change(&edited(7));
        autosave.shutdown();

        tokio::time::sleep(AUTOSAVE_DEBOUNCE * 2).await;
        assert!(sink.persisted.lock().unwrap().is_empty());
        assert!(!autosave.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_persist_leaves_state_unchanged_and_retryable() {
        let sink = Arc::new(RecordingSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let autosave = controller(&sink);

        autosave.note_change(&edited(7));
        tokio::time::sleep(AUTOSAVE_DEBOUNCE + Duration::from_millis(100)).await;

        // Nothing moved: snapshot, undo stack and timestamp are as before.
        assert_eq!(autosave.last_persisted(), base_config());
        assert_eq!(autosave.undo_depth(), 0);
        assert!(autosave.last_persisted_at().is_none());
        // The edit is still queued for a manual retry.
        assert!(autosave.has_pending());

        sink.fail.store(false, Ordering::SeqCst);
        autosave.flush().await.unwrap();
        assert_eq!(sink.persisted.lock().unwrap().as_slice(), &[edited(7)]);
        assert_eq!(autosave.last_persisted(), edited(7));
    }

    #[tokio::test(start_paused = true)]
    async fn undo_walks_back_through_persisted_snapshots() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        autosave.note_change(&edited(5));
        autosave.flush().await.unwrap();
        autosave.note_change(&edited(6));
        autosave.flush().await.unwrap();

        // Most recent snapshot first.
        assert_eq!(autosave.undo(), Some(edited(5)));
        // The popped config is the new diff base, so re-applying it is a no-op.
        autosave.note_change(&edited(5));
        assert!(!autosave.has_pending());

        assert_eq!(autosave.undo(), Some(base_config()));
        assert_eq!(autosave.undo(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn undo_stack_is_bounded_with_fifo_eviction() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);

        for h in 0..(MAX_UNDO_DEPTH as u32 + 5) {
            autosave.note_change(&edited(30 + h));
            autosave.flush().await.unwrap();
        }
        assert_eq!(autosave.undo_depth(), MAX_UNDO_DEPTH);

        // The newest snapshot comes back first...
        assert_eq!(
            autosave.undo(),
            Some(edited(30 + MAX_UNDO_DEPTH as u32 + 3))
        );
        // ...and the oldest entries (base and the first edits) were evicted.
        let mut last = None;
        while let Some(config) = autosave.undo() {
            last = Some(config);
        }
        assert_eq!(last, Some(edited(34)));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_with_nothing_pending_is_a_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = controller(&sink);
        autosave.flush().await.unwrap();
        assert!(sink.persisted.lock().unwrap().is_empty());
    }
}
