//! Fragment recorder
//!
//! Builds [`ReportFragment`]s for one actor. Every open frame remembers the
//! frame it was opened within, so steps running concurrently inside the same
//! parent become siblings rather than nesting into each other. Closing a
//! frame attaches the finished fragment to its parent, or hands it to the
//! sink when the parent is gone or there never was one.
//!
//! The frame lock is only held for bookkeeping and never across an await.

use crate::fragment::{FragmentId, Narration, OpenFrame, Outcome, ReportFragment, StepKind};
use crate::sink::ReportSink;
use crate::template;
use parking_lot::Mutex;
use screenplay_format::ObjectFormatter;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Frames {
    next_seq: u64,
    open: Vec<OpenFrame>,
}

/// Per-actor fragment builder
pub struct FragmentRecorder {
    actor: String,
    formatter: Arc<ObjectFormatter>,
    sink: Arc<dyn ReportSink>,
    max_argument_len: Option<usize>,
    log_fragments: bool,
    frames: Mutex<Frames>,
}

impl FragmentRecorder {
    /// Create recorder for `actor`
    #[must_use]
    pub fn new(
        actor: impl Into<String>,
        formatter: Arc<ObjectFormatter>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            actor: actor.into(),
            formatter,
            sink,
            max_argument_len: None,
            log_fragments: false,
            frames: Mutex::new(Frames::default()),
        }
    }

    /// Truncate formatted arguments longer than `max` characters
    #[inline]
    #[must_use]
    pub fn with_max_argument_len(mut self, max: Option<usize>) -> Self {
        self.max_argument_len = max;
        self
    }

    /// Log every emitted fragment at debug level
    #[inline]
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_fragments = enabled;
        self
    }

    /// Actor this recorder belongs to
    #[inline]
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Sink receiving top-level fragments
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn ReportSink> {
        &self.sink
    }

    /// Number of currently open frames
    #[inline]
    #[must_use]
    pub fn open_frames(&self) -> usize {
        self.frames.lock().open.len()
    }

    /// Open a frame for a step inside `parent`
    ///
    /// `None`, or a parent that is not open in this recorder, makes a
    /// top-level frame. Arguments are formatted now, so the narration is
    /// fixed before the step starts executing.
    #[must_use]
    pub fn open(
        &self,
        kind: StepKind,
        narration: &Narration,
        parent: Option<FragmentId>,
    ) -> FrameGuard<'_> {
        let arguments: Vec<String> = narration
            .arguments()
            .iter()
            .map(|value| {
                let rendered = self.formatter.format(value);
                match self.max_argument_len {
                    Some(max) => screenplay_format::truncate(&rendered, max),
                    None => rendered,
                }
            })
            .collect();
        let text = template::render(narration.template(), &self.actor, &arguments);
        let mut frame = OpenFrame::new(
            self.actor.clone(),
            kind,
            narration.template().to_string(),
            arguments,
            text,
        );
        let id = frame.id;

        let mut frames = self.frames.lock();
        frame.parent = parent.filter(|p| frames.open.iter().any(|f| f.id == *p));
        frame.seq = frames.next_seq;
        frames.next_seq += 1;
        frames.open.push(frame);
        tracing::trace!(actor = %self.actor, open = frames.open.len(), %id, "frame opened");

        FrameGuard {
            recorder: self,
            id,
            closed: false,
        }
    }

    /// Close frame `id`
    ///
    /// Its descendants that are still open are closed first as
    /// [`Outcome::Canceled`]. Closing an unknown or already closed frame is a
    /// no-op.
    fn close(&self, id: FragmentId, outcome: Outcome) {
        let emitted: Vec<ReportFragment> = {
            let mut frames = self.frames.lock();
            let Some(pos) = frames.open.iter().position(|f| f.id == id) else {
                return;
            };

            // descendants always open after their ancestors
            let mut doomed = vec![id];
            for frame in &frames.open[pos + 1..] {
                if frame.parent.is_some_and(|p| doomed.contains(&p)) {
                    doomed.push(frame.id);
                }
            }

            let mut emitted = Vec::new();
            for &inner in doomed[1..].iter().rev() {
                emitted.extend(finish_frame(&mut frames.open, inner, Outcome::Canceled));
            }
            emitted.extend(finish_frame(&mut frames.open, id, outcome));
            emitted
        };

        for fragment in emitted {
            if self.log_fragments {
                tracing::debug!(
                    actor = %self.actor,
                    outcome = ?fragment.outcome(),
                    children = fragment.children().len(),
                    "{}",
                    fragment.text()
                );
            }
            self.sink.on_fragment(&fragment);
        }
    }
}

/// Remove and finish frame `id`; returns it if it has no open parent
fn finish_frame(
    open: &mut Vec<OpenFrame>,
    id: FragmentId,
    outcome: Outcome,
) -> Option<ReportFragment> {
    let pos = open.iter().position(|f| f.id == id)?;
    let frame = open.remove(pos);
    let (parent, seq) = (frame.parent, frame.seq);
    let fragment = frame.finish(outcome);

    match parent.and_then(|p| open.iter_mut().find(|f| f.id == p)) {
        Some(parent) => {
            parent.attach(seq, fragment);
            None
        }
        None => Some(fragment),
    }
}

impl std::fmt::Debug for FragmentRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentRecorder")
            .field("actor", &self.actor)
            .field("max_argument_len", &self.max_argument_len)
            .field("open_frames", &self.open_frames())
            .finish_non_exhaustive()
    }
}

/// Handle to an open frame
///
/// Dropping the guard without calling [`FrameGuard::close`] closes the frame
/// as [`Outcome::Canceled`], so a future dropped mid-step still leaves its
/// fragment in the report. A guard dropped while unwinding from a panic
/// closes the frame as failed instead.
#[must_use = "dropping a frame guard cancels the frame"]
pub struct FrameGuard<'a> {
    recorder: &'a FragmentRecorder,
    id: FragmentId,
    closed: bool,
}

impl FrameGuard<'_> {
    /// ID of the fragment this frame will become
    #[inline]
    #[must_use]
    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// Close the frame with `outcome`
    pub fn close(mut self, outcome: Outcome) {
        self.closed = true;
        self.recorder.close(self.id, outcome);
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.closed {
            let outcome = if std::thread::panicking() {
                Outcome::failed("panicked")
            } else {
                Outcome::Canceled
            };
            self.recorder.close(self.id, outcome);
        }
    }
}

impl std::fmt::Debug for FrameGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGuard")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;
    use screenplay_format::Value;

    fn recorder(sink: Arc<MemorySink>) -> FragmentRecorder {
        FragmentRecorder::new("Joe", Arc::new(ObjectFormatter::with_defaults()), sink)
    }

    #[test]
    fn top_level_fragment_goes_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        rec.open(StepKind::Action, &Narration::new("{actor} adds {0}").with(2), None)
            .close(Outcome::Passed);

        let fragments = sink.fragments();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "Joe adds 2");
        assert_eq!(fragments[0].arguments(), ["2".to_string()]);
        assert_eq!(fragments[0].actor(), "Joe");
        assert_eq!(rec.open_frames(), 0);
    }

    #[test]
    fn nested_fragment_attaches_to_parent() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        let outer = rec.open(StepKind::Action, &Narration::new("outer"), None);
        let parent = Some(outer.id());
        rec.open(StepKind::Action, &Narration::new("first"), parent).close(Outcome::Passed);
        rec.open(StepKind::Action, &Narration::new("second"), parent).close(Outcome::Passed);
        assert!(sink.is_empty());
        outer.close(Outcome::Passed);

        let fragments = sink.fragments();
        assert_eq!(fragments.len(), 1);
        let children: Vec<_> = fragments[0].children().iter().map(|f| f.text()).collect();
        assert_eq!(children, vec!["first", "second"]);
        assert_eq!(fragments[0].depth(), 2);
    }

    #[test]
    fn overlapping_siblings_stay_siblings() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        let outer = rec.open(StepKind::Action, &Narration::new("outer"), None);
        let slow = rec.open(StepKind::Action, &Narration::new("slow"), Some(outer.id()));
        let fast = rec.open(StepKind::Action, &Narration::new("fast"), Some(outer.id()));
        fast.close(Outcome::Passed);
        slow.close(Outcome::failed("late"));
        outer.close(Outcome::Passed);

        let root = &sink.fragments()[0];
        assert_eq!(root.depth(), 2);
        let children: Vec<_> = root
            .children()
            .iter()
            .map(|f| (f.text(), f.outcome().clone()))
            .collect();
        assert_eq!(
            children,
            vec![("slow", Outcome::failed("late")), ("fast", Outcome::Passed)]
        );
    }

    #[test]
    fn closing_outer_cancels_only_its_descendants() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        let outer = rec.open(StepKind::Action, &Narration::new("outer"), None);
        let inner = rec.open(StepKind::Action, &Narration::new("inner"), Some(outer.id()));
        let innermost = rec.open(StepKind::Action, &Narration::new("innermost"), Some(inner.id()));
        let unrelated = rec.open(StepKind::Action, &Narration::new("unrelated"), None);
        outer.close(Outcome::Canceled);
        drop(innermost);
        drop(inner);

        let fragments = sink.fragments();
        assert_eq!(fragments.len(), 1);
        let root = &fragments[0];
        assert_eq!(root.depth(), 3);
        assert!(root.walk().iter().all(|f| *f.outcome() == Outcome::Canceled));
        assert_eq!(rec.open_frames(), 1);

        unrelated.close(Outcome::Passed);
        assert_eq!(sink.fragments()[1].outcome(), &Outcome::Passed);
    }

    #[test]
    fn unknown_parent_opens_top_level() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());
        let closed = rec.open(StepKind::Action, &Narration::new("gone"), None);
        let gone = closed.id();
        closed.close(Outcome::Passed);

        rec.open(StepKind::Action, &Narration::new("orphan"), Some(gone))
            .close(Outcome::Passed);

        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn dropped_guard_marks_canceled() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        drop(rec.open(StepKind::Action, &Narration::new("abandoned"), None));

        assert_eq!(sink.fragments()[0].outcome(), &Outcome::Canceled);
    }

    #[test]
    fn guard_dropped_by_panic_marks_failed() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _frame = rec.open(StepKind::Action, &Narration::new("explodes"), None);
            panic!("boom");
        }));

        assert!(result.is_err());
        assert_eq!(sink.fragments()[0].outcome(), &Outcome::failed("panicked"));
    }

    #[test]
    fn arguments_are_truncated() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone()).with_max_argument_len(Some(5));

        rec.open(StepKind::Action, &Narration::new("{actor} types {0}").with("a long sentence"), None)
            .close(Outcome::Passed);

        assert_eq!(sink.fragments()[0].text(), "Joe types a lo…");
    }

    #[test]
    fn absent_argument_uses_sentinel() {
        let sink = Arc::new(MemorySink::new());
        let rec = recorder(sink.clone());

        rec.open(StepKind::Question, &Narration::new("{actor} reads {0}").with(Value::Absent), None)
            .close(Outcome::Passed);

        assert_eq!(sink.fragments()[0].text(), "Joe reads <absent>");
    }
}
