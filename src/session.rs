use std::time::Instant;

use crate::debounce::{Debouncer, LIVE_UPDATE_WINDOW};
use crate::generate::{GenerateError, GENERATION_FAILED_MESSAGE};
use crate::model::LessonPlan;

/// Top-level coordinator. The single writer of the authoritative document:
/// form edits arrive as whole-plan snapshots and commit only after the
/// debounce quiet period; generation results commit immediately. Every
/// commit is short-circuited by a full equality check, and `revision` only
/// moves when the document actually changed, so observers can treat it as a
/// re-render counter.
#[derive(Debug)]
pub struct Session {
    plan: LessonPlan,
    revision: u64,
    live_updates: Debouncer<LessonPlan>,
    loading: bool,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            plan: LessonPlan::default(),
            revision: 0,
            live_updates: Debouncer::new(LIVE_UPDATE_WINDOW),
            loading: false,
            last_error: None,
        }
    }
}

impl Session {
    pub fn plan(&self) -> &LessonPlan {
        &self.plan
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn commit(&mut self, plan: LessonPlan) -> bool {
        if plan == self.plan {
            return false;
        }
        self.plan = plan;
        self.revision += 1;
        true
    }

    /// A raw form change: buffered, last one wins when the window elapses.
    pub fn note_form_change(&mut self, plan: LessonPlan, now: Instant) {
        self.live_updates.schedule(plan, now);
    }

    /// Debounce tick. Returns whether a buffered update was committed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.live_updates.take_due(now) {
            Some(plan) => self.commit(plan),
            None => false,
        }
    }

    pub fn has_pending_form_change(&self) -> bool {
        self.live_updates.is_pending()
    }

    /// Marks a generation request as in flight. Refuses while one is
    /// already outstanding, so a second submit has no effect.
    pub fn begin_generation(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.last_error = None;
        true
    }

    /// Applies a finished generation. Success commits immediately (no
    /// debounce) and drops any buffered form snapshot, which is stale now
    /// that the form itself is being rewritten; failure leaves the document
    /// untouched and raises the generic banner. Either way the loading
    /// indicator clears.
    pub fn complete_generation(&mut self, result: Result<LessonPlan, GenerateError>) -> bool {
        self.loading = false;
        match result {
            Ok(plan) => {
                self.live_updates.cancel();
                self.last_error = None;
                self.commit(plan)
            }
            Err(_) => {
                self.last_error = Some(GENERATION_FAILED_MESSAGE.to_string());
                false
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn plan_with_topic(topic: &str) -> LessonPlan {
        LessonPlan {
            topic: topic.to_string(),
            ..LessonPlan::default()
        }
    }

    #[test]
    fn rapid_edits_commit_only_the_last_snapshot() {
        let mut s = Session::default();
        let t0 = Instant::now();
        s.note_form_change(plan_with_topic("F"), t0);
        s.note_form_change(plan_with_topic("Fr"), t0 + Duration::from_millis(40));
        s.note_form_change(plan_with_topic("Fruits"), t0 + Duration::from_millis(80));

        assert!(!s.poll(t0 + Duration::from_millis(120)));
        assert_eq!(s.plan().topic, "");

        assert!(s.poll(t0 + Duration::from_millis(300)));
        assert_eq!(s.plan().topic, "Fruits");
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn identical_update_does_not_bump_the_revision() {
        let mut s = Session::default();
        let t0 = Instant::now();
        s.note_form_change(LessonPlan::default(), t0);
        assert!(!s.poll(t0 + Duration::from_millis(200)));
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn second_generation_is_refused_while_one_is_in_flight() {
        let mut s = Session::default();
        assert!(s.begin_generation());
        assert!(!s.begin_generation());
        s.complete_generation(Ok(plan_with_topic("Fruits")));
        assert!(s.begin_generation());
    }

    #[test]
    fn failed_generation_leaves_document_untouched_and_clears_loading() {
        let mut s = Session::default();
        let before = s.plan().clone();
        let rev = s.revision();
        assert!(s.begin_generation());
        s.complete_generation(Err(GenerateError::new("bad_response", "schema mismatch")));
        assert_eq!(s.plan(), &before);
        assert_eq!(s.revision(), rev);
        assert!(!s.is_loading());
        assert_eq!(s.last_error(), Some(GENERATION_FAILED_MESSAGE));
    }

    #[test]
    fn successful_generation_applies_immediately_and_drops_stale_buffer() {
        let mut s = Session::default();
        let t0 = Instant::now();
        s.note_form_change(plan_with_topic("stale"), t0);
        s.begin_generation();
        assert!(s.complete_generation(Ok(plan_with_topic("Fruits"))));
        assert_eq!(s.plan().topic, "Fruits");
        assert!(!s.has_pending_form_change());
        // The stale buffered snapshot must not resurface later.
        assert!(!s.poll(t0 + Duration::from_secs(1)));
        assert_eq!(s.plan().topic, "Fruits");
    }
}
