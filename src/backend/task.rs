use std::{
    cmp,
    collections::{BinaryHeap, HashMap, VecDeque},
    sync::atomic::{self, AtomicUsize},
    time::Instant,
};

static TIMER_AUTO_INCREMENT: AtomicUsize = AtomicUsize::new(0);

/// One outstanding timer per concern; scheduling a concern again replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Pinch released; drop the prop unless the pinch resumes first.
    PinchGrace,
    /// Protective bounce in flight; lock the prop back down.
    ProtectiveSettle,
}

struct AppTimer {
    pub not_before: Instant,
    pub id: usize,
    pub kind: TimerKind,
}

impl PartialEq<Self> for AppTimer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == cmp::Ordering::Equal
    }
}
impl PartialOrd<Self> for AppTimer {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Eq for AppTimer {}
impl Ord for AppTimer {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.not_before
            .cmp(&other.not_before)
            .then(self.id.cmp(&other.id))
            .reverse()
    }
}

#[derive(Default)]
pub struct TimerQueue {
    timers: BinaryHeap<AppTimer>,
    live: HashMap<TimerKind, usize>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `not_before`, cancelling any earlier timer of the same kind.
    /// Multiple timers due at the same instant fire in order of submission.
    pub fn schedule_at(&mut self, kind: TimerKind, not_before: Instant) {
        let id = TIMER_AUTO_INCREMENT.fetch_add(1, atomic::Ordering::Relaxed);
        if self.live.insert(kind, id).is_some() {
            log::trace!("Timer {:?} rescheduled", kind);
        }
        self.timers.push(AppTimer {
            not_before,
            id,
            kind,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let cancelled = self.live.remove(&kind).is_some();
        if cancelled {
            log::trace!("Timer {:?} cancelled", kind);
        }
        cancelled
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.live.contains_key(&kind)
    }

    pub fn retrieve_due(&mut self, now: Instant, dest_buf: &mut VecDeque<TimerKind>) {
        while let Some(timer) = self.timers.peek() {
            if timer.not_before > now {
                break;
            }
            let Some(timer) = self.timers.pop() else {
                break;
            };
            // stale entries belong to cancelled or replaced timers
            if self.live.get(&timer.kind) == Some(&timer.id) {
                self.live.remove(&timer.kind);
                dest_buf.push_back(timer.kind);
            }
        }
    }
}
