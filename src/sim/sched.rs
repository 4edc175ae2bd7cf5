//! Virtual-time timer set
//!
//! Phase pacing (intro beats, reward hold) is scheduled against the
//! simulation clock instead of real timers. Tests fast-forward by ticking;
//! disposal cancels everything, so no callback can ever outlive a session.

/// What to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Intro base delay elapsed: play the ready cue and start the drumroll
    IntroReady,
    /// Drumroll finished: wait one reveal beat
    IntroDrumrollDone,
    /// Reveal the next target letter
    IntroReveal,
    /// Reward hold elapsed: despawn, bump score, start the next intro
    RewardDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    at_ms: f64,
    kind: TimerKind,
}

/// Cancelable set of pending virtual timers
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at_ms: f64, kind: TimerKind) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, at_ms, kind });
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.entries.retain(|e| e.id != id);
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Remove and return all timers due at or before `now_ms`, in firing order
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<TimerKind> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.at_ms <= now_ms {
                due.push(e.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.at_ms
                .partial_cmp(&b.at_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        due.into_iter().map(|e| e.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut sched = Scheduler::new();
        sched.schedule(200.0, TimerKind::IntroDrumrollDone);
        sched.schedule(100.0, TimerKind::IntroReady);
        assert_eq!(sched.drain_due(50.0), vec![]);
        assert_eq!(
            sched.drain_due(250.0),
            vec![TimerKind::IntroReady, TimerKind::IntroDrumrollDone]
        );
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_cancel_one() {
        let mut sched = Scheduler::new();
        let a = sched.schedule(100.0, TimerKind::IntroReady);
        sched.schedule(100.0, TimerKind::RewardDone);
        sched.cancel(a);
        assert_eq!(sched.drain_due(100.0), vec![TimerKind::RewardDone]);
    }

    #[test]
    fn test_cancel_all_silences_everything() {
        let mut sched = Scheduler::new();
        sched.schedule(10.0, TimerKind::IntroReady);
        sched.schedule(20.0, TimerKind::IntroReveal);
        sched.cancel_all();
        assert_eq!(sched.drain_due(f64::MAX), vec![]);
    }

    #[test]
    fn test_drain_is_exactly_once() {
        let mut sched = Scheduler::new();
        sched.schedule(100.0, TimerKind::IntroReveal);
        assert_eq!(sched.drain_due(100.0).len(), 1);
        assert_eq!(sched.drain_due(100.0).len(), 0);
    }
}
