//! Focus timer.
//!
//! A self-contained counter the embedding UI advances once per second of
//! wall-clock time. Elapsed seconds are folded into the task's
//! `time_spent` only when the timer is stopped; the session layer
//! guarantees a running timer is flushed before another one starts.

use taskforge_shared::types::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTimer {
    task_id: TaskId,
    seconds: u64,
}

impl FocusTimer {
    pub fn start(task_id: TaskId) -> Self {
        Self {
            task_id,
            seconds: 0,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Advance by one second.
    pub fn tick(&mut self) {
        self.seconds += 1;
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.seconds
    }

    /// Consume the timer, yielding the task and the seconds to bank.
    pub fn finish(self) -> (TaskId, u64) {
        (self.task_id, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_accumulate() {
        let mut timer = FocusTimer::start(TaskId::new());
        for _ in 0..90 {
            timer.tick();
        }
        assert_eq!(timer.elapsed_secs(), 90);
    }

    #[test]
    fn finish_yields_task_and_elapsed() {
        let id = TaskId::new();
        let mut timer = FocusTimer::start(id);
        timer.tick();
        timer.tick();

        let (task_id, secs) = timer.finish();
        assert_eq!(task_id, id);
        assert_eq!(secs, 2);
    }
}
