//! Cancellable one-shot and repeating timers
//!
//! Tasks are plain data ([`TimerTask`]); the board pops due tasks with
//! [`Scheduler::pop_due`] and dispatches them itself. A cancelled task never
//! fires, so a handler only ever sees tasks that are still owned by someone.

use std::time::Duration;

use crate::types::TileId;

/// Work item carried by a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// One step of the live crossfade
    FadeTick,
    /// Put a faded-out tile's volume back to full
    VolumeRestore(TileId),
}

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Cancel the task; returns false if it already fired or was cancelled
    pub fn cancel(self, scheduler: &mut Scheduler) -> bool {
        scheduler.cancel(self)
    }
}

/// A task whose deadline has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTask {
    pub handle: TaskHandle,
    pub task: TimerTask,
    /// When the task was due (not when it was popped)
    pub deadline: Duration,
}

#[derive(Debug)]
struct Entry {
    handle: TaskHandle,
    deadline: Duration,
    interval: Option<Duration>,
    task: TimerTask,
}

/// Timer queue for the board's event loop
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once at `at`
    pub fn schedule_once(&mut self, at: Duration, task: TimerTask) -> TaskHandle {
        self.insert(at, None, task)
    }

    /// Run `task` at `first` and then every `interval` until cancelled
    pub fn schedule_repeating(
        &mut self,
        first: Duration,
        interval: Duration,
        task: TimerTask,
    ) -> TaskHandle {
        // A zero interval would make pop_due spin forever
        let interval = interval.max(Duration::from_millis(1));
        self.insert(first, Some(interval), task)
    }

    fn insert(&mut self, deadline: Duration, interval: Option<Duration>, task: TimerTask) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        log::trace!("Scheduler: {:?} {:?} due at {:?}", handle, task, deadline);
        self.entries.push(Entry {
            handle,
            deadline,
            interval,
            task,
        });
        handle
    }

    /// Cancel a task; returns false if it is no longer pending
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        let removed = self.entries.len() != before;
        if removed {
            log::trace!("Scheduler: cancelled {:?}", handle);
        }
        removed
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Number of live tasks
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Earliest deadline among live tasks
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Take the earliest task due at or before `now`
    ///
    /// Ties are broken by scheduling order. A repeating task stays queued
    /// with its deadline moved forward by one interval.
    pub fn pop_due(&mut self, now: Duration) -> Option<DueTask> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.handle.0))
            .map(|(i, _)| i)?;

        let entry = &self.entries[index];
        let due = DueTask {
            handle: entry.handle,
            task: entry.task,
            deadline: entry.deadline,
        };

        match entry.interval {
            Some(interval) => self.entries[index].deadline += interval,
            None => {
                self.entries.swap_remove(index);
            }
        }

        Some(due)
    }
}
