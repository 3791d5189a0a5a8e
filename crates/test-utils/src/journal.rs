use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Something a test task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Shared context for test workflows: an ordered log of task events plus
/// a live/peak count of running tasks.
#[derive(Debug, Default)]
pub struct Journal {
    events: Mutex<Vec<Event>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&self, name: &str) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.push(Event::Started(name.to_string()));
    }

    pub fn record_finish(&self, name: &str) {
        self.push(Event::Finished(name.to_string()));
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Names of tasks that started, in order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn times_started(&self, name: &str) -> usize {
        self.started().iter().filter(|n| *n == name).count()
    }

    pub fn has_started(&self, name: &str) -> bool {
        self.times_started(name) > 0
    }

    /// Index of `event` in the log.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    /// Assert `before` finished before `after` started.
    pub fn assert_ran_before(&self, before: &str, after: &str) {
        let finished = self
            .position(&Event::Finished(before.to_string()))
            .unwrap_or_else(|| panic!("{before} never finished: {:?}", self.events()));
        let started = self
            .position(&Event::Started(after.to_string()))
            .unwrap_or_else(|| panic!("{after} never started: {:?}", self.events()));
        assert!(
            finished < started,
            "{before} should finish before {after} starts: {:?}",
            self.events()
        );
    }

    /// Highest number of tasks observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
