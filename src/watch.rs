use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::models::Job;

pub const JOB_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const LIST_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Where job snapshots come from. The watcher only needs these two calls,
/// so tests can script a source instead of standing up a server.
pub trait JobSource: Send + 'static {
    fn fetch_job(&self, id: &str) -> Result<Job, ApiError>;
    fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError>;
}

impl JobSource for ApiClient {
    fn fetch_job(&self, id: &str) -> Result<Job, ApiError> {
        self.get_job(id)
    }

    fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.list_jobs()
    }
}

// --- Reconciliation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The snapshot replaced the tracked record.
    Changed,
    /// Identical to the tracked record; nothing to re-render.
    Unchanged,
    /// The backend reported a non-terminal status after a terminal one.
    /// The terminal record wins and the snapshot is dropped.
    TerminalRevertIgnored,
}

/// Tracks the latest accepted snapshot of one job. Each accepted snapshot
/// replaces the record wholesale; fields are never merged across polls.
/// Terminal statuses are sticky: once completed or failed, a snapshot
/// claiming an earlier phase is ignored.
#[derive(Debug, Default)]
pub struct JobTracker {
    current: Option<Job>,
}

impl JobTracker {
    pub fn observe(&mut self, incoming: Job) -> Observation {
        match &self.current {
            Some(current) if current.status.is_terminal() && !incoming.status.is_terminal() => {
                Observation::TerminalRevertIgnored
            }
            Some(current) if *current == incoming => Observation::Unchanged,
            _ => {
                self.current = Some(incoming);
                Observation::Changed
            }
        }
    }

    pub fn current(&self) -> Option<&Job> {
        self.current.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|job| job.status.is_terminal())
    }
}

// --- Background watcher ---

#[derive(Debug)]
pub enum WatchEvent {
    /// A changed, non-terminal snapshot of the watched job.
    Job(Job),
    /// A changed snapshot of the whole job list.
    Jobs(Vec<Job>),
    /// A poll failed. Transient by definition; the watcher keeps polling
    /// at the same interval.
    Error(ApiError),
    /// The job reached a terminal status. Carries the final record; the
    /// watcher stops after sending this.
    Finished(Job),
}

/// Owns the polling thread. Dropping the handle cancels the watcher and
/// joins the thread; a poll already in flight is allowed to finish first.
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    event_rx: mpsc::Receiver<WatchEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl WatchHandle {
    /// Block until the next event. None once the watcher has stopped.
    pub fn recv(&self) -> Option<WatchEvent> {
        self.event_rx.recv().ok()
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn spawn_watcher<F>(work: F) -> WatchHandle
where
    F: FnOnce(mpsc::Sender<WatchEvent>, mpsc::Receiver<()>) + Send + 'static,
{
    let (event_tx, event_rx) = mpsc::channel();
    let (stop_tx, stop_rx) = mpsc::channel();
    let worker = thread::spawn(move || work(event_tx, stop_rx));
    WatchHandle {
        stop_tx,
        event_rx,
        worker: Some(worker),
    }
}

/// Sleep that wakes early when the handle stops the watcher.
/// Returns false when it is time to exit.
fn wait_for_tick(stop_rx: &mpsc::Receiver<()>, interval: Duration) -> bool {
    matches!(
        stop_rx.recv_timeout(interval),
        Err(mpsc::RecvTimeoutError::Timeout)
    )
}

/// Poll one job until it reaches a terminal status or the handle is
/// dropped. The first fetch happens immediately; exactly one request is
/// in flight at any time, so snapshots cannot arrive out of order.
pub fn watch_job<S: JobSource>(
    source: S,
    job_id: impl Into<String>,
    interval: Duration,
) -> WatchHandle {
    let job_id = job_id.into();
    spawn_watcher(move |event_tx, stop_rx| {
        let mut tracker = JobTracker::default();
        loop {
            match source.fetch_job(&job_id) {
                Ok(job) => match tracker.observe(job) {
                    Observation::Changed => {
                        if let Some(current) = tracker.current() {
                            if tracker.is_done() {
                                let _ = event_tx.send(WatchEvent::Finished(current.clone()));
                                return;
                            }
                            if event_tx.send(WatchEvent::Job(current.clone())).is_err() {
                                return;
                            }
                        }
                    }
                    Observation::Unchanged => {}
                    Observation::TerminalRevertIgnored => {
                        log::warn!("job {job_id}: ignoring status revert after terminal state");
                    }
                },
                Err(err) => {
                    if event_tx.send(WatchEvent::Error(err)).is_err() {
                        return;
                    }
                }
            }
            if !wait_for_tick(&stop_rx, interval) {
                return;
            }
        }
    })
}

/// Poll the whole job list until the handle is dropped. Emits only when
/// the list actually changed.
pub fn watch_jobs<S: JobSource>(source: S, interval: Duration) -> WatchHandle {
    spawn_watcher(move |event_tx, stop_rx| {
        let mut last: Option<Vec<Job>> = None;
        loop {
            match source.fetch_jobs() {
                Ok(jobs) => {
                    if last.as_ref() != Some(&jobs) {
                        last = Some(jobs.clone());
                        if event_tx.send(WatchEvent::Jobs(jobs)).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    if event_tx.send(WatchEvent::Error(err)).is_err() {
                        return;
                    }
                }
            }
            if !wait_for_tick(&stop_rx, interval) {
                return;
            }
        }
    })
}

/// Convenience for one-shot waiting: poll until terminal and return the
/// final record. Transient errors are logged and retried.
pub fn wait_for_job<S: JobSource>(
    source: S,
    job_id: impl Into<String>,
    interval: Duration,
    mut on_event: impl FnMut(&WatchEvent),
) -> Option<Job> {
    let handle = watch_job(source, job_id, interval);
    while let Some(event) = handle.recv() {
        on_event(&event);
        if let WatchEvent::Finished(job) = event {
            handle.stop();
            return Some(job);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const FAST: Duration = Duration::from_millis(1);

    fn job(status: JobStatus, progress: u8, lead_count: usize) -> Job {
        Job {
            id: "j-1".to_string(),
            status,
            progress,
            message: String::new(),
            created_at: None,
            completed_at: None,
            leads: (0..lead_count)
                .map(|i| crate::models::Lead {
                    id: Some(format!("l-{i}")),
                    company: format!("Company {i}"),
                    contact_name: "Contact".to_string(),
                    email: format!("c{i}@example.com"),
                    phone: None,
                    industry: None,
                    location: None,
                    confidence: 0.9,
                    source: None,
                    status: None,
                    starred: false,
                })
                .collect(),
            error: None,
        }
    }

    /// Replays a fixed script, one entry per poll, repeating the last
    /// entry forever. Counts polls so tests can assert the watcher
    /// actually stopped.
    struct ScriptedSource {
        polls: Arc<AtomicUsize>,
        script: Vec<Result<Job, u16>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Job, u16>>) -> (Self, Arc<AtomicUsize>) {
            let polls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    polls: polls.clone(),
                    script,
                },
                polls,
            )
        }

        fn entry(&self) -> Result<Job, ApiError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.script.len() - 1);
            match &self.script[idx] {
                Ok(job) => Ok(job.clone()),
                Err(status) => Err(ApiError::Status {
                    status: *status,
                    status_text: "Service Unavailable".to_string(),
                }),
            }
        }
    }

    impl JobSource for ScriptedSource {
        fn fetch_job(&self, _id: &str) -> Result<Job, ApiError> {
            self.entry()
        }

        fn fetch_jobs(&self) -> Result<Vec<Job>, ApiError> {
            self.entry().map(|job| vec![job])
        }
    }

    fn drain(handle: &WatchHandle) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn tracker_replaces_record_wholesale() {
        let mut tracker = JobTracker::default();
        let mut first = job(JobStatus::Processing, 40, 0);
        first.message = "crawling sources".to_string();
        assert_eq!(tracker.observe(first), Observation::Changed);

        // The second snapshot has no message; nothing from the first
        // survives the replacement.
        let second = job(JobStatus::Processing, 80, 0);
        assert_eq!(tracker.observe(second), Observation::Changed);
        let current = tracker.current().unwrap();
        assert_eq!(current.progress, 80);
        assert_eq!(current.message, "");
    }

    #[test]
    fn tracker_ignores_identical_snapshots() {
        let mut tracker = JobTracker::default();
        tracker.observe(job(JobStatus::Started, 0, 0));
        assert_eq!(
            tracker.observe(job(JobStatus::Started, 0, 0)),
            Observation::Unchanged
        );
        assert_eq!(tracker.current().unwrap().status, JobStatus::Started);
    }

    #[test]
    fn tracker_keeps_terminal_status_sticky() {
        let mut tracker = JobTracker::default();
        tracker.observe(job(JobStatus::Completed, 100, 2));
        assert_eq!(
            tracker.observe(job(JobStatus::Processing, 50, 0)),
            Observation::TerminalRevertIgnored
        );

        let current = tracker.current().unwrap();
        assert_eq!(current.status, JobStatus::Completed);
        assert_eq!(current.leads.len(), 2);
        assert!(tracker.is_done());

        // Unknown is not terminal, so it cannot displace a terminal record.
        assert_eq!(
            tracker.observe(job(JobStatus::Unknown, 0, 0)),
            Observation::TerminalRevertIgnored
        );
    }

    #[test]
    fn watcher_stops_at_terminal_status() {
        let (source, polls) = ScriptedSource::new(vec![
            Ok(job(JobStatus::Processing, 40, 0)),
            Ok(job(JobStatus::Processing, 40, 0)),
            Ok(job(JobStatus::Completed, 100, 1)),
        ]);
        let handle = watch_job(source, "j-1", FAST);
        let events = drain(&handle);

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], WatchEvent::Job(j) if j.progress == 40));
        assert!(matches!(
            &events[1],
            WatchEvent::Finished(j) if j.status == JobStatus::Completed
        ));
        // The terminal poll was the last one.
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn already_terminal_job_finishes_on_first_poll() {
        let (source, polls) = ScriptedSource::new(vec![Ok(job(JobStatus::Failed, 100, 0))]);
        let handle = watch_job(source, "j-1", FAST);
        let events = drain(&handle);

        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            WatchEvent::Finished(j) if j.status == JobStatus::Failed
        ));
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_errors_do_not_stop_polling() {
        let (source, _) = ScriptedSource::new(vec![
            Err(503),
            Ok(job(JobStatus::Processing, 10, 0)),
            Err(503),
            Ok(job(JobStatus::Completed, 100, 0)),
        ]);
        let handle = watch_job(source, "j-1", FAST);
        let events = drain(&handle);

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], WatchEvent::Error(_)));
        assert!(matches!(events[1], WatchEvent::Job(_)));
        assert!(matches!(events[2], WatchEvent::Error(_)));
        assert!(matches!(events[3], WatchEvent::Finished(_)));
    }

    #[test]
    fn full_lifecycle_reaches_completed_with_leads() {
        let (source, polls) = ScriptedSource::new(vec![
            Ok(job(JobStatus::Started, 0, 0)),
            Ok(job(JobStatus::Processing, 40, 0)),
            Ok(job(JobStatus::Processing, 80, 0)),
            Ok(job(JobStatus::Completed, 100, 3)),
        ]);
        let final_job = wait_for_job(source, "j-1", FAST, |_| {}).unwrap();

        assert_eq!(final_job.status, JobStatus::Completed);
        assert_eq!(final_job.leads.len(), 3);
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn dropping_the_handle_stops_the_worker() {
        let (source, polls) = ScriptedSource::new(vec![Ok(job(JobStatus::Processing, 10, 0))]);
        let handle = watch_job(source, "j-1", Duration::from_millis(5));
        // First snapshot proves the worker is running.
        assert!(handle.recv().is_some());
        handle.stop();

        let after_stop = polls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(polls.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn list_watcher_emits_only_on_change() {
        let (source, _) = ScriptedSource::new(vec![
            Ok(job(JobStatus::Processing, 10, 0)),
            Ok(job(JobStatus::Processing, 10, 0)),
            Ok(job(JobStatus::Processing, 90, 0)),
        ]);
        let handle = watch_jobs(source, FAST);

        let first = handle.recv();
        assert!(matches!(&first, Some(WatchEvent::Jobs(jobs)) if jobs[0].progress == 10));
        let second = handle.recv();
        assert!(matches!(&second, Some(WatchEvent::Jobs(jobs)) if jobs[0].progress == 90));
        handle.stop();
    }
}
