// ── Process monitor ───────────────────────────────────────────────────────────
//
// Starts the target executable on a background thread and decides when the
// loader window should close:
//   • a top-level window titled exactly like the target's appears → close;
//   • the target process exits before that → close, silently;
//   • the target cannot be started at all → error dialog, then close.
//
// The monitor never touches a window itself.  Everything it wants from the UI
// goes through a `LoaderSink`, which the Win32 layer implements by posting
// messages into the UI thread's queue.  The window lookup and the process are
// behind traits as well, so the polling logic runs (and is tested) without a
// desktop.
//
// No `unsafe` in this module.

pub(crate) mod process;

use std::{
    io,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, info, warn};

use crate::progress::ProgressTicker;

// ── Seams ─────────────────────────────────────────────────────────────────────

/// The loader window, as seen from the monitor thread.
///
/// Implementations must be cheap and non-blocking: each call is a request
/// queued for the UI thread, not a synchronous UI operation.
pub(crate) trait LoaderSink: Send + 'static {
    /// Move the progress indicator to `position` (`0..100`).
    fn set_progress(&self, position: u32);

    /// Ask the loader window to close.
    fn close(&self);

    /// The target could not be started: show the error dialog, then close.
    fn fail_launch(&self);
}

/// Answers "is the target's main window up yet?".
pub(crate) trait WindowProbe: Send + 'static {
    /// `true` if any top-level window has exactly this title.
    fn window_exists(&self, title: &str) -> bool;
}

/// A started target process whose exit can be observed (never controlled).
pub(crate) trait TargetProcess {
    fn status(&mut self) -> io::Result<ProcessStatus>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessStatus {
    Running,
    /// Exited with this code; `None` when the platform reports no code.
    Exited(Option<i32>),
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// How a monitor run ended.  Only used for logging and tests: the loader
/// window receives the same close request in every terminal case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MonitorOutcome {
    /// The target's window appeared after `ticks` progress updates.
    TargetReady { ticks: u32 },
    /// The target exited before its window appeared.
    TargetExited { code: Option<i32>, ticks: u32 },
    /// The target could not be spawned; polling never started.
    LaunchFailed,
    /// The loader asked the monitor to stop.
    Cancelled { ticks: u32 },
}

// ── Watch loop ────────────────────────────────────────────────────────────────

/// Everything one monitor run needs, injected at spawn time.
pub(crate) struct Watch<S, P> {
    pub(crate) sink: S,
    pub(crate) probe: P,
    pub(crate) target_title: String,
    pub(crate) poll_interval: Duration,
}

impl<S: LoaderSink, P: WindowProbe> Watch<S, P> {
    /// Launch the target and poll until the loader should close or `stop`
    /// fires.  The close request is sent at most once.
    pub(crate) fn launch_and_watch<T, L>(self, launch: L, stop: &Receiver<()>) -> MonitorOutcome
    where
        T: TargetProcess,
        L: FnOnce() -> io::Result<T>,
    {
        let mut target = match launch() {
            Ok(target) => target,
            Err(e) => {
                warn!("target launch failed: {e}");
                self.sink.fail_launch();
                return MonitorOutcome::LaunchFailed;
            }
        };

        let mut ticker = ProgressTicker::new();
        let mut ticks = 0u32;

        loop {
            self.sink.set_progress(ticker.advance());
            ticks += 1;

            if self.probe.window_exists(&self.target_title) {
                info!("window {:?} found after {ticks} ticks", self.target_title);
                self.sink.close();
                return MonitorOutcome::TargetReady { ticks };
            }

            match target.status() {
                Ok(ProcessStatus::Running) => {}
                Ok(ProcessStatus::Exited(code)) => {
                    info!("target exited before showing its window (code {code:?})");
                    self.sink.close();
                    return MonitorOutcome::TargetExited { code, ticks };
                }
                Err(e) => {
                    // Cannot tell whether it is still alive; stop waiting on it.
                    warn!("querying target status failed: {e}");
                    self.sink.close();
                    return MonitorOutcome::TargetExited { code: None, ticks };
                }
            }

            match stop.recv_timeout(self.poll_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("monitor stopped by loader after {ticks} ticks");
                    return MonitorOutcome::Cancelled { ticks };
                }
            }
        }
    }
}

// ── Thread handle ─────────────────────────────────────────────────────────────

/// Owner of the monitor thread.  Dropping it without `stop` detaches the
/// thread, but the next wait then sees a disconnected channel and ends it.
pub(crate) struct MonitorHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<MonitorOutcome>,
}

impl MonitorHandle {
    /// Start `watch` on a dedicated `process-monitor` thread.
    pub(crate) fn spawn<S, P, T, L>(watch: Watch<S, P>, launch: L) -> io::Result<Self>
    where
        S: LoaderSink,
        P: WindowProbe,
        T: TargetProcess,
        L: FnOnce() -> io::Result<T> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let join = thread::Builder::new()
            .name("process-monitor".to_owned())
            .spawn(move || watch.launch_and_watch(launch, &stop_rx))?;
        Ok(Self { stop_tx, join })
    }

    /// Ask the monitor to stop and wait for it.
    ///
    /// Returns within one poll interval.  `None` if the thread panicked.
    pub(crate) fn stop(self) -> Option<MonitorOutcome> {
        // The monitor may already be gone; a closed channel is fine.
        let _ = self.stop_tx.send(());
        self.join.join().ok()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc, Mutex,
        },
        time::Instant,
    };

    use super::*;

    /// Records every request the monitor makes of the loader window.
    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<SinkEvent>>>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SinkEvent {
        Progress(u32),
        Close,
        LaunchFailed,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<SinkEvent> {
            self.events.lock().expect("sink lock").clone()
        }

        fn count(&self, wanted: SinkEvent) -> usize {
            self.events().iter().filter(|e| **e == wanted).count()
        }

        fn progress_ticks(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, SinkEvent::Progress(_)))
                .count()
        }
    }

    impl LoaderSink for RecordingSink {
        fn set_progress(&self, position: u32) {
            self.events
                .lock()
                .expect("sink lock")
                .push(SinkEvent::Progress(position));
        }

        fn close(&self) {
            self.events.lock().expect("sink lock").push(SinkEvent::Close);
        }

        fn fail_launch(&self) {
            self.events
                .lock()
                .expect("sink lock")
                .push(SinkEvent::LaunchFailed);
        }
    }

    /// Reports the window as present from the `appears_on`-th lookup onwards.
    struct CountingProbe {
        calls: Arc<AtomicU32>,
        appears_on: Option<u32>,
        expected_title: &'static str,
    }

    impl CountingProbe {
        fn never() -> Self {
            Self {
                calls: Arc::default(),
                appears_on: None,
                expected_title: "TUCAN MAX",
            }
        }

        fn on_call(n: u32) -> Self {
            Self {
                appears_on: Some(n),
                ..Self::never()
            }
        }
    }

    impl WindowProbe for CountingProbe {
        fn window_exists(&self, title: &str) -> bool {
            assert_eq!(title, self.expected_title);
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.appears_on.is_some_and(|on| n >= on)
        }
    }

    /// Reports the window once `delay` has passed since construction.
    struct DelayedWindow {
        since: Instant,
        delay: Duration,
    }

    impl WindowProbe for DelayedWindow {
        fn window_exists(&self, _title: &str) -> bool {
            self.since.elapsed() >= self.delay
        }
    }

    /// Plays back a fixed list of status answers, then stays running.
    struct ScriptedProcess {
        script: VecDeque<io::Result<ProcessStatus>>,
    }

    impl ScriptedProcess {
        fn running() -> Self {
            Self {
                script: VecDeque::new(),
            }
        }

        fn exits_after(polls: usize, code: Option<i32>) -> Self {
            let mut script: VecDeque<_> = (0..polls).map(|_| Ok(ProcessStatus::Running)).collect();
            script.push_back(Ok(ProcessStatus::Exited(code)));
            Self { script }
        }
    }

    impl TargetProcess for ScriptedProcess {
        fn status(&mut self) -> io::Result<ProcessStatus> {
            self.script
                .pop_front()
                .unwrap_or(Ok(ProcessStatus::Running))
        }
    }

    fn watch(sink: RecordingSink, probe: CountingProbe, interval: Duration) -> Watch<RecordingSink, CountingProbe> {
        Watch {
            sink,
            probe,
            target_title: "TUCAN MAX".to_owned(),
            poll_interval: interval,
        }
    }

    #[test]
    fn window_found_closes_once_and_stops_polling() {
        let sink = RecordingSink::default();
        let probe = CountingProbe::on_call(3);
        let calls = Arc::clone(&probe.calls);
        let (_stop_tx, stop_rx) = mpsc::channel();

        let outcome = watch(sink.clone(), probe, Duration::ZERO)
            .launch_and_watch(|| Ok(ScriptedProcess::running()), &stop_rx);

        assert_eq!(outcome, MonitorOutcome::TargetReady { ticks: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Progress(5),
                SinkEvent::Progress(10),
                SinkEvent::Progress(15),
                SinkEvent::Close,
            ]
        );
    }

    #[test]
    fn launch_failure_reports_once_and_never_polls() {
        let sink = RecordingSink::default();
        let probe = CountingProbe::never();
        let calls = Arc::clone(&probe.calls);
        let (_stop_tx, stop_rx) = mpsc::channel();

        let outcome = watch(sink.clone(), probe, Duration::ZERO).launch_and_watch(
            || -> io::Result<ScriptedProcess> { Err(io::ErrorKind::NotFound.into()) },
            &stop_rx,
        );

        assert_eq!(outcome, MonitorOutcome::LaunchFailed);
        assert_eq!(sink.events(), vec![SinkEvent::LaunchFailed]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn early_exit_closes_silently() {
        let sink = RecordingSink::default();
        let (_stop_tx, stop_rx) = mpsc::channel();

        let outcome = watch(sink.clone(), CountingProbe::never(), Duration::ZERO)
            .launch_and_watch(|| Ok(ScriptedProcess::exits_after(4, Some(1))), &stop_rx);

        assert_eq!(
            outcome,
            MonitorOutcome::TargetExited {
                code: Some(1),
                ticks: 5
            }
        );
        assert_eq!(sink.count(SinkEvent::Close), 1);
        assert_eq!(sink.count(SinkEvent::LaunchFailed), 0);
        assert_eq!(sink.events().last(), Some(&SinkEvent::Close));
    }

    #[test]
    fn window_check_wins_over_exit_check_in_the_same_tick() {
        let sink = RecordingSink::default();
        let (_stop_tx, stop_rx) = mpsc::channel();

        let outcome = watch(sink.clone(), CountingProbe::on_call(1), Duration::ZERO)
            .launch_and_watch(|| Ok(ScriptedProcess::exits_after(0, Some(0))), &stop_rx);

        assert_eq!(outcome, MonitorOutcome::TargetReady { ticks: 1 });
        assert_eq!(sink.count(SinkEvent::Close), 1);
    }

    #[test]
    fn status_query_error_closes_the_loader() {
        let sink = RecordingSink::default();
        let (_stop_tx, stop_rx) = mpsc::channel();
        let failing = ScriptedProcess {
            script: VecDeque::from([Err(io::Error::other("access denied"))]),
        };

        let outcome = watch(sink.clone(), CountingProbe::never(), Duration::ZERO)
            .launch_and_watch(move || Ok(failing), &stop_rx);

        assert_eq!(
            outcome,
            MonitorOutcome::TargetExited {
                code: None,
                ticks: 1
            }
        );
        assert_eq!(sink.count(SinkEvent::Close), 1);
    }

    #[test]
    fn progress_wraps_every_twenty_ticks() {
        let sink = RecordingSink::default();
        let (_stop_tx, stop_rx) = mpsc::channel();

        watch(sink.clone(), CountingProbe::on_call(41), Duration::ZERO)
            .launch_and_watch(|| Ok(ScriptedProcess::running()), &stop_rx);

        let positions: Vec<u32> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(positions.len(), 41);
        assert_eq!(positions[19], 0);
        assert_eq!(positions[39], 0);
        assert_eq!(positions[40], 5);
        assert!(positions.iter().all(|p| *p < 100));
    }

    #[test]
    fn stop_signal_ends_a_run_that_would_poll_forever() {
        let sink = RecordingSink::default();
        let handle = MonitorHandle::spawn(
            watch(sink.clone(), CountingProbe::never(), Duration::from_millis(1)),
            || Ok(ScriptedProcess::running()),
        )
        .expect("spawn monitor");

        let deadline = Instant::now() + Duration::from_secs(10);
        while sink.progress_ticks() < 50 {
            assert!(Instant::now() < deadline, "monitor stalled");
            thread::sleep(Duration::from_millis(1));
        }

        let outcome = handle.stop().expect("monitor thread panicked");
        assert!(matches!(outcome, MonitorOutcome::Cancelled { ticks } if ticks >= 50));
        assert_eq!(sink.count(SinkEvent::Close), 0);
    }

    #[test]
    fn polls_every_hundred_milliseconds() {
        let sink = RecordingSink::default();
        let handle = MonitorHandle::spawn(
            watch(sink.clone(), CountingProbe::never(), Duration::from_millis(100)),
            || Ok(ScriptedProcess::running()),
        )
        .expect("spawn monitor");

        thread::sleep(Duration::from_secs(1));
        let outcome = handle.stop().expect("monitor thread panicked");

        let MonitorOutcome::Cancelled { ticks } = outcome else {
            panic!("unexpected outcome: {outcome:?}");
        };
        assert!((9..=11).contains(&ticks), "{ticks} ticks in one second");
        assert_eq!(sink.progress_ticks(), ticks as usize);
        assert_eq!(sink.count(SinkEvent::Close), 0);
    }

    #[test]
    fn window_within_300ms_closes_after_a_few_ticks() {
        let sink = RecordingSink::default();
        let probe = DelayedWindow {
            since: Instant::now(),
            delay: Duration::from_millis(300),
        };
        let (_stop_tx, stop_rx) = mpsc::channel();

        let outcome = Watch {
            sink: sink.clone(),
            probe,
            target_title: "TUCAN MAX".to_owned(),
            poll_interval: Duration::from_millis(100),
        }
        .launch_and_watch(|| Ok(ScriptedProcess::running()), &stop_rx);

        assert!(matches!(outcome, MonitorOutcome::TargetReady { ticks } if ticks <= 4));
        assert!(sink.progress_ticks() <= 4);
        assert_eq!(sink.count(SinkEvent::Close), 1);
        assert_eq!(sink.count(SinkEvent::LaunchFailed), 0);
    }

    #[test]
    fn stop_returns_promptly_during_a_long_interval() {
        let sink = RecordingSink::default();
        let handle = MonitorHandle::spawn(
            watch(sink.clone(), CountingProbe::never(), Duration::from_secs(60)),
            || Ok(ScriptedProcess::running()),
        )
        .expect("spawn monitor");

        let started = Instant::now();
        let outcome = handle.stop().expect("monitor thread panicked");
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(matches!(outcome, MonitorOutcome::Cancelled { .. }));
    }

    #[test]
    fn stop_after_natural_end_returns_the_outcome() {
        let sink = RecordingSink::default();
        let handle = MonitorHandle::spawn(
            watch(sink.clone(), CountingProbe::on_call(2), Duration::ZERO),
            || Ok(ScriptedProcess::running()),
        )
        .expect("spawn monitor");

        let deadline = Instant::now() + Duration::from_secs(10);
        while sink.count(SinkEvent::Close) == 0 {
            assert!(Instant::now() < deadline, "monitor never closed the loader");
            thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(handle.stop(), Some(MonitorOutcome::TargetReady { ticks: 2 }));
    }
}
