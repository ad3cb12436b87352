//! Integration tests: phased advancement of logical time.
//!
//! Each distinct instant is one phase: the clock commits once, every
//! item pending at that instant runs to completion (or parks), and only
//! then does the clock move to the next pending instant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cadence_core::{Repetitions, WorkItem};
use cadence_engine::{SchedulerConfig, SchedulerState, StepScheduler};
use cadence_test_utils::{init_test_logging, CountingTask, GateTask, RecordingWatcher};

const WAIT: Duration = Duration::from_secs(5);

/// Run a scheduler to its terminal state and join the driver so watcher
/// callbacks have all fired.
fn run_to_end(scheduler: &StepScheduler) -> SchedulerState {
    scheduler.start().unwrap();
    assert!(scheduler.wait_terminal(WAIT), "scheduler never terminated");
    scheduler.join();
    scheduler.state()
}

/// An item that records the clock value it observed while running.
fn recording_item(
    name: &str,
    scheduler: &StepScheduler,
    log: &Arc<Mutex<Vec<u64>>>,
) -> WorkItem {
    let scheduler = scheduler.clone();
    let log = Arc::clone(log);
    WorkItem::from_fn(name, move |_ctx| {
        log.lock().unwrap().push(scheduler.current_time());
        Ok(())
    })
}

#[test]
fn serialized_batch_advances_the_clock_once() {
    init_test_logging();
    let scheduler =
        StepScheduler::new(SchedulerConfig::new(10).with_max_parallelism(1)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    scheduler
        .schedule_once(recording_item("first", &scheduler, &log), 5)
        .unwrap();
    scheduler
        .schedule_once(recording_item("second", &scheduler, &log), 5)
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    // Both items saw the same instant; the clock became 5 exactly once.
    assert_eq!(*log.lock().unwrap(), vec![5, 5]);
    assert_eq!(scheduler.current_time(), 5);
    assert!(scheduler.pool().is_terminated());
}

#[test]
fn repeating_entry_fires_at_fixed_intervals() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(25)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let item = recording_item("pulse", &scheduler, &log);
    scheduler
        .schedule_repeating(item, 0, 10, Repetitions::Finite(3))
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(*log.lock().unwrap(), vec![0, 10, 20]);
}

#[test]
fn infinite_repeat_is_cut_off_by_end_time() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(25)).unwrap();
    let watcher = Arc::new(RecordingWatcher::default());
    scheduler.add_watcher(watcher.clone());
    let counter = Arc::new(CountingTask::new());
    scheduler
        .schedule_repeating(WorkItem::new(counter.clone()), 0, 10, Repetitions::Infinite)
        .unwrap();

    // Fires at 0, 10, 20; the re-insertion at 30 exceeds the end time.
    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByTime);
    assert_eq!(counter.count(), 3);
    assert!(watcher.started());
    assert!(watcher.end_time_reached());
    assert!(!watcher.exhausted());
}

#[test]
fn entry_exactly_at_end_time_still_runs() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let counter = Arc::new(CountingTask::new());
    scheduler
        .schedule_once(WorkItem::new(counter.clone()), 10)
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(counter.count(), 1);
    assert_eq!(scheduler.current_time(), 10);
}

#[test]
fn entry_beyond_end_time_never_runs() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let watcher = Arc::new(RecordingWatcher::default());
    scheduler.add_watcher(watcher.clone());
    let counter = Arc::new(CountingTask::new());
    scheduler
        .schedule_once(WorkItem::new(counter.clone()), 50)
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByTime);
    assert_eq!(counter.count(), 0);
    assert!(watcher.end_time_reached());
    // The clock never reached the dropped entry's instant.
    assert_eq!(scheduler.current_time(), 0);
}

#[test]
fn empty_scheduler_exhausts_immediately() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(100)).unwrap();
    let watcher = Arc::new(RecordingWatcher::default());
    scheduler.add_watcher(watcher.clone());

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert!(watcher.started());
    assert!(watcher.exhausted());
}

#[test]
fn zero_delay_follow_up_runs_in_the_same_instant() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let follow_up = recording_item("follow-up", &scheduler, &log);
    let sched_handle = scheduler.clone();
    let spawner_log = Arc::clone(&log);
    let spawner = WorkItem::from_fn("spawner", move |_ctx| {
        spawner_log
            .lock()
            .unwrap()
            .push(sched_handle.current_time());
        sched_handle
            .schedule_once(follow_up.clone(), 0)
            .map_err(|e| cadence_core::TaskError::failed(e.to_string()))?;
        Ok(())
    });
    scheduler.schedule_once(spawner, 2).unwrap();
    let later = recording_item("later", &scheduler, &log);
    scheduler.schedule_once(later, 7).unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    // The follow-up ran at instant 2, before the clock moved to 7.
    assert_eq!(*log.lock().unwrap(), vec![2, 2, 7]);
}

#[test]
fn park_and_wake_complete_within_one_instant() {
    init_test_logging();
    let scheduler =
        StepScheduler::new(SchedulerConfig::new(10).with_max_parallelism(1)).unwrap();
    let gate = Arc::new(GateTask::new());
    let sleeper = WorkItem::new(gate.clone());
    let sleeper_handle = sleeper.clone();
    let waker = WorkItem::from_fn("waker", move |ctx| {
        // The sleeper may not have parked yet; retry briefly.
        for _ in 0..1_000 {
            if ctx.wake(&sleeper_handle) {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(1));
        }
        Err(cadence_core::TaskError::failed("sleeper never parked"))
    });
    scheduler.schedule_once(sleeper, 3).unwrap();
    scheduler.schedule_once(waker, 3).unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(gate.parked(), 1);
    assert_eq!(gate.resumed(), 1);
    // The whole suspend/resume exchange happened at instant 3.
    assert_eq!(scheduler.current_time(), 3);
}

#[test]
fn parked_item_without_a_waker_is_cancelled_at_exhaustion() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let gate = Arc::new(GateTask::new());
    scheduler.schedule_once(WorkItem::new(gate.clone()), 0).unwrap();

    // The parked item does not block quiescence, so the agenda drains
    // and the graceful shutdown cancels it.
    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(gate.parked(), 1);
    assert_eq!(gate.resumed(), 0);
    assert!(scheduler.pool().is_terminated());
}

#[test]
fn item_failures_do_not_derail_the_run() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    scheduler
        .schedule_once(WorkItem::new(Arc::new(cadence_test_utils::FailingTask)), 0)
        .unwrap();
    scheduler
        .schedule_once(WorkItem::new(Arc::new(cadence_test_utils::PanickingTask)), 0)
        .unwrap();
    let counter = Arc::new(CountingTask::new());
    scheduler
        .schedule_once(WorkItem::new(counter.clone()), 5)
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(counter.count(), 1);
    assert_eq!(scheduler.current_time(), 5);
}

#[test]
fn clock_is_monotonic_over_scattered_delays() {
    init_test_logging();
    let delays = [13u64, 2, 2, 40, 7, 0, 40, 21, 5, 33];
    let scheduler = StepScheduler::new(SchedulerConfig::new(100)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    for (i, delay) in delays.iter().enumerate() {
        scheduler
            .schedule_once(recording_item(&format!("probe-{i}"), &scheduler, &log), *delay)
            .unwrap();
    }

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    let observed = log.lock().unwrap().clone();
    assert_eq!(observed.len(), delays.len());
    assert!(
        observed.windows(2).all(|w| w[0] <= w[1]),
        "clock went backwards: {observed:?}"
    );
    let mut expected = delays.to_vec();
    expected.sort_unstable();
    assert_eq!(observed, expected);
}

#[test]
fn same_instant_items_are_order_independent() {
    init_test_logging();
    // Completion order within one instant is unspecified: items at the
    // same instant run in parallel. Only the set of completions and the
    // phase boundary are guaranteed.
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "b", "c"] {
        let log = Arc::clone(&log);
        scheduler
            .schedule_once(
                WorkItem::from_fn(name, move |ctx| {
                    log.lock().unwrap().push(ctx.item().name().to_string());
                    Ok(())
                }),
                4,
            )
            .unwrap();
    }
    let log_after = Arc::clone(&log);
    scheduler
        .schedule_once(
            WorkItem::from_fn("after", move |_ctx| {
                log_after.lock().unwrap().push("after".to_string());
                Ok(())
            }),
            8,
        )
        .unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    let observed = log.lock().unwrap().clone();
    // All three instant-4 completions precede the instant-8 one, in
    // some interleaving.
    let mut first_phase: Vec<&str> = observed[..3].iter().map(String::as_str).collect();
    first_phase.sort_unstable();
    assert_eq!(first_phase, vec!["a", "b", "c"]);
    assert_eq!(observed[3], "after");
}

#[test]
fn watchers_see_started_before_any_item_runs() {
    init_test_logging();
    let scheduler = StepScheduler::new(SchedulerConfig::new(10)).unwrap();
    let watcher = Arc::new(RecordingWatcher::default());
    scheduler.add_watcher(watcher.clone());

    let started_first = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&started_first);
    let watcher_probe = watcher.clone();
    let probe = WorkItem::from_fn("probe", move |_ctx| {
        if watcher_probe.started() {
            flag.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    });
    scheduler.schedule_once(probe, 0).unwrap();

    assert_eq!(run_to_end(&scheduler), SchedulerState::EndedByExhaustion);
    assert_eq!(started_first.load(Ordering::SeqCst), 1);
}
