//! Step sequences paced by a frozen timeline.

use parking_lot::Mutex;
use std::sync::Arc;
use timewarp::test_utils::init_test_logging;
use timewarp::{
    Sequence, SequenceState, Step, StepLogic, Timeline, assert_with_log, test_complete,
    test_phase, test_section,
};

fn init_test(name: &str) -> Timeline {
    init_test_logging();
    test_phase!(name);
    Timeline::frozen_at(0.0).unwrap()
}

/// Sets a shared value to `i` after sleeping `i` seconds, for `i` in `1..=num_steps`.
struct Ramp {
    value: Arc<Mutex<Option<u32>>>,
    num_steps: u32,
    next: u32,
}

impl Ramp {
    fn new(num_steps: u32) -> (Self, Arc<Mutex<Option<u32>>>) {
        let value = Arc::new(Mutex::new(None));
        let ramp = Self {
            value: Arc::clone(&value),
            num_steps,
            next: 0,
        };
        (ramp, value)
    }
}

impl StepLogic for Ramp {
    fn resume(&mut self, _timeline: &Timeline) -> Option<Step> {
        *self.value.lock() = Some(self.next);
        if self.next == self.num_steps {
            return None;
        }
        self.next += 1;
        Some(Step::sleep(f64::from(self.next)))
    }
}

#[test]
fn three_steps_follow_matching_sleeps() {
    let mut timeline = init_test("three_steps_follow_matching_sleeps");
    let (ramp, value) = Ramp::new(3);
    let sequence = Sequence::new(ramp);
    sequence.run(&mut timeline).unwrap();

    for step in 1..=3_u32 {
        timeline.sleep(f64::from(step)).unwrap();
        let current = *value.lock();
        assert_with_log!(current == Some(step), "state matches step", Some(step), current);
        let expected_running = step < 3;
        assert_with_log!(
            sequence.is_running() == expected_running,
            "running until the last step",
            expected_running,
            sequence.is_running()
        );
    }
    test_complete!("three_steps_follow_matching_sleeps");
}

#[test]
fn ten_step_schedule() {
    let mut timeline = init_test("ten_step_schedule");
    let num_steps = 10;
    let (ramp, value) = Ramp::new(num_steps);
    let sequence = Sequence::new(ramp);
    assert_with_log!(!sequence.is_running(), "idle before run", false, sequence.is_running());
    sequence.run(&mut timeline).unwrap();
    assert_with_log!(sequence.is_running(), "running", true, sequence.is_running());

    for i in 1..=num_steps {
        test_section!(format!("step {i}"));
        let before = *value.lock();
        assert_with_log!(before == Some(i - 1), "previous value", Some(i - 1), before);
        timeline.sleep(f64::from(i - 1)).unwrap();
        let unchanged = *value.lock();
        assert_with_log!(unchanged == Some(i - 1), "not yet", Some(i - 1), unchanged);
        timeline.sleep(1.0).unwrap();
        let after = *value.lock();
        assert_with_log!(after == Some(i), "advanced", Some(i), after);
    }
    assert_with_log!(!sequence.is_running(), "finished", false, sequence.is_running());
    assert_with_log!(
        sequence.state() == SequenceState::Completed,
        "completed",
        SequenceState::Completed,
        sequence.state()
    );
    test_complete!("ten_step_schedule");
}

#[test]
fn interrupted_schedule_stops_progress() {
    let mut timeline = init_test("interrupted_schedule_stops_progress");
    let num_steps = 10;
    let (ramp, value) = Ramp::new(num_steps);
    let sequence = Sequence::new(ramp);
    sequence.run(&mut timeline).unwrap();

    let mut last = 0;
    for i in 1..num_steps - 1 {
        timeline.sleep(f64::from(i)).unwrap();
        last = i;
    }
    let reached = *value.lock();
    assert_with_log!(reached == Some(last), "reached", Some(last), reached);
    assert_with_log!(sequence.is_running(), "still running", true, sequence.is_running());

    sequence.stop();
    timeline.sleep(f64::from(last + 1)).unwrap();
    let frozen = *value.lock();
    assert_with_log!(frozen == Some(last), "no progress after stop", Some(last), frozen);
    assert_with_log!(!sequence.is_running(), "stopped", false, sequence.is_running());
    test_complete!("interrupted_schedule_stops_progress");
}

#[test]
fn sequence_steps_see_their_scheduled_time() {
    let mut timeline = init_test("sequence_steps_see_their_scheduled_time");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sequence = Sequence::new(move |timeline: &Timeline| {
        let mut seen = sink.lock();
        seen.push(timeline.time());
        (seen.len() < 4).then_some(Step::sleep(2.5))
    });
    sequence.run(&mut timeline).unwrap();
    timeline.sleep(100.0).unwrap();

    let recorded = seen.lock().clone();
    let expected = vec![0.0, 2.5, 5.0, 7.5];
    assert_with_log!(recorded == expected, "exact step times", expected, recorded);
    assert_with_log!(timeline.time() == 100.0, "outer sleep", 100.0, timeline.time());
    test_complete!("sequence_steps_see_their_scheduled_time");
}

#[test]
fn fixed_delays_drive_wait_all() {
    let mut timeline = init_test("fixed_delays_drive_wait_all");
    let sequence = Sequence::from_steps([1.0, 2.0, 3.0].map(Step::sleep));
    sequence.run(&mut timeline).unwrap();
    timeline.sleep_wait_all_scheduled().unwrap();
    assert_with_log!(timeline.time() == 6.0, "sum of delays", 6.0, timeline.time());
    assert_with_log!(
        sequence.state() == SequenceState::Completed,
        "completed",
        SequenceState::Completed,
        sequence.state()
    );
    test_complete!("fixed_delays_drive_wait_all");
}
