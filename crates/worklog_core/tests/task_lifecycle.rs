use chrono::{TimeDelta, Utc};
use worklog_core::{Config, Tracker, TrackerError};

fn new_tracker() -> Tracker {
    Tracker::open_in_memory().unwrap()
}

fn running_count(tracker: &mut Tracker) -> usize {
    tracker
        .get_tasks()
        .unwrap()
        .iter()
        .filter(|task| task.is_running())
        .count()
}

#[test]
fn fresh_start_creates_a_running_task() {
    let mut tracker = new_tracker();

    let (previous, next) = tracker.start("desc @tag").unwrap();
    assert!(previous.is_none());
    assert_eq!(next.description, "desc");
    assert_eq!(next.tags, vec!["@tag"]);
    assert!(next.is_running());
    assert!(next.id.is_some());
    assert!(Utc::now() - next.started_at < TimeDelta::seconds(2));
}

#[test]
fn fresh_start_without_description_is_invalid() {
    let mut tracker = new_tracker();

    let err = tracker.start("").unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput(_)));
    assert!(tracker.get_tasks().unwrap().is_empty());

    // Tags alone do not make a task either.
    let err = tracker.start("@only").unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput(_)));
}

#[test]
fn identical_start_continues_without_mutation() {
    let mut tracker = new_tracker();

    let (_, first) = tracker.start("work @x").unwrap();

    let err = tracker.start("work @x").unwrap_err();
    let TrackerError::Continue(current) = err else {
        panic!("expected Continue, got different error");
    };
    assert_eq!(current.id, first.id);

    let tasks = tracker.get_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].tags, vec!["@x"]);
}

#[test]
fn tag_order_does_not_defeat_continue_detection() {
    let mut tracker = new_tracker();

    tracker.start("work @b @a").unwrap();
    let err = tracker.start("work @a @b").unwrap_err();
    assert!(matches!(err, TrackerError::Continue(_)));
}

#[test]
fn changed_tags_retag_the_running_task_in_place() {
    let mut tracker = new_tracker();

    let (_, first) = tracker.start("work @t").unwrap();
    let (previous, next) = tracker.start("work @u").unwrap();

    let previous = previous.unwrap();
    assert_eq!(previous.id, first.id);
    assert_eq!(next.id, first.id);
    assert_eq!(next.description, "work");
    assert_eq!(next.started_at, first.started_at);
    assert_eq!(next.tags, vec!["@u"]);
    assert!(next.is_running());

    let tasks = tracker.get_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
}

#[test]
fn empty_description_addresses_the_running_task() {
    let mut tracker = new_tracker();

    tracker.start("work @t").unwrap();
    let (previous, next) = tracker.start("@u").unwrap();

    assert_eq!(previous.unwrap().tags, vec!["@t"]);
    assert_eq!(next.description, "work");
    assert_eq!(next.tags, vec!["@u"]);
}

#[test]
fn different_description_switches_tasks() {
    let mut tracker = new_tracker();

    let (_, first) = tracker.start("work").unwrap();
    let (previous, next) = tracker.start("other").unwrap();

    let stopped = previous.unwrap();
    assert_eq!(stopped.id, first.id);
    assert!(!stopped.is_running());
    assert!(Utc::now() - stopped.stopped_at.unwrap() < TimeDelta::seconds(2));

    assert_ne!(next.id, first.id);
    assert_eq!(next.description, "other");
    assert!(next.is_running());
}

#[test]
fn switch_inherits_tags_when_none_given() {
    let mut tracker = new_tracker();

    tracker.start("work @keep").unwrap();
    let (_, next) = tracker.start("other").unwrap();
    assert_eq!(next.tags, vec!["@keep"]);

    let (_, third) = tracker.start("third @own").unwrap();
    assert_eq!(third.tags, vec!["@own"]);
}

#[test]
fn stop_returns_a_copy_of_the_stopped_task() {
    let mut tracker = new_tracker();

    tracker.start("desc @tag").unwrap();
    let stopped = tracker.stop().unwrap();

    assert_eq!(stopped.description, "desc");
    assert_eq!(stopped.tags, vec!["@tag"]);
    assert!(Utc::now() - stopped.stopped_at.unwrap() < TimeDelta::seconds(2));
    assert_eq!(running_count(&mut tracker), 0);
}

#[test]
fn stop_without_running_task_is_an_expected_failure() {
    let mut tracker = new_tracker();

    let err = tracker.stop().unwrap_err();
    assert!(matches!(err, TrackerError::NoCurrentTask));
    assert!(tracker.get_tasks().unwrap().is_empty());
}

#[test]
fn at_most_one_task_runs_at_any_point() {
    let mut tracker = new_tracker();

    tracker.start("one").unwrap();
    assert_eq!(running_count(&mut tracker), 1);

    tracker.start("two").unwrap();
    assert_eq!(running_count(&mut tracker), 1);

    let _ = tracker.start("two"); // Continue
    assert_eq!(running_count(&mut tracker), 1);

    tracker.stop().unwrap();
    assert_eq!(running_count(&mut tracker), 0);

    tracker.start("three").unwrap();
    assert_eq!(running_count(&mut tracker), 1);

    assert_eq!(tracker.get_tasks().unwrap().len(), 3);
}

#[test]
fn current_task_reflects_the_lifecycle() {
    let mut tracker = new_tracker();

    assert!(tracker.current_task().unwrap().is_none());
    tracker.start("work").unwrap();
    assert_eq!(
        tracker.current_task().unwrap().unwrap().description,
        "work"
    );
    tracker.stop().unwrap();
    assert!(tracker.current_task().unwrap().is_none());
}

#[test]
fn update_and_delete_require_a_valid_id() {
    let mut tracker = new_tracker();

    let (_, mut task) = tracker.start("work").unwrap();
    task.description = "edited".to_string();
    tracker.update_task(&task).unwrap();
    assert_eq!(tracker.get_tasks().unwrap()[0].description, "edited");

    let mut detached = task.clone();
    detached.id = None;
    let err = tracker.update_task(&detached).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Store(worklog_core::StoreError::InvalidTaskId)
    ));

    let err = tracker.delete_task(9999).unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Store(worklog_core::StoreError::InvalidTaskId)
    ));

    tracker.delete_task(task.id.unwrap()).unwrap();
    assert!(tracker.get_tasks().unwrap().is_empty());
}

#[test]
fn external_edits_keep_tags_in_canonical_order() {
    let mut tracker = new_tracker();

    let (_, mut task) = tracker.start("work @a @b").unwrap();
    task.tags = vec!["@b".to_string(), "@a".to_string()];
    tracker.update_task(&task).unwrap();

    // The edit must not defeat tag-sequence equality on the next start.
    let err = tracker.start("work @a @b").unwrap_err();
    assert!(matches!(err, TrackerError::Continue(_)));
    assert_eq!(tracker.get_tasks().unwrap()[0].tags, vec!["@a", "@b"]);
}

#[test]
fn config_is_validated_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worklog.db");

    let mut tracker = Tracker::open(&path).unwrap();
    assert_eq!(tracker.get_config(), Config::default());

    let err = tracker
        .set_config(Config {
            weekly_hours: TimeDelta::hours(-1),
            ..Config::default()
        })
        .unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput(_)));

    let config = Config {
        weekly_hours: TimeDelta::hours(40),
        monthly_hours: TimeDelta::hours(160),
    };
    tracker.set_config(config).unwrap();
    drop(tracker);

    let reopened = Tracker::open(&path).unwrap();
    assert_eq!(reopened.get_config(), config);
}

#[test]
fn duration_left_requires_a_configured_quota() {
    let mut tracker = new_tracker();

    let err = tracker.duration_left().unwrap_err();
    assert!(matches!(err, TrackerError::NotConfigured));

    tracker
        .set_config(Config {
            weekly_hours: TimeDelta::hours(40),
            ..Config::default()
        })
        .unwrap();

    let (daily, weekly) = tracker.duration_left().unwrap();
    assert_eq!(daily, TimeDelta::hours(8));
    assert_eq!(weekly, TimeDelta::hours(40));
}
