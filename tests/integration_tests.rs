use chrono::{DateTime, Duration, TimeZone, Utc};
use recoveryrs::{
    aggregate, estimate_recovery, ExerciseCategory, FatigueSource, Numeric, RecoveryInput, RestThresholdTable,
    RestTimer, RestTimerWire, RestZone, WorkoutSession,
};

/// Integration tests that exercise the engine end to end

fn workout_finished() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 19, 30, 0).unwrap()
}

fn payload() -> RecoveryInput {
    serde_json::from_str(
        r#"{
            "muscles": [
                {"muscle_group": "chest", "fatigue_score": 8.2, "total_sets": 12, "recovery_hours": 48, "source_timestamp": "2024-03-04T19:30:00Z", "source_workout_id": 17},
                {"muscle_group": "triceps", "fatigue_score": "4.5", "total_sets": "6", "recovery_hours": "36", "source_timestamp": "2024-03-04T19:30:00Z"},
                {"muscle_group": "hamstrings", "fatigue_score": null, "recovery_hours": 72, "source_timestamp": null},
                {"muscle_group": "calves", "fatigue_score": "n/a", "recovery_hours": 24, "source_timestamp": "garbage"}
            ],
            "cns": {"cns_load": "62", "recovery_hours": 72, "source_timestamp": "2024-03-04T19:30:00Z"}
        }"#,
    )
    .unwrap()
}

/// Full ingestion to aggregate path with mixed, partially broken input
#[test]
fn test_payload_to_recovery_status() {
    let (muscles, cns) = payload().into_sources().unwrap();
    let now = workout_finished() + Duration::hours(24);
    let status = aggregate(&muscles, cns.as_ref(), now);

    assert_eq!(status.per_muscle.len(), 4);

    let chest = &status.per_muscle["chest"];
    assert_eq!(chest.recovery_percentage, 50.0);
    assert_eq!(chest.hours_until_recovery, 24.0);
    assert!(!chest.is_recovered);

    let triceps = &status.per_muscle["triceps"];
    assert!((triceps.recovery_percentage - 66.666).abs() < 0.01);

    // Missing and unparseable timestamps mean nothing to recover from
    assert!(status.per_muscle["hamstrings"].is_recovered);
    assert!(status.per_muscle["calves"].is_recovered);

    let cns = status.cns.as_ref().unwrap();
    assert!((cns.recovery_percentage - 33.333).abs() < 0.01);

    assert_eq!(status.next_recovered_at(), Some(workout_finished() + Duration::hours(36)));
}

/// Percentages only move forward as the day goes on
#[test]
fn test_recovery_over_time() {
    let (muscles, cns) = payload().into_sources().unwrap();
    let mut previous = 0.0;

    for hour in 0..=80 {
        let now = workout_finished() + Duration::hours(hour);
        let status = aggregate(&muscles, cns.as_ref(), now);
        let chest = status.per_muscle["chest"].recovery_percentage;
        assert!(chest >= previous);
        previous = chest;

        assert_eq!(status.fully_recovered(), hour >= 72);
    }
}

/// A typical gym session: sets, pauses, a server sync, and the end of the workout
#[test]
fn test_rest_timer_session() {
    let start = Utc.with_ymd_and_hms(2024, 3, 5, 7, 0, 0).unwrap();
    let at = |s: i64| start + Duration::seconds(s);

    let mut session = WorkoutSession::new(RestThresholdTable::default(), false);
    session.log_set(at(0), ExerciseCategory::Compound);

    assert_eq!(session.rest_status(at(30)).zone, RestZone::Early);
    assert_eq!(session.rest_status(at(90)).zone, RestZone::Approaching);
    assert_eq!(session.rest_status(at(180)).zone, RestZone::Ready);

    // Phone call
    session.pause_rest(at(120));
    assert_eq!(session.timer().elapsed_seconds(at(900)), 120.0);
    session.resume_rest(at(900));
    assert_eq!(session.rest_status(at(960)).zone, RestZone::Ready);
    assert_eq!(session.rest_status(at(1080)).zone, RestZone::Overdue);

    // Server says only 100s have elapsed; local drift is discarded
    session.sync_rest_timer(
        &RestTimerWire {
            last_set_timestamp: Some("2024-03-05T07:00:00Z".to_string()),
            last_exercise_category: Some("compound".to_string()),
            elapsed_seconds: Numeric::Value(100.0),
            is_paused: false,
        },
        at(1080),
    );
    assert_eq!(session.timer().elapsed_seconds(at(1080)), 100.0);

    session.log_set(at(1200), ExerciseCategory::Isolation);
    let view = session.tick(at(1290), &[], None);
    assert_eq!(view.rest_status.zone, RestZone::Ready);
    assert_eq!(view.rest_status.goal, 90.0);
    assert_eq!(view.rest_timer.last_exercise_category.as_deref(), Some("isolation"));

    session.end_workout();
    let view = session.tick(at(5000), &[], None);
    assert_eq!(view.rest_status.zone, RestZone::Early);
    assert!(view.rest_timer.last_set_timestamp.is_none());
}

/// Examples from the recovery and rest contracts
#[test]
fn test_documented_examples() {
    let now = workout_finished();
    let source = FatigueSource::muscle("lats", 6.0, 48.0, Some(now - Duration::hours(24)));
    let snapshot = estimate_recovery(&source, now);
    assert_eq!(snapshot.recovery_percentage, 50.0);
    assert!(!snapshot.is_recovered);
    assert_eq!(snapshot.hours_until_recovery, 24.0);

    let table = RestThresholdTable::default();
    let mut timer = RestTimer::new();
    timer.start(now, ExerciseCategory::Compound);
    assert_eq!(timer.status(now + Duration::seconds(90), &table).zone, RestZone::Approaching);
    assert_eq!(timer.status(now + Duration::seconds(310), &table).zone, RestZone::Overdue);

    let idle = RestTimer::new();
    assert_eq!(idle.elapsed_seconds(now), 0.0);
    assert_eq!(idle.status(now, &table).zone, RestZone::Early);
}
