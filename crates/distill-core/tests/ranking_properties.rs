//! Property tests for the ranking engine.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use distill_core::ranking::{rank, score, top_tasks};
use distill_core::{Priority, Status, Task};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 11).unwrap()
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::ToDo),
        Just(Status::InProgress),
        Just(Status::Completed)
    ]
}

fn task() -> impl Strategy<Value = Task> {
    (
        priority(),
        status(),
        0i64..10_000,
        proptest::option::of(-15i64..20),
    )
        .prop_map(|(priority, status, created_min, due_offset)| Task {
            id: format!("t-{created_min}"),
            title: "task".to_string(),
            priority,
            status,
            created_at: base() + Duration::minutes(created_min),
            due_date: due_offset.map(|d| today() + Duration::days(d)),
        })
}

proptest! {
    #[test]
    fn completed_tasks_never_ranked(tasks in proptest::collection::vec(task(), 0..40)) {
        let ranked = rank(&tasks, today());
        prop_assert!(ranked.iter().all(|t| t.status != Status::Completed));
        let open = tasks.iter().filter(|t| t.status != Status::Completed).count();
        prop_assert_eq!(ranked.len(), open);
    }

    #[test]
    fn ranking_is_ordered_by_score_then_age(tasks in proptest::collection::vec(task(), 0..40)) {
        let ranked = rank(&tasks, today());
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (sa, sb) = (score(a, today()), score(b, today()));
            prop_assert!(sa >= sb);
            if sa == sb {
                prop_assert!(a.created_at <= b.created_at);
            }
        }
    }

    #[test]
    fn ranking_is_idempotent(tasks in proptest::collection::vec(task(), 0..40)) {
        let once = rank(&tasks, today());
        let twice = rank(&once, today());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn top_tasks_is_a_prefix(tasks in proptest::collection::vec(task(), 0..40), n in 0usize..6) {
        let ranked = rank(&tasks, today());
        let top = top_tasks(&tasks, today(), n);
        prop_assert_eq!(top.len(), n.min(ranked.len()));
        prop_assert_eq!(&ranked[..top.len()], &top[..]);
    }

    #[test]
    fn score_stays_in_range(t in task()) {
        let s = score(&t, today());
        prop_assert!(s >= 100);
        prop_assert!(s <= 950);
    }
}
