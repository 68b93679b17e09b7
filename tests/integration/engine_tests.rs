/// Engine behaviour through the public tracker API
use chrono::Duration;
use recovery_tracker_mcp::*;

use crate::common::*;

#[cfg(test)]
mod engine_integration_tests {
    use super::*;

    #[test]
    fn test_journey_opens_and_closes() {
        let mut h = harness();
        let user = UserId(1);
        h.tracker.register_user(user, "@sam").unwrap();

        let reply = open_journey(&mut h.tracker, user, 0, "belts");
        assert!(matches!(reply.event, Some(FlowEvent::RankAssigned { .. })));
        assert!(h.tracker.profile(user).unwrap().journey_is_current);

        // a second journey cannot be opened while one is going
        assert!(matches!(h.tracker.start_new_journey(user), Err(TrackerError::Conflict(_))));

        h.clock.advance(Duration::days(4));
        h.tracker.start_check_in(user).unwrap();
        let reply = h.tracker.answer(user, "relapsed", None).unwrap();
        let reply = h.tracker.answer(user, "rough night", step(&reply)).unwrap();
        let Some(FlowEvent::JourneyClosed { journey }) = reply.event else {
            panic!("expected the journey to close");
        };
        assert_eq!(journey.end, Some(h.clock.now()));

        let profile = h.tracker.profile(user).unwrap();
        assert!(!profile.journey_is_current);
        assert_eq!(profile.days, 4);

        // closed journeys free the slot for a new one
        open_journey(&mut h.tracker, user, 0, "memes");
        assert_eq!(h.tracker.profile(user).unwrap().journey_count, 2);
    }

    #[test]
    fn test_check_in_needs_a_journey() {
        let mut h = harness();
        assert!(matches!(h.tracker.start_check_in(UserId(2)), Err(TrackerError::NotFound(_))));
        assert!(matches!(h.tracker.profile(UserId(2)), Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_score_never_decreases_while_journey_is_open() {
        let mut h = harness();
        let user = UserId(3);
        open_journey(&mut h.tracker, user, 5, "military");

        assert_eq!(h.tracker.score(user, ScoreScope::AllHistory).unwrap(), 10);
        assert_eq!(h.tracker.score(user, ScoreScope::CurrentJourney).unwrap(), 10);

        let mut previous = 10;
        for _ in 0..3 {
            h.clock.advance(Duration::hours(20));
            let score = h.tracker.score(user, ScoreScope::AllHistory).unwrap();
            assert!(score >= previous);
            previous = score;
        }

        // 5 declared days + 60 hours = 7 whole days
        assert_eq!(previous, 14);

        survive_check_in(&mut h.tracker, user, 8, "steady", "private");
        assert_eq!(h.tracker.score(user, ScoreScope::AllHistory).unwrap(), 15);
        assert_eq!(h.tracker.score(user, ScoreScope::CurrentJourney).unwrap(), 15);
    }

    #[test]
    fn test_rank_ladder_progression() {
        let mut h = harness_with(calendar_config());
        let user = UserId(4);

        let reply = open_journey(&mut h.tracker, user, 10, "calendar");
        let Some(FlowEvent::RankAssigned { current_rank, days, .. }) = reply.event else {
            panic!("expected a rank assignment");
        };
        assert_eq!(days, 10);
        assert_eq!(current_rank.label(), "month");

        let profile = h.tracker.profile(user).unwrap();
        assert_eq!(profile.rank_system.as_deref(), Some("Calendar"));
        assert_eq!(profile.next_rank.label(), "quarter");
        assert!(!profile.next_rank.is_max_rank());

        // day 85: top rung held, nothing left to climb
        h.clock.advance(Duration::days(75));
        let profile = h.tracker.profile(user).unwrap();
        assert_eq!(profile.current_rank.label(), "quarter");
        assert!(profile.next_rank.is_max_rank());
        assert_eq!(profile.next_rank.threshold(), 90);

        // day 91: every threshold exceeded
        h.clock.advance(Duration::days(6));
        let profile = h.tracker.profile(user).unwrap();
        assert_eq!(profile.current_rank, RankResolution::Exhausted);
        assert_eq!(profile.current_rank.label(), "");
    }

    #[test]
    fn test_rank_threshold_is_inclusive() {
        let mut h = harness_with(calendar_config());
        let reply = open_journey(&mut h.tracker, UserId(5), 7, "Calendar");
        let Some(FlowEvent::RankAssigned { current_rank, .. }) = reply.event else {
            panic!("expected a rank assignment");
        };
        assert_eq!(current_rank.label(), "week");
    }

    #[test]
    fn test_unknown_rank_choice_keeps_question_open() {
        let mut h = harness();
        let user = UserId(6);
        let reply = h.tracker.start_new_journey(user).unwrap();
        h.tracker.answer(user, "3", step(&reply)).unwrap();

        let result = h.tracker.answer(user, "Pirates", None);
        assert!(matches!(result, Err(TrackerError::Validation(_))));
        assert!(h.tracker.conversations().pending(user).is_some());

        h.tracker.answer(user, "Belts", None).unwrap();
        assert!(h.tracker.conversations().pending(user).is_none());
    }

    #[test]
    fn test_open_task_is_not_assigned_twice() {
        let mut h = harness();
        let user = UserId(7);

        let TaskAssignment::Assigned { task, definition } = h.tracker.request_task(user, Some(99)).unwrap() else {
            panic!("expected a new task");
        };
        assert_eq!(task.message_ref, Some(99));

        let TaskAssignment::Unfinished { task: again } = h.tracker.request_task(user, None).unwrap() else {
            panic!("expected the open task back");
        };
        assert_eq!(again.id, task.id);
        assert_eq!(h.tracker.storage().list_tasks(user).unwrap().len(), 1);

        let completion = h.tracker.complete_task(user).unwrap();
        assert!(completion.task.is_done);
        assert_eq!(completion.points, definition.points);
        assert_eq!(completion.prompt_key.as_deref(), Some(definition.prompt_key.as_str()));

        assert!(matches!(h.tracker.complete_task(user), Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_daily_task_quota_resets_at_midnight() {
        let mut h = harness();
        let user = UserId(8);

        for _ in 0..3 {
            assert!(matches!(
                h.tracker.request_task(user, None).unwrap(),
                TaskAssignment::Assigned { .. }
            ));
            h.tracker.complete_task(user).unwrap();
            h.clock.advance(Duration::minutes(10));
        }

        assert!(matches!(h.tracker.request_task(user, None), Err(TrackerError::QuotaExceeded(_))));

        // 18:30 -> 01:30 the next day
        h.clock.advance(Duration::hours(7));
        assert!(matches!(
            h.tracker.request_task(user, None).unwrap(),
            TaskAssignment::Assigned { .. }
        ));
    }

    #[test]
    fn test_daily_check_in_cap() {
        let mut h = harness();
        let user = UserId(9);
        open_journey(&mut h.tracker, user, 2, "belts");

        for n in 1..=3 {
            survive_check_in(&mut h.tracker, user, 6, &format!("check-in {}", n), "private");
            h.clock.advance(Duration::minutes(30));
        }

        assert!(matches!(h.tracker.start_check_in(user), Err(TrackerError::QuotaExceeded(_))));
        assert!(h.tracker.conversations().pending(user).is_none());

        h.clock.advance(Duration::hours(6));
        assert!(h.tracker.start_check_in(user).is_ok());
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let mut config = TrackerConfig::default();
        config.limits.daily_check_ins = 10;
        let mut h = harness_with(config);
        let user = UserId(10);
        open_journey(&mut h.tracker, user, 1, "memes");

        for n in 1..=5 {
            survive_check_in(&mut h.tracker, user, 5, &format!("entry {}", n), "public");
            h.clock.advance(Duration::minutes(1));
        }

        let page = h.tracker.entries(user, EntryScope::All, 100).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 5);
        assert!(!page.has_next);
        assert!(page.has_previous);

        let first = h.tracker.entries(user, EntryScope::All, 1).unwrap();
        assert_eq!(first.items.len(), 5);
        assert_eq!(first.items[0].text, "entry 1");
        assert_eq!(first.total_pages, 1);
        assert!(!first.has_next);

        assert!(matches!(
            h.tracker.entries(user, EntryScope::All, 0),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_small_pages() {
        let mut config = TrackerConfig::default();
        config.limits.daily_check_ins = 10;
        config.limits.page_size = 2;
        let mut h = harness_with(config);
        let user = UserId(11);
        open_journey(&mut h.tracker, user, 1, "memes");

        for n in 1..=5 {
            survive_check_in(&mut h.tracker, user, 5, &format!("entry {}", n), "private");
            h.clock.advance(Duration::minutes(1));
        }

        let second = h.tracker.entries(user, EntryScope::All, 2).unwrap();
        assert_eq!(second.total_pages, 3);
        assert_eq!(
            second.items.iter().map(|e| e.text.as_str()).collect::<Vec<_>>(),
            vec!["entry 3", "entry 4"]
        );
        assert!(second.has_next);
        assert!(second.has_previous);

        let third = h.tracker.entries(user, EntryScope::All, 3).unwrap();
        assert_eq!(third.items.len(), 1);
        assert!(!third.has_next);
    }

    #[test]
    fn test_public_and_private_entries() {
        let mut h = harness();
        let user = UserId(12);
        open_journey(&mut h.tracker, user, 0, "belts");

        let shared = survive_check_in(&mut h.tracker, user, 9, "shared with everyone", "Public");
        h.clock.advance(Duration::minutes(5));
        let kept = survive_check_in(&mut h.tracker, user, 4, "just for me", "private");
        assert!(shared.is_public);
        assert!(!kept.is_public);

        let public = h.tracker.entries(user, EntryScope::Public, 1).unwrap();
        assert_eq!(public.items, vec![shared.clone()]);
        let private = h.tracker.entries(user, EntryScope::Private, 1).unwrap();
        assert_eq!(private.items, vec![kept.clone()]);
        assert_eq!(h.tracker.entries(user, EntryScope::All, 1).unwrap().total_count, 2);

        let activity = h.tracker.activity(user).unwrap();
        let kinds: Vec<_> = activity.iter().map(|a| a.item.kind()).collect();
        assert_eq!(kinds, vec!["journey", "entry", "entry"]);

        let export = h.tracker.export_history(user).unwrap();
        assert_eq!(export.entries, vec![shared, kept]);
        assert_eq!(export.journeys.len(), 1);
        assert_eq!(export.exported_at, h.clock.now());
    }

    #[test]
    fn test_unanswered_prompt_times_out() {
        let mut h = harness();
        let user = UserId(13);
        open_journey(&mut h.tracker, user, 0, "belts");

        h.tracker.start_check_in(user).unwrap();
        h.clock.advance(Duration::seconds(301));
        assert!(matches!(h.tracker.answer(user, "survived", None), Err(TrackerError::Timeout)));
        assert!(h.tracker.conversations().is_empty());

        h.tracker.start_check_in(user).unwrap();
        h.clock.advance(Duration::seconds(301));
        assert_eq!(h.tracker.sweep_expired(), vec![user]);
        assert!(h.tracker.start_check_in(user).is_ok());
    }

    #[test]
    fn test_cancel_keeps_what_was_stored() {
        let mut h = harness();
        let user = UserId(14);

        let reply = h.tracker.start_new_journey(user).unwrap();
        h.tracker.answer(user, "2", step(&reply)).unwrap();
        let reply = h.tracker.cancel(user).unwrap();
        assert_eq!(reply.message, "Command canceled");
        assert_eq!(reply.event, Some(FlowEvent::Canceled));

        // the journey was stored before the rank question
        let profile = h.tracker.profile(user).unwrap();
        assert!(profile.journey_is_current);
        assert_eq!(profile.rank_system, None);
        assert_eq!(profile.current_rank, RankResolution::Exhausted);

        assert!(matches!(h.tracker.cancel(user), Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_profile_by_username() {
        let mut h = harness();
        h.tracker.register_user(UserId(15), "@Alice").unwrap();
        open_journey(&mut h.tracker, UserId(15), 3, "belts");

        let profile = h.tracker.profile_by_username("@alice").unwrap();
        assert_eq!(profile.user_id, UserId(15));
        assert_eq!(profile.username.as_deref(), Some("Alice"));

        assert!(matches!(h.tracker.profile_by_username("bob"), Err(TrackerError::NotFound(_))));
        assert!(matches!(h.tracker.register_user(UserId(16), " @ "), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_journey_user_count() {
        let mut h = harness();
        assert_eq!(h.tracker.journey_user_count().unwrap(), 0);

        open_journey(&mut h.tracker, UserId(17), 0, "belts");
        open_journey(&mut h.tracker, UserId(18), 0, "belts");
        assert_eq!(h.tracker.journey_user_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let mut h = harness();
        open_journey(&mut h.tracker, UserId(19), 12, "belts");

        let storage = SqliteStorage::new(h.db.path().to_path_buf()).expect("Failed to reopen storage");
        let reopened = RecoveryTrackerServer::with_clock(storage, TrackerConfig::default(), h.clock.clone())
            .expect("Failed to build second tracker");

        let profile = reopened.profile(UserId(19)).unwrap();
        assert_eq!(profile.days, 12);
        assert_eq!(profile.current_rank.label(), "Yellow belt");
    }

    #[test]
    fn test_profile_shows_only_public_entries() {
        let mut h = harness();
        let user = UserId(20);
        h.tracker.register_user(user, "robin").unwrap();
        open_journey(&mut h.tracker, user, 0, "belts");
        survive_check_in(&mut h.tracker, user, 9, "shared", "public");
        h.clock.advance(Duration::minutes(1));
        survive_check_in(&mut h.tracker, user, 3, "hidden", "private");

        let params = tools::ProfileParams { user_id: None, username: Some("Robin".to_string()), page: None };
        let public = tools::profile_view(&h.tracker, params).unwrap();
        assert_eq!(public.data.entries.scope, EntryScope::Public);
        assert_eq!(public.data.entries.total_count, 1);
        assert!(public.message.contains("shared"));
        assert!(!public.message.contains("hidden"));

        let own = tools::account_view(&h.tracker, tools::AccountParams { user_id: 20, page: None }).unwrap();
        assert_eq!(own.data.entries.total_count, 2);
        assert_eq!(own.data.summary.total_entries, 2);

        let both = tools::ProfileParams { user_id: Some(20), username: Some("robin".to_string()), page: None };
        assert!(matches!(tools::profile_view(&h.tracker, both), Err(TrackerError::Validation(_))));
    }
}
