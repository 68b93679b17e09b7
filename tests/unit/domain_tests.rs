/// Entity construction and validation rules
use chrono::{Duration, TimeZone, Utc};
use recovery_tracker_mcp::*;

#[cfg(test)]
mod domain_unit_tests {
    use super::*;

    #[test]
    fn test_journey_is_backdated_by_declared_days() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap();
        let journey = Journey::new(UserId(1), 12, now).unwrap();

        assert_eq!(journey.start, now - Duration::days(12));
        assert_eq!(journey.created_at, now);
        assert!(journey.is_open());
        assert_eq!(journey.rank_system, None);
        assert_eq!(journey.elapsed_days(now + Duration::hours(23)), 12);
        assert_eq!(journey.elapsed_days(now + Duration::hours(24)), 13);
    }

    #[test]
    fn test_declared_days_parsing() {
        assert_eq!(Journey::parse_declared_days(" 42 ").unwrap(), 42);
        assert_eq!(Journey::parse_declared_days("0").unwrap(), 0);
        assert!(Journey::parse_declared_days("-1").is_err());
        assert!(Journey::parse_declared_days("ten").is_err());
        assert!(Journey::parse_declared_days(&(MAX_DECLARED_DAYS + 1).to_string()).is_err());
    }

    #[test]
    fn test_closed_journey_stops_counting() {
        let now = Utc::now();
        let mut journey = Journey::new(UserId(1), 3, now).unwrap();
        journey.close("  slipped  ", now + Duration::days(2)).unwrap();

        assert!(!journey.is_open());
        assert_eq!(journey.note, "slipped");
        assert_eq!(journey.elapsed_days(now + Duration::days(30)), 5);
    }

    #[test]
    fn test_entry_validation() {
        let now = Utc::now();
        let entry = Entry::new(UserId(2), 7, "  a good day ", now).unwrap();
        assert!(!entry.is_public);
        assert_eq!(entry.text, "a good day");

        assert!(Entry::new(UserId(2), 0, "text", now).is_err());
        assert!(Entry::new(UserId(2), 11, "text", now).is_err());
        assert!(Entry::new(UserId(2), 5, "   ", now).is_err());
        assert!(Entry::new(UserId(2), 5, &"x".repeat(MAX_TEXT_LENGTH + 1), now).is_err());
    }

    #[test]
    fn test_task_lifecycle() {
        let now = Utc::now();
        let definition = TaskDefinition { id: 3, points: 5, prompt_key: "task-drink-water".to_string() };
        let mut task = Task::assign(UserId(4), &definition, None, now);

        assert_eq!(task.task_ref, 3);
        assert!(!task.is_done);
        assert_eq!(task.updated_at, task.created_at);

        task.mark_done(now + Duration::minutes(15));
        assert!(task.is_done);
        assert_eq!(task.updated_at, now + Duration::minutes(15));
    }

    #[test]
    fn test_task_catalog_points() {
        let catalog = TaskCatalog::new(vec![
            TaskDefinition { id: 0, points: 10, prompt_key: "a".to_string() },
            TaskDefinition { id: 1, points: 25, prompt_key: "b".to_string() },
        ]);
        assert_eq!(catalog.points_for(1), 25);
        // retired definitions are worth nothing
        assert_eq!(catalog.points_for(9), 0);
        assert!(catalog.get(9).is_none());
    }

    #[test]
    fn test_username_normalization() {
        assert_eq!(normalize_username("@Quinn"), "Quinn");
        assert_eq!(normalize_username("  river "), "river");
    }

    #[test]
    fn test_entry_scope_parsing() {
        assert_eq!("public".parse::<EntryScope>().unwrap(), EntryScope::Public);
        assert_eq!(EntryScope::Private.privacy_filter(), Some(false));
        assert_eq!(EntryScope::All.privacy_filter(), None);
        assert!("friends".parse::<EntryScope>().is_err());
    }
}
