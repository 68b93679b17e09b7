/// Rank resolution over configured ladders
use chrono::{DateTime, Duration, TimeZone, Utc};
use recovery_tracker_mcp::*;

#[cfg(test)]
mod rank_unit_tests {
    use super::*;

    fn level(days: u32, label: &str) -> RankLevel {
        RankLevel { days, label: label.to_string() }
    }

    fn ladder() -> RankTable {
        RankTable::new(vec![RankDefinition {
            name: "Calendar".to_string(),
            levels: vec![level(7, "week"), level(30, "month"), level(90, "quarter")],
        }])
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn resolve_at(days: i64, offset: usize) -> RankResolution {
        ladder().resolve(now() - Duration::days(days), now(), "Calendar", offset)
    }

    #[test]
    fn test_current_rank_by_day() {
        assert_eq!(resolve_at(0, 0), RankResolution::Tier(level(7, "week")));
        assert_eq!(resolve_at(7, 0), RankResolution::Tier(level(7, "week")));
        assert_eq!(resolve_at(8, 0), RankResolution::Tier(level(30, "month")));
        assert_eq!(resolve_at(10, 0), RankResolution::Tier(level(30, "month")));
        assert_eq!(resolve_at(90, 0), RankResolution::Tier(level(90, "quarter")));
        assert_eq!(resolve_at(91, 0), RankResolution::Exhausted);
    }

    #[test]
    fn test_next_rank_by_day() {
        assert_eq!(resolve_at(10, 1), RankResolution::Tier(level(90, "quarter")));
        assert_eq!(resolve_at(50, 1), RankResolution::MaxRank(level(90, "quarter")));
        assert!(resolve_at(50, 1).is_max_rank());
        assert_eq!(resolve_at(200, 1), RankResolution::Exhausted);
    }

    #[test]
    fn test_partial_days_do_not_count() {
        let table = ladder();
        let start = now() - Duration::days(7) - Duration::hours(23);
        assert_eq!(table.resolve(start, now(), "calendar", 0).label(), "week");
    }

    #[test]
    fn test_unknown_system_is_exhausted() {
        let table = ladder();
        assert_eq!(table.resolve(now(), now(), "Pirates", 0), RankResolution::Exhausted);
        assert_eq!(
            table.current_and_next(now(), now(), None),
            (RankResolution::Exhausted, RankResolution::Exhausted)
        );
    }

    #[test]
    fn test_bad_ladders_are_rejected() {
        let duplicate_name = RankTable::new(vec![
            RankDefinition { name: "A".to_string(), levels: vec![level(1, "one")] },
            RankDefinition { name: "a".to_string(), levels: vec![level(2, "two")] },
        ]);
        assert!(duplicate_name.is_err());

        let duplicate_threshold = RankTable::new(vec![RankDefinition {
            name: "B".to_string(),
            levels: vec![level(5, "five"), level(5, "also five")],
        }]);
        assert!(duplicate_threshold.is_err());

        let empty = RankTable::new(vec![RankDefinition { name: "C".to_string(), levels: vec![] }]);
        assert!(empty.is_err());
    }
}
