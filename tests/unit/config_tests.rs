/// Configuration defaults and the scoring rules they feed
use chrono::{Duration, TimeZone, Utc};
use recovery_tracker_mcp::*;

#[cfg(test)]
mod config_unit_tests {
    use super::*;

    #[test]
    fn test_default_ladders_and_tasks() {
        let config = TrackerConfig::default();
        let ranks = config.rank_table().unwrap();

        assert_eq!(ranks.names(), vec!["Military", "Belts", "Memes"]);
        assert_eq!(ranks.get("belts").unwrap().levels[0].label, "White belt");
        assert_eq!(config.task_catalog().definitions().len(), 8);
    }

    #[test]
    fn test_config_from_json() {
        let raw = r#"{
            "rank_systems": [
                { "name": "Seasons", "levels": [
                    { "days": 365, "label": "year" },
                    { "days": 90, "label": "season" }
                ] }
            ],
            "limits": { "page_size": 25 }
        }"#;
        let config: TrackerConfig = serde_json::from_str(raw).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.page_size, 25);
        assert_eq!(config.limits.answer_timeout_secs, 300);

        // ladders come back sorted by threshold
        let ranks = config.rank_table().unwrap();
        assert_eq!(ranks.get("Seasons").unwrap().levels[0].label, "season");
    }

    #[test]
    fn test_limits_are_checked() {
        let mut config = TrackerConfig::default();
        config.limits.answer_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.limits.daily_check_ins = 0;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.tasks.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let mut config = TrackerConfig::default();
        config.limits.page_size = 0;
        let storage = SqliteStorage::open_in_memory().unwrap();
        let clock = std::sync::Arc::new(ManualClock::new(Utc::now()));

        let result = RecoveryTrackerServer::with_clock(storage, config, clock);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn test_manual_clock_day_boundary() {
        let noon = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let clock = ManualClock::new(noon);
        assert_eq!(clock.local_midnight(), Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());

        clock.advance(Duration::hours(13));
        assert_eq!(clock.local_midnight(), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        // two hours east of UTC the day turns over at 22:00 UTC
        let east = ManualClock::with_offset(noon, chrono::FixedOffset::east_opt(2 * 3600).unwrap());
        east.set(Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());
        assert_eq!(east.local_midnight(), Utc.with_ymd_and_hms(2024, 2, 29, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_scoring_constants() {
        assert_eq!(scoring::POINTS_PER_DAY, 2);
        assert_eq!(scoring::POINTS_PER_ENTRY, 1);
    }
}
