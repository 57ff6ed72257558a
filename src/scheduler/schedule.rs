//! 每日触发时间与重试策略

use crate::error::SchedulerError;
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// 每天固定时刻（UTC）触发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, SchedulerError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or(SchedulerError::InvalidSchedule { hour, minute })
    }

    /// 严格晚于 `t` 的下一个触发时刻
    pub fn next_after(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        let today = t.date_naive().and_time(self.time).and_utc();
        if today > t {
            today
        } else {
            (t.date_naive() + Duration::days(1))
                .and_time(self.time)
                .and_utc()
        }
    }
}

/// 任务失败后的重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: std::time::Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: std::time::Duration) -> Self {
        Self { retries, delay }
    }

    /// 总尝试次数
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_after_same_day() {
        let schedule = DailySchedule::new(2, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(
            schedule.next_after(now),
            Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_after_rolls_over() {
        let schedule = DailySchedule::new(2, 0).unwrap();
        let at_fire = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(at_fire),
            Utc.with_ymd_and_hms(2024, 3, 11, 2, 0, 0).unwrap()
        );

        let end_of_month = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap();
        assert_eq!(
            schedule.next_after(end_of_month),
            Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_schedule() {
        assert!(matches!(
            DailySchedule::new(24, 0),
            Err(SchedulerError::InvalidSchedule { hour: 24, minute: 0 })
        ));
    }

    #[test]
    fn test_retry_policy() {
        assert_eq!(RetryPolicy::new(1, std::time::Duration::from_secs(300)).max_attempts(), 2);
        assert_eq!(RetryPolicy::new(0, std::time::Duration::ZERO).max_attempts(), 1);
    }
}
