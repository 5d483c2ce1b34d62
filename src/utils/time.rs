use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// A timestamp between 0 and `max_days - 1` whole days before `now`.
pub fn random_days_ago(now: DateTime<Utc>, max_days: i64, rng: &mut impl Rng) -> DateTime<Utc> {
    let days = rng.gen_range(0..max_days.max(1));
    now - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_days_ago_stays_within_window() {
        let mut rng = rand::thread_rng();
        let base = now();
        for _ in 0..50 {
            let ts = random_days_ago(base, 7, &mut rng);
            assert!(ts <= base);
            assert!(base - ts < Duration::days(7));
        }
    }
}
