use chrono::Utc;

use super::category::Category;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Hands out opaque ids derived from the clock.
///
/// Each id is the current epoch-millisecond value, bumped past the previously
/// issued one when the clock has not advanced, so ids from one generator are
/// strictly increasing and never repeat.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator::default()
    }

    /// A generator that will never reissue a numeric id already present in
    /// `categories` (category ids and task ids alike).
    pub fn seeded(categories: &[Category]) -> Self {
        let mut max = 0i64;
        for cat in categories {
            bump_max(&cat.id, &mut max);
            for task in &cat.tasks {
                bump_max(&task.id, &mut max);
            }
        }
        IdGenerator { last: max }
    }

    /// Issue the next id.
    pub fn next_id(&mut self) -> String {
        self.next_at(now_millis())
    }

    fn next_at(&mut self, now: i64) -> String {
        let value = now.max(self.last.saturating_add(1));
        self.last = value;
        value.to_string()
    }
}

fn bump_max(id: &str, max: &mut i64) {
    if let Ok(n) = id.parse::<i64>()
        && n > *max
    {
        *max = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn rapid_calls_never_collide() {
        let mut ids = IdGenerator::new();
        let issued: HashSet<String> = (0..10_000).map(|_| ids.next_id()).collect();
        assert_eq!(issued.len(), 10_000);
    }

    #[test]
    fn frozen_clock_still_advances() {
        let mut ids = IdGenerator::new();
        let a = ids.next_at(1_000);
        let b = ids.next_at(1_000);
        let c = ids.next_at(999);
        assert_eq!(a, "1000");
        assert_eq!(b, "1001");
        assert_eq!(c, "1002");
    }

    #[test]
    fn seeded_generator_skips_existing_ids() {
        let mut cat = Category::new("5000".into(), "Work", "#000000");
        cat.tasks
            .push(crate::model::task::Task::new("9000".into(), "t", 0));
        let other = Category::new("not-a-number".into(), "Misc", "#111111");

        let mut ids = IdGenerator::seeded(&[cat, other]);
        assert_eq!(ids.next_at(10), "9001");
    }
}
