use crate::domain::pipeline_logging::Clock;
use chrono::{Days, NaiveDate};
use std::sync::Mutex;

/// Clock whose day only changes when told to.
#[derive(Debug)]
pub struct InMemoryClock {
    today: Mutex<NaiveDate>,
}

impl InMemoryClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut today) = self.today.lock() {
            *today = date;
        }
    }

    pub fn advance_days(&self, days: u64) {
        if let Ok(mut today) = self.today.lock() {
            if let Some(next) = today.checked_add_days(Days::new(days)) {
                *today = next;
            }
        }
    }
}

impl Clock for InMemoryClock {
    fn today(&self) -> NaiveDate {
        match self.today.lock() {
            Ok(today) => *today,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
