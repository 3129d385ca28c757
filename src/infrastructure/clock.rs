use crate::domain::pipeline_logging::Clock;
use chrono::{DateTime, Local, NaiveDate};
use std::{io, path::Path, time::SystemTime};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Local calendar day on which `path` was last written.
pub fn last_modified_date(path: &Path) -> io::Result<NaiveDate> {
    let modified: SystemTime = path.metadata()?.modified()?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}
