//! Daily rotation for pipeline log files.
//!
//! log4rs' `TimeTrigger` cannot date a leftover file by its last write, fires
//! on empty files and has no way to tell the roller which day it closed, so
//! the pipeline file appender pairs these two with its `CompoundPolicy`:
//! [`DailyTrigger`] fires on the first record of a new calendar day and
//! [`DatedArchiveRoller`] moves the active file aside under the name of the
//! day being closed, keeping a bounded number of archives. Both share a
//! [`RollPeriod`].
//!
//! Nothing here logs: a record emitted while rolling would re-enter the
//! appender that is being rolled.

use super::clock::last_modified_date;
use crate::domain::pipeline_logging::{archive_date, archive_file_name, Clock};
use anyhow::{anyhow, Context};
use chrono::{Days, NaiveDate};
use log4rs::append::rolling_file::{
    policy::compound::{roll::Roll, trigger::Trigger, CompoundPolicy},
    LogFile,
};
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Debug, Default)]
struct PeriodState {
    current: Option<NaiveDate>,
    closed: Option<NaiveDate>,
}

/// Day covered by the active file, and the day handed over to the roller.
#[derive(Debug, Default)]
pub struct RollPeriod {
    state: Mutex<PeriodState>,
}

impl RollPeriod {
    fn lock(&self) -> anyhow::Result<MutexGuard<'_, PeriodState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("log rotation state is poisoned"))
    }

    fn take_closed(&self) -> anyhow::Result<Option<NaiveDate>> {
        Ok(self.lock()?.closed.take())
    }
}

pub fn daily_policy(clock: Arc<dyn Clock>, max_history: usize) -> CompoundPolicy {
    let period = Arc::new(RollPeriod::default());
    CompoundPolicy::new(
        Box::new(DailyTrigger::new(clock.clone(), period.clone())),
        Box::new(DatedArchiveRoller::new(clock, period, max_history)),
    )
}

#[derive(Debug)]
pub struct DailyTrigger {
    clock: Arc<dyn Clock>,
    period: Arc<RollPeriod>,
}

impl DailyTrigger {
    pub fn new(clock: Arc<dyn Clock>, period: Arc<RollPeriod>) -> Self {
        Self { clock, period }
    }

    /// Decides whether the active file must be rolled before the next record.
    ///
    /// A non-empty file found on the first call belongs to the day it was last
    /// written, so leftovers from an earlier run are archived under that day.
    pub fn should_roll(&self, file: &Path, len: u64) -> anyhow::Result<bool> {
        let today = self.clock.today();
        let mut state = self.period.lock()?;
        let current = *state.current.get_or_insert_with(|| {
            if len > 0 {
                last_modified_date(file).unwrap_or(today)
            } else {
                today
            }
        });

        if today <= current {
            return Ok(false);
        }

        state.current = Some(today);
        if len == 0 {
            return Ok(false);
        }

        state.closed = Some(current);
        Ok(true)
    }
}

impl Trigger for DailyTrigger {
    fn trigger(&self, file: &LogFile) -> anyhow::Result<bool> {
        self.should_roll(file.path(), file.len_estimate())
    }

    fn is_pre_process(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct DatedArchiveRoller {
    clock: Arc<dyn Clock>,
    period: Arc<RollPeriod>,
    max_history: usize,
}

impl DatedArchiveRoller {
    pub fn new(clock: Arc<dyn Clock>, period: Arc<RollPeriod>, max_history: usize) -> Self {
        Self {
            clock,
            period,
            max_history,
        }
    }

    /// Archives of `active_file` found next to it, newest first.
    pub fn archives(active_file: &Path) -> io::Result<Vec<(NaiveDate, PathBuf)>> {
        let directory = match active_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut archives = vec![];
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(date) = archive_date(active_file, &name.to_string_lossy()) {
                archives.push((date, entry.path()));
            }
        }
        archives.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(archives)
    }

    fn closed_date(&self, file: &Path) -> anyhow::Result<NaiveDate> {
        if let Some(date) = self.period.take_closed()? {
            return Ok(date);
        }
        if let Ok(date) = last_modified_date(file) {
            return Ok(date);
        }

        let today = self.clock.today();
        Ok(today.checked_sub_days(Days::new(1)).unwrap_or(today))
    }

    fn archive(&self, file: &Path) -> anyhow::Result<PathBuf> {
        let archive = archive_file_name(file, self.closed_date(file)?);

        if archive.exists() {
            let mut active = File::open(file)
                .with_context(|| format!("failed to open {}", file.display()))?;
            let mut target = OpenOptions::new()
                .append(true)
                .open(&archive)
                .with_context(|| format!("failed to open {}", archive.display()))?;
            io::copy(&mut active, &mut target)?;
            fs::remove_file(file)?;
        } else {
            fs::rename(file, &archive).with_context(|| {
                format!("failed to move {} to {}", file.display(), archive.display())
            })?;
        }

        Ok(archive)
    }

    /// A `max_history` of zero keeps every archive.
    fn prune(&self, file: &Path) -> anyhow::Result<()> {
        if self.max_history == 0 {
            return Ok(());
        }

        for (_, expired) in Self::archives(file)?.into_iter().skip(self.max_history) {
            fs::remove_file(&expired)
                .with_context(|| format!("failed to remove {}", expired.display()))?;
        }

        Ok(())
    }
}

impl Roll for DatedArchiveRoller {
    fn roll(&self, file: &Path) -> anyhow::Result<()> {
        if file.exists() {
            self.archive(file)?;
        }

        self.prune(file)
    }
}
