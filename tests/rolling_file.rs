use std::{
    fs::{self, File},
    path::PathBuf,
    sync::Arc,
    time::SystemTime,
};

use chrono::{Local, NaiveDate};
use cucumber::{given, then, when, World};
use data_flow::{
    domain::{
        configuration::FileLogConfig,
        pipeline_logging::{log_file_path, Clock},
    },
    infrastructure::{
        in_memory::InMemoryClock, logger::rolling_file_appender, rolling::DatedArchiveRoller,
    },
};
use log::{Level, Record};
use log4rs::append::{rolling_file::RollingFileAppender, Append};
use tempfile::TempDir;

#[derive(Debug, World)]
struct RollingFileWorld {
    log_dir: TempDir,
    clock: Arc<InMemoryClock>,
    active_file: Option<PathBuf>,
    appender: Option<RollingFileAppender>,
}

impl Default for RollingFileWorld {
    fn default() -> Self {
        Self {
            log_dir: tempfile::tempdir().expect("failed to create a scratch directory"),
            clock: Arc::new(InMemoryClock::new(parse_date("1970-01-01"))),
            active_file: None,
            appender: None,
        }
    }
}

impl RollingFileWorld {
    fn active_file(&self) -> &PathBuf {
        self.active_file
            .as_ref()
            .expect("a file logger must be configured first")
    }

    fn read(&self, file_name: &str) -> String {
        let path = self.log_dir.path().join(file_name);
        match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => panic!("Failed to read {}: {}", path.display(), e),
        }
    }
}

fn parse_date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

fn noon(date: NaiveDate) -> SystemTime {
    let local = date
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .single()
        .unwrap();
    SystemTime::from(local)
}

#[given(expr = "today is {string}")]
fn given_today(case: &mut RollingFileWorld, date: String) {
    case.clock.set(parse_date(&date));
}

#[given(expr = "the archive {string} containing {string}")]
fn given_an_archive(case: &mut RollingFileWorld, file_name: String, content: String) {
    fs::write(case.log_dir.path().join(file_name), format!("{}\n", content)).unwrap();
}

#[given(expr = "an active log file for pipeline {string} last written on {string} containing {string}")]
fn given_a_leftover_file(case: &mut RollingFileWorld, pipeline: String, date: String, content: String) {
    let path = log_file_path(case.log_dir.path(), &pipeline);
    fs::write(&path, format!("{}\n", content)).unwrap();
    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(noon(parse_date(&date))).unwrap();
}

#[given(expr = "a file logger for pipeline {string} keeping {int} archives")]
fn given_a_file_logger(case: &mut RollingFileWorld, pipeline: String, max_history: usize) {
    let config = FileLogConfig {
        log_pattern: "{m}{n}".into(),
        directory: case.log_dir.path().to_path_buf(),
        max_history,
    };
    let clock: Arc<dyn Clock> = case.clock.clone();
    let appender = match rolling_file_appender(&pipeline, &config, clock) {
        Ok(a) => a,
        Err(e) => panic!("Failed to open the pipeline log file: {}", e),
    };

    case.active_file = Some(log_file_path(case.log_dir.path(), &pipeline));
    case.appender = Some(appender);
}

#[when(expr = "the record {string} is written")]
fn when_a_record_is_written(case: &mut RollingFileWorld, message: String) {
    let appender = case.appender.as_ref().unwrap();
    let written = appender.append(
        &Record::builder()
            .args(format_args!("{}", message))
            .level(Level::Info)
            .target("Sales Data")
            .build(),
    );

    if let Err(e) = written {
        panic!("Failed to write record: {}", e);
    }
}

#[when("the day changes")]
fn when_the_day_changes(case: &mut RollingFileWorld) {
    case.clock.advance_days(1);
}

#[then(expr = "there should be {int} archives")]
fn then_archive_count(case: &mut RollingFileWorld, count: usize) {
    let archives = DatedArchiveRoller::archives(case.active_file()).unwrap();
    assert_eq!(count, archives.len(), "archives: {:#?}", archives);
}

#[then(expr = "the archive {string} should contain {string}")]
fn then_archive_contains(case: &mut RollingFileWorld, file_name: String, content: String) {
    let archive = case.read(&file_name);
    if !archive.lines().any(|l| l == content) {
        panic!("{} should contain {:?} but was {:?}", file_name, content, archive);
    }
}

#[then(expr = "the active log file should contain {string}")]
fn then_active_contains(case: &mut RollingFileWorld, content: String) {
    let active = fs::read_to_string(case.active_file()).unwrap();
    if !active.lines().any(|l| l == content) {
        panic!("Active log file should contain {:?} but was {:?}", content, active);
    }
}

#[then(expr = "the active log file should not contain {string}")]
fn then_active_does_not_contain(case: &mut RollingFileWorld, content: String) {
    let active = fs::read_to_string(case.active_file()).unwrap();
    if active.lines().any(|l| l == content) {
        panic!("Active log file should not contain {:?}", content);
    }
}

#[then(expr = "the file {string} should still exist")]
fn then_file_exists(case: &mut RollingFileWorld, file_name: String) {
    if !case.log_dir.path().join(&file_name).is_file() {
        panic!("{} should not have been removed", file_name);
    }
}

fn main() {
    futures::executor::block_on(
        RollingFileWorld::cucumber().run_and_exit("features/rolling-file.feature"),
    );
}
