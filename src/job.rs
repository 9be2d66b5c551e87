use std::path::PathBuf;

use tracing::info;

use crate::{
    aggregate::{merge, write_records, AggregateReport, OutputLayout},
    discover::discover,
    dispatch::Dispatcher,
    filter::PredicateSet,
    models::{LogRecord, TimeRange},
    task::FileError,
    Error,
};

/// A fully resolved run.
#[derive(Debug, Clone)]
pub struct Job {
    pub dir: PathBuf,
    pub suffix: String,
    pub output: PathBuf,
    pub threads: usize,
    pub predicates: PredicateSet,
    pub group_by_time: Option<TimeRange>,
    pub group_by_user: bool,
    pub layout: OutputLayout,
}

impl Job {
    pub fn new(output: impl Into<PathBuf>, predicates: PredicateSet) -> Self {
        Job {
            dir: PathBuf::from("."),
            suffix: ".log".to_owned(),
            output: output.into(),
            threads: 1,
            predicates,
            group_by_time: None,
            group_by_user: false,
            layout: OutputLayout::default(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub files: Vec<PathBuf>,
    pub failures: Vec<FileError>,
    /// Merged records, in the order they were written.
    pub records: Vec<LogRecord>,
    pub skipped_lines: usize,
    pub report: Option<AggregateReport>,
}

/// Discovers, filters, writes and aggregates. The output file is only
/// written after every file task has been joined.
pub fn run(job: &Job) -> Result<RunSummary, Error> {
    info!(dir = %job.dir.display(), suffix = %job.suffix, "scanning");
    let files = discover(&job.dir, &job.suffix, &job.output)?;
    info!(files = files.len(), threads = job.threads, "dispatching");

    let dispatched = Dispatcher::new(job.threads)?.run(&files, &job.predicates);
    let skipped_lines: usize = dispatched.outputs.iter().map(|o| o.skipped).sum();
    let records = merge(dispatched.outputs);

    write_records(&job.output, &records, job.layout)?;
    info!(
        output = %job.output.display(),
        records = records.len(),
        failed_files = dispatched.failures.len(),
        skipped_lines,
        "output written"
    );

    let report = job
        .group_by_time
        .map(|range| AggregateReport::build(&records, range, job.group_by_user));

    Ok(RunSummary {
        files,
        failures: dispatched.failures,
        records,
        skipped_lines,
        report,
    })
}
