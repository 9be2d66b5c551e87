use std::{io::Write, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing::{info, warn};

use logsift::{
    aggregate::OutputLayout,
    filter::{ConfigError, FilterConfig, PredicateSet},
    logging::init_logging,
    models::TimeRange,
    Job, RunSummary,
};

/// Filter log files in a directory by user, message and time range, write
/// the matching lines to one file and count them per time bucket.
#[derive(Debug, Parser)]
#[command(version)]
struct Command {
    /// Worker threads
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    threads: u16,
    /// Output file, replaced if it exists
    #[arg(short, long)]
    output: PathBuf,
    /// Group counts by time: h(our), d(ay) or m(onth)
    #[arg(short = 'a', long)]
    time: Option<String>,
    /// Also group counts by user (needs --time)
    #[arg(short, long)]
    group_user: bool,
    /// Keep lines whose user contains this text
    #[arg(short, long)]
    user: Option<String>,
    /// Keep lines whose message contains this text
    #[arg(short, long)]
    pattern: Option<String>,
    /// Keep lines strictly after this time (YYYY-MM-DDTHH:MM:SS)
    #[arg(short, long)]
    from: Option<String>,
    /// Keep lines strictly before this time (YYYY-MM-DDTHH:MM:SS)
    #[arg(short = 'T', long)]
    to: Option<String>,
    /// Directory to scan
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    /// File name suffix of the files to scan
    #[arg(short, long, default_value = ".log")]
    suffix: String,
    /// Precede every output line with a newline instead of terminating it
    #[arg(long)]
    leading_newline: bool,
    /// More logging on stderr, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Command {
    fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            user: self.user.clone(),
            pattern: self.pattern.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    fn job(&self, filter: &FilterConfig) -> Result<Job, ConfigError> {
        let predicates = PredicateSet::build(filter)?;
        let group_by_time = self
            .time
            .as_deref()
            .map(|code| TimeRange::from_code(code).ok_or_else(|| ConfigError::TimeRange(code.to_owned())))
            .transpose()?;
        if self.group_user && group_by_time.is_none() {
            warn!("--group-user has no effect without --time");
        }
        Ok(Job {
            dir: self.dir.clone(),
            suffix: self.suffix.clone(),
            output: self.output.clone(),
            threads: usize::from(self.threads),
            predicates,
            group_by_time,
            group_by_user: self.group_user && group_by_time.is_some(),
            layout: if self.leading_newline {
                OutputLayout::LeadingNewline
            } else {
                OutputLayout::Terminated
            },
        })
    }
}

fn print_report(summary: &RunSummary) -> anyhow::Result<()> {
    if let Some(report) = &summary.report {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        report.write_to(&mut out).context("Unable to print report")?;
        out.flush().context("Unable to print report")?;
    }
    Ok(())
}

fn execute(job: &Job) -> anyhow::Result<()> {
    let summary = logsift::run(job).context("Filtering failed")?;
    print_report(&summary)?;
    info!(
        files = summary.files.len(),
        failed = summary.failures.len(),
        records = summary.records.len(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cmd = Command::parse();
    init_logging(cmd.verbose);

    let filter = cmd.filter_config();
    if filter.is_empty() {
        info!("no filter criteria given, nothing to do");
        return ExitCode::SUCCESS;
    }

    let job = match cmd.job(&filter) {
        Ok(job) => job,
        Err(err) => Command::command().error(ErrorKind::ValueValidation, err).exit(),
    };

    match execute(&job) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
