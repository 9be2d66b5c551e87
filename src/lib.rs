//! Filters line-oriented log files concurrently and aggregates the matches.
//!
//! Each line has the shape `<ISO local timestamp> <user> <message>`. Every
//! discovered file is filtered on its own worker, the surviving lines are
//! merged in discovery order, written to a single output file and counted
//! per time bucket (and optionally per user).

use derive_more::{Display, From};

pub mod aggregate;
pub mod discover;
pub mod dispatch;
pub mod filter;
pub mod job;
pub mod logging;
pub mod models;
pub mod parser;
pub mod task;

pub use job::{run, Job, RunSummary};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "Unable to start worker pool: {}", _0)]
    Pool(rayon::ThreadPoolBuildError),
    #[display(fmt = "Unable to list input directory: {}", _0)]
    Discover(std::io::Error),
    #[display(fmt = "{}", _0)]
    Write(aggregate::WriteError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Pool(e) => Some(e),
            Error::Discover(e) => Some(e),
            Error::Write(e) => Some(e),
        }
    }
}
