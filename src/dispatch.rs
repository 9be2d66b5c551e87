use std::path::PathBuf;

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    filter::PredicateSet,
    task::{filter_file, FileError, FileOutput},
};

/// Joined results of one dispatch, in the order the paths were given.
#[derive(Debug, Default)]
pub struct Dispatched {
    /// One entry per input path; a failed file contributes an empty entry.
    pub outputs: Vec<FileOutput>,
    pub failures: Vec<FileError>,
}

/// Runs one file task per path on a dedicated pool of `threads` workers.
pub struct Dispatcher {
    pool: rayon::ThreadPool,
}

impl Dispatcher {
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("logsift-worker-{}", i))
            .build()?;
        Ok(Dispatcher { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Blocks until every task has finished. Failures are reported through
    /// a side channel and never cancel sibling tasks.
    pub fn run(&self, paths: &[PathBuf], predicates: &PredicateSet) -> Dispatched {
        let (error_sender, error_receiver) = crossbeam_channel::unbounded::<(usize, FileError)>();

        // Indexed collect keeps submission order regardless of completion order
        let outputs: Vec<FileOutput> = self.pool.install(|| {
            paths
                .par_iter()
                .enumerate()
                .map_with(error_sender, |errors, (index, path)| {
                    match filter_file(path, predicates) {
                        Ok(output) => output,
                        Err(err) => {
                            // receiver outlives the pool
                            let _ = errors.send((index, err));
                            FileOutput::empty(path)
                        }
                    }
                })
                .collect()
        });

        let failures = error_receiver
            .try_iter()
            .sorted_by_key(|(index, _)| *index)
            .map(|(_, err)| err)
            .collect::<Vec<_>>();
        for failure in &failures {
            warn!("{}", failure);
        }
        debug!(
            files = paths.len(),
            failed = failures.len(),
            threads = self.threads(),
            "dispatch joined"
        );

        Dispatched { outputs, failures }
    }
}
