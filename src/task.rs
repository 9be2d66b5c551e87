use std::{
    fs::File,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{filter::PredicateSet, models::LogRecord, parser};

/// Surviving records of one file, in line order.
#[derive(Debug, Default)]
pub struct FileOutput {
    pub path: PathBuf,
    pub records: Vec<LogRecord>,
    pub lines: usize,
    /// Lines dropped because they could not be parsed.
    pub skipped: usize,
}

impl FileOutput {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        FileOutput {
            path: path.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct FileError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unable to read '{}': {}", self.path.display(), self.source)
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub type FileTaskResult = Result<FileOutput, FileError>;

// The output is wrapped in a Result to allow matching on errors
// Returns an Iterator to the Reader of the lines of the file.
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

/// Streams one file and keeps the lines that pass every predicate.
///
/// A read failure anywhere in the file discards what was collected so far;
/// the caller sees only the error. The file handle is dropped before
/// returning on every path.
pub fn filter_file(path: &Path, predicates: &PredicateSet) -> FileTaskResult {
    let to_file_error = |source| FileError {
        path: path.to_owned(),
        source,
    };
    let lines = read_lines(path).map_err(to_file_error)?;
    filter_lines(path, lines, predicates).map_err(to_file_error)
}

/// Line-level half of [`filter_file`], usable with any line source.
pub fn filter_lines<I>(path: &Path, lines: I, predicates: &PredicateSet) -> io::Result<FileOutput>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut output = FileOutput::empty(path);
    for (index, line) in lines.into_iter().enumerate() {
        let line = line?;
        output.lines += 1;
        match parser::parse(line) {
            Ok(record) => {
                if predicates.matches(&record) {
                    output.records.push(record);
                }
            }
            Err(err) => {
                trace!(path = %path.display(), line = index + 1, "{}", err);
                output.skipped += 1;
            }
        }
    }
    debug!(
        path = %path.display(),
        lines = output.lines,
        kept = output.records.len(),
        skipped = output.skipped,
        "filtered file"
    );
    Ok(output)
}
