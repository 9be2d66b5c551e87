use std::{
    collections::BTreeMap,
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tempfile::NamedTempFile;

use crate::{
    models::{LogRecord, TimeRange},
    task::FileOutput,
};

/// Concatenates per-file records in dispatch order.
pub fn merge(outputs: Vec<FileOutput>) -> Vec<LogRecord> {
    outputs.into_iter().flat_map(|o| o.records).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// One record per line, each followed by a newline.
    #[default]
    Terminated,
    /// Each record preceded by a newline: the file starts with a blank line
    /// and has no trailing newline.
    LeadingNewline,
}

#[derive(Debug)]
pub struct WriteError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unable to write output file '{}': {}", self.path.display(), self.source)
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub fn write_to<W: Write>(out: &mut W, records: &[LogRecord], layout: OutputLayout) -> io::Result<()> {
    for record in records {
        match layout {
            OutputLayout::Terminated => writeln!(out, "{}", record.raw())?,
            OutputLayout::LeadingNewline => write!(out, "\n{}", record.raw())?,
        }
    }
    out.flush()
}

/// Writes the records to `path`, replacing any existing file.
///
/// Data goes to a temporary file next to `path` that is renamed over it only
/// once everything was written, so a failure leaves no partial output.
pub fn write_records(path: &Path, records: &[LogRecord], layout: OutputLayout) -> Result<(), WriteError> {
    let write = || -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_to(&mut writer, records, layout)?;
        }
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    };
    write().map_err(|source| WriteError {
        path: path.to_owned(),
        source,
    })
}

/// Node of an aggregate report: a leaf count or a keyed mapping of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Count(u64),
    Mapping(BTreeMap<String, Node>),
}

impl Node {
    pub fn total(&self) -> u64 {
        match self {
            Node::Count(n) => *n,
            Node::Mapping(children) => children.values().map(Node::total).sum(),
        }
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Count(_) => None,
            Node::Mapping(children) => children.get(key),
        }
    }

    fn render<W: Write>(&self, out: &mut W, prefix: &str) -> io::Result<()> {
        match self {
            Node::Count(n) => writeln!(out, "{}{}", prefix, n),
            Node::Mapping(children) => {
                for (key, child) in children {
                    child.render(out, &format!("{}{} ", prefix, key))?;
                }
                Ok(())
            }
        }
    }
}

/// Counts of the merged records per time bucket, optionally split by user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    pub range: TimeRange,
    pub by_user: bool,
    /// bucket -> count, or bucket -> user -> count
    pub root: Node,
}

impl AggregateReport {
    pub fn build(records: &[LogRecord], range: TimeRange, by_user: bool) -> Self {
        let root = if by_user {
            let nested = records.iter().fold(
                BTreeMap::<&str, BTreeMap<&str, u64>>::new(),
                |mut acc, record| {
                    *acc.entry(record.bucket(range))
                        .or_default()
                        .entry(record.user())
                        .or_default() += 1;
                    acc
                },
            );
            Node::Mapping(
                nested
                    .into_iter()
                    .map(|(bucket, users)| {
                        let users = users
                            .into_iter()
                            .map(|(user, n)| (user.to_owned(), Node::Count(n)))
                            .collect();
                        (bucket.to_owned(), Node::Mapping(users))
                    })
                    .collect(),
            )
        } else {
            Node::Mapping(
                records
                    .iter()
                    .counts_by(|record| record.bucket(range))
                    .into_iter()
                    .map(|(bucket, n)| (bucket.to_owned(), Node::Count(n as u64)))
                    .collect(),
            )
        };
        AggregateReport {
            range,
            by_user,
            root,
        }
    }

    pub fn total(&self) -> u64 {
        self.root.total()
    }

    /// Console layout: a header, `<bucket> <count>` per bucket and, when split
    /// by user, `<bucket> <user> <count>` per pair present in the data.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Time range / count")?;
        if let Node::Mapping(buckets) = &self.root {
            for (bucket, node) in buckets {
                writeln!(out, "{} {}", bucket, node.total())?;
            }
        }
        if self.by_user {
            self.root.render(out, "")?;
        }
        Ok(())
    }
}
