use std::{fs, path::Path};

use logsift::{
    aggregate::{Node, OutputLayout},
    filter::{FilterConfig, PredicateSet},
    models::TimeRange,
    parser, run, Job,
};

const ALICE: &str = "2023-01-01T10:00:00 alice hello";
const BOB: &str = "2023-01-01T11:00:00 bob world";

fn predicates(filter: FilterConfig) -> PredicateSet {
    PredicateSet::build(&filter).unwrap()
}

fn job(dir: &Path, output: &str, filter: FilterConfig) -> Job {
    Job {
        dir: dir.to_owned(),
        ..Job::new(dir.join(output), predicates(filter))
    }
}

#[test]
fn scenario_a_user_filter_with_hour_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), format!("{}\n{}\n", ALICE, BOB)).unwrap();

    let mut job = job(
        dir.path(),
        "out.txt",
        FilterConfig {
            user: Some("alice".to_owned()),
            ..Default::default()
        },
    );
    job.group_by_time = Some(TimeRange::Hour);
    let summary = run(&job).unwrap();

    assert_eq!(
        format!("{}\n", ALICE),
        fs::read_to_string(dir.path().join("out.txt")).unwrap()
    );
    let report = summary.report.unwrap();
    assert_eq!(
        Node::Mapping([("2023-01-01T10".to_owned(), Node::Count(1))].into_iter().collect()),
        report.root
    );
}

#[test]
fn scenario_b_from_is_strict_lower_bound() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), format!("{}\n{}\n", ALICE, BOB)).unwrap();

    let summary = run(&job(
        dir.path(),
        "out.txt",
        FilterConfig {
            from: Some("2023-01-01T10:30:00".to_owned()),
            ..Default::default()
        },
    ))
    .unwrap();

    let raw = summary.records.iter().map(|r| r.raw()).collect::<Vec<_>>();
    assert_eq!(vec![BOB], raw);
}

#[test]
fn scenario_c_malformed_line_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.log"), "justonetoken\n").unwrap();

    let summary = run(&job(
        dir.path(),
        "out.txt",
        FilterConfig {
            pattern: Some("token".to_owned()),
            ..Default::default()
        },
    ))
    .unwrap();

    assert!(summary.records.is_empty());
    assert!(summary.failures.is_empty());
    assert_eq!(1, summary.skipped_lines);
    assert_eq!("", fs::read_to_string(dir.path().join("out.txt")).unwrap());
}

#[test]
fn scenario_d_output_is_not_an_input() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), format!("{}\n", ALICE)).unwrap();
    fs::write(dir.path().join("out.log"), format!("{}\n", ALICE)).unwrap();

    let filter = FilterConfig {
        user: Some("alice".to_owned()),
        ..Default::default()
    };
    let summary = run(&job(dir.path(), "out.log", filter.clone())).unwrap();
    assert_eq!(vec![dir.path().join("a.log")], summary.files);
    assert_eq!(1, summary.records.len());

    // A rerun must not pick up its own previous output either
    let summary = run(&job(dir.path(), "out.log", filter)).unwrap();
    assert_eq!(1, summary.records.len());
    assert_eq!(
        format!("{}\n", ALICE),
        fs::read_to_string(dir.path().join("out.log")).unwrap()
    );
}

fn ten_files(dir: &Path) {
    for f in 0..10 {
        let body = (0..200)
            .map(|n| {
                format!(
                    "2023-0{}-{:02}T{:02}:{:02}:00 user{} event {} of file {}\n",
                    1 + f % 3,
                    1 + n % 28,
                    n % 24,
                    n % 60,
                    n % 5,
                    n,
                    f
                )
            })
            .collect::<String>();
        fs::write(dir.join(format!("svc{}.log", f)), body).unwrap();
    }
}

#[test]
fn scenario_e_thread_count_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    ten_files(dir.path());
    let filter = FilterConfig {
        pattern: Some("event 1".to_owned()),
        from: Some("2023-01-05T00:00:00".to_owned()),
        ..Default::default()
    };

    let mut outputs = Vec::new();
    for (threads, name) in [(1, "one.txt"), (4, "four.txt")] {
        let mut job = job(dir.path(), name, filter.clone());
        job.threads = threads;
        run(&job).unwrap();
        outputs.push(fs::read(dir.path().join(name)).unwrap());
    }
    assert!(!outputs[0].is_empty());
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn output_order_is_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    ten_files(dir.path());
    let mut job = job(
        dir.path(),
        "out.txt",
        FilterConfig {
            user: Some("user3".to_owned()),
            ..Default::default()
        },
    );
    job.threads = 4;
    let summary = run(&job).unwrap();

    let mut expected = Vec::new();
    for path in &summary.files {
        let body = fs::read_to_string(path).unwrap();
        expected.extend(
            body.lines()
                .filter(|l| l.split(' ').nth(1) == Some("user3"))
                .map(str::to_owned),
        );
    }
    let got = summary.records.iter().map(|r| r.raw().to_owned()).collect::<Vec<_>>();
    assert_eq!(expected, got);
}

#[test]
fn bucket_counts_sum_to_record_count() {
    let dir = tempfile::tempdir().unwrap();
    ten_files(dir.path());
    let mut job = job(
        dir.path(),
        "out.txt",
        FilterConfig {
            pattern: Some("of file".to_owned()),
            ..Default::default()
        },
    );
    job.threads = 3;
    for range in [TimeRange::Hour, TimeRange::Day, TimeRange::Month] {
        for by_user in [false, true] {
            job.group_by_time = Some(range);
            job.group_by_user = by_user;
            let summary = run(&job).unwrap();
            let report = summary.report.unwrap();
            assert_eq!(summary.records.len() as u64, report.total());
        }
    }
}

#[test]
fn written_lines_reparse_to_the_same_fields() {
    let dir = tempfile::tempdir().unwrap();
    ten_files(dir.path());
    for layout in [OutputLayout::Terminated, OutputLayout::LeadingNewline] {
        let mut job = job(
            dir.path(),
            "out.txt",
            FilterConfig {
                user: Some("user2".to_owned()),
                ..Default::default()
            },
        );
        job.layout = layout;
        let summary = run(&job).unwrap();

        let written = fs::read_to_string(dir.path().join("out.txt")).unwrap();
        let reparsed = written
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| parser::parse(l.to_owned()).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(summary.records.len(), reparsed.len());
        for (original, again) in summary.records.iter().zip(&reparsed) {
            assert_eq!(original.timestamp(), again.timestamp());
            assert_eq!(original.user(), again.user());
            assert_eq!(original.message(), again.message());
        }
    }
}

#[test]
fn unreadable_file_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), format!("{}\n", ALICE)).unwrap();
    fs::write(dir.path().join("b.log"), b"2023-01-01T10:00:00 alice \xff\xfe\n").unwrap();
    fs::write(dir.path().join("c.log"), format!("{}\n", ALICE)).unwrap();

    let mut job = job(
        dir.path(),
        "out.txt",
        FilterConfig {
            user: Some("alice".to_owned()),
            ..Default::default()
        },
    );
    job.threads = 2;
    let summary = run(&job).unwrap();
    assert_eq!(2, summary.records.len());
    assert_eq!(1, summary.failures.len());
    assert_eq!(dir.path().join("b.log"), summary.failures[0].path);
}

#[test]
fn minute_precision_lines_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), "2023-01-01T10:00 alice hi\n").unwrap();

    let mut job = job(
        dir.path(),
        "out.txt",
        FilterConfig {
            user: Some("alice".to_owned()),
            from: Some("2023-01-01T09:59:59".to_owned()),
            ..Default::default()
        },
    );
    job.group_by_time = Some(TimeRange::Hour);
    let summary = run(&job).unwrap();

    assert_eq!(1, summary.records.len());
    assert_eq!(0, summary.skipped_lines);
    assert_eq!(
        "2023-01-01T10:00 alice hi\n",
        fs::read_to_string(dir.path().join("out.txt")).unwrap()
    );
    assert_eq!(1, summary.report.unwrap().total());
}
