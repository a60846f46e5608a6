use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use logparser::search::{LineScanner, PatternMatcher};
use logparser::{parse, ParserConfig};
use std::{fs::File, io::Write};
use tempfile::tempdir;

const LINE_PATTERN: &str = r".*(E|e)xception:.+";
const CONTINUATION_PATTERN: &str = r"(\s+at|Caused by:).+";

fn create_log_files(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for i in 0..file_count {
        let file_path = dir.path().join(format!("service_{}.log", i));
        let mut file = File::create(file_path)?;
        for j in 0..lines_per_file {
            if j % 20 == 0 {
                writeln!(file, "[10:{:02}] java.lang.IllegalStateException: failure {}", j % 60, j % 7)?;
                writeln!(file, "    at com.example.Worker.run(Worker.java:{})", j % 7)?;
                writeln!(file, "    at java.lang.Thread.run(Thread.java:750)")?;
            } else {
                writeln!(file, "[10:{:02}] INFO request {} served in {}ms", j % 60, j, j % 13)?;
            }
        }
    }
    Ok(())
}

fn bench_line_scanner(c: &mut Criterion) {
    let lines = PatternMatcher::lines(&[LINE_PATTERN]).unwrap();
    let continuations = PatternMatcher::continuations(&[CONTINUATION_PATTERN]).unwrap();
    let sample = [
        "[10:00] INFO request 1 served in 3ms",
        "[10:01] java.lang.IllegalStateException: failure",
        "    at com.example.Worker.run(Worker.java:1)",
        "    at java.lang.Thread.run(Thread.java:750)",
        "[10:02] INFO request 2 served in 4ms",
    ];

    c.bench_function("classify_lines", |b| {
        b.iter(|| {
            let mut scanner = LineScanner::new(&lines, &continuations, 50);
            sample
                .iter()
                .filter(|line| scanner.classify(black_box(line)).is_some())
                .count()
        })
    });
}

fn bench_modes(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    create_log_files(&dir, 20, 1000).unwrap();
    let out = tempdir().unwrap();

    let mut group = c.benchmark_group("parse_modes");
    for aggregate in [false, true] {
        let mut config = ParserConfig::new(dir.path(), out.path().join("results"));
        config.aggregate = aggregate;
        config.log_level = "warn".to_string();
        let name = if aggregate { "aggregate" } else { "filter" };
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| parse(black_box(config)).unwrap())
        });
    }
    group.finish();
}

fn bench_file_count_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_count_scaling");
    for file_count in [1, 10, 50] {
        let dir = tempdir().unwrap();
        create_log_files(&dir, file_count, 200).unwrap();
        let out = tempdir().unwrap();

        let mut config = ParserConfig::new(dir.path(), out.path().join("results"));
        config.aggregate = true;
        group.bench_with_input(
            BenchmarkId::from_parameter(file_count),
            &config,
            |b, config| b.iter(|| parse(black_box(config)).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_line_scanner,
    bench_modes,
    bench_file_count_scaling
);
criterion_main!(benches);
