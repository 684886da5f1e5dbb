//! Runs the built binaries under the real tools: valgrind for
//! `simple-memory`, mpiexec for `simple-mpi`.
//!
//! These need an MPI launcher (and valgrind) on PATH, so they are ignored by
//! default. Run with: cargo test --test launcher -- --ignored --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SIMPLE_MEMORY: &str = env!("CARGO_BIN_EXE_simple-memory");
const SIMPLE_MPI: &str = env!("CARGO_BIN_EXE_simple-mpi");

fn have(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// `mpiexec -n <n> <args...>`, allowed to oversubscribe and to run as root
/// under Open MPI. MPICH ignores the variables.
fn mpiexec(n: u32, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new("mpiexec");
    cmd.arg("-n")
        .arg(n.to_string())
        .args(args)
        .env("OMPI_ALLOW_RUN_AS_ROOT", "1")
        .env("OMPI_ALLOW_RUN_AS_ROOT_CONFIRM", "1")
        .env("OMPI_MCA_rmaps_base_oversubscribe", "1");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd.output().expect("failed to spawn mpiexec")
}

/// Split one valgrind log into its records, with the `==pid== ` prefixes
/// removed. Records are separated by blank lines.
fn valgrind_records(log: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();
    for line in log.lines() {
        let body = match line.strip_prefix("==") {
            Some(rest) => rest.split_once("== ").map_or("", |(_, b)| b),
            None => line,
        };
        if body.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(body);
            current.push('\n');
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

fn count_in_routine(records: &[String], headline: &str) -> usize {
    records
        .iter()
        .filter(|r| r.starts_with(headline) && r.contains("buggy_routine"))
        .count()
}

#[test]
fn valgrind_records_strip_pid_prefixes() {
    let log = "==41== Invalid write of size 4\n\
               ==41==    at 0x1: mpi_debug_demos::leaky::buggy_routine (leaky.rs:73)\n\
               ==41== \n\
               ==41== Conditional jump or move depends on uninitialised value(s)\n\
               ==41==    at 0x2: mpi_debug_demos::leaky::buggy_routine (leaky.rs:79)\n";
    let records = valgrind_records(log);
    assert_eq!(records.len(), 2);
    assert_eq!(count_in_routine(&records, "Invalid write of size 4"), 1);
    assert_eq!(
        count_in_routine(&records, "Conditional jump or move depends on uninitialised value"),
        1
    );
}

#[test]
#[ignore = "needs mpiexec and valgrind"]
fn memory_checker_sees_every_planted_defect() {
    if !have("mpiexec") || !have("valgrind") {
        eprintln!("SKIP: mpiexec or valgrind not on PATH");
        return;
    }
    let logs = tempfile::tempdir().unwrap();
    let log_pattern = logs.path().join("vg.%p");
    let log_arg = format!("--log-file={}", log_pattern.display());

    let ranks = 2;
    let output = mpiexec(
        ranks,
        &["valgrind", "--leak-check=full", log_arg.as_str(), SIMPLE_MEMORY],
        &[],
    );
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for rank in 0..ranks {
        let line = format!("Hello World from process {rank} of {ranks}");
        assert_eq!(stdout.lines().filter(|l| *l == line).count(), 1, "{stdout}");
    }

    let logs = read_logs(logs.path());
    assert_eq!(logs.len(), ranks as usize);
    for log in &logs {
        let records = valgrind_records(log);
        assert_eq!(count_in_routine(&records, "Invalid write of size 4"), 2, "{log}");
        assert_eq!(
            count_in_routine(
                &records,
                "Conditional jump or move depends on uninitialised value"
            ),
            1,
            "{log}"
        );
        assert_eq!(
            count_in_routine(&records, "40 bytes in 1 blocks are definitely lost"),
            1,
            "{log}"
        );
    }
    println!("PASS: memory checker found every defect on {ranks} ranks");
}

fn read_logs(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect()
}

#[test]
#[ignore = "needs mpiexec"]
fn barrier_demo_under_mpiexec() {
    if !have("mpiexec") {
        eprintln!("SKIP: mpiexec not on PATH");
        return;
    }
    let ranks = 3;
    let output = mpiexec(ranks, &[SIMPLE_MPI], &[("MPI_DEMO_TICK_MS", "10")]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let count = |text: &str| lines.iter().filter(|l| **l == text).count();

    // Lines from different ranks reach mpiexec in no fixed order; only
    // per-line counts are checked here. Ordering is covered by the unit tests.
    assert_eq!(count("process 0 sleeping for 3s..."), 1);
    for tick in ["0 s...", "1 s...", "2 s..."] {
        assert_eq!(count(tick), 1, "{stdout}");
    }
    assert_eq!(count("in level 1"), ranks as usize);
    assert_eq!(count("in level 2"), ranks as usize);
    for rank in 0..ranks {
        let summary = format!("internal process: {rank} of {ranks}");
        let var = format!("var = {}", 10 * rank);
        assert_eq!(count(summary.as_str()), 1, "{stdout}");
        assert_eq!(count(var.as_str()), 1, "{stdout}");
    }

    println!("PASS: simple-mpi on {ranks} ranks");
}

#[test]
#[ignore = "needs mpiexec"]
fn bad_tick_setting_still_exits_zero() {
    if !have("mpiexec") {
        eprintln!("SKIP: mpiexec not on PATH");
        return;
    }
    let output = mpiexec(1, &[SIMPLE_MPI], &[("MPI_DEMO_TICK_MS", "fast")]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("internal process: 0 of 1"), "{stdout}");
}
