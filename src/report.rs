use chrono::Local;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::sieve::PrimeReport;

pub const SUMMARY_FILE: &str = "primes.txt";
pub const ALL_PRIMES_FILE: &str = "all_primes.txt";
pub const EXECUTION_LOG_FILE: &str = "execution_log.txt";

/// Resolve the output directory: explicit path, then `$XDG_DATA_HOME/segsieve`,
/// then `$HOME/.local/share/segsieve`.
pub fn data_dir(output: Option<&Path>) -> Result<PathBuf, ReportError> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }

    let xdg_data_home = env::var("XDG_DATA_HOME")
        .ok()
        .and_then(|path| {
            if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            }
        })
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share"))
        })
        .ok_or(ReportError::NoDataDir)?;

    Ok(xdg_data_home.join("segsieve"))
}

/// Write the two-line result artifact:
/// `<elapsed_secs> <count> <sum>` followed by the top `k` primes, space separated.
pub fn write_summary<W: Write>(
    writer: &mut W,
    report: &PrimeReport,
    k: usize,
) -> Result<(), ReportError> {
    let mut itoa_buf = itoa::Buffer::new();

    write!(writer, "{:.6} ", report.elapsed_secs())?;
    writer.write_all(itoa_buf.format(report.count()).as_bytes())?;
    writer.write_all(b" ")?;
    writer.write_all(itoa_buf.format(report.sum()).as_bytes())?;
    writer.write_all(b"\n")?;

    for &prime in report.top_k(k) {
        writer.write_all(itoa_buf.format(prime).as_bytes())?;
        writer.write_all(b" ")?;
    }
    writer.write_all(b"\n")?;

    Ok(())
}

pub fn save_summary(dir: &Path, report: &PrimeReport, k: usize) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir)?;

    let path = dir.join(SUMMARY_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    write_summary(&mut writer, report, k)?;
    writer.flush()?;

    Ok(path)
}

/// Save every prime, one per line.
pub fn save_all_primes(dir: &Path, primes: &[u64]) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir)?;

    let path = dir.join(ALL_PRIMES_FILE);
    let mut writer = BufWriter::with_capacity(256 * 1024, File::create(&path)?); // 256KB

    let mut itoa_buf = itoa::Buffer::new();
    for &prime in primes {
        writer.write_all(itoa_buf.format(prime).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(path)
}

pub fn log_execution(dir: &Path, subcommand: &str, report: &PrimeReport) -> Result<(), ReportError> {
    fs::create_dir_all(dir)?;

    let log_path = dir.join(EXECUTION_LOG_FILE);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    writeln!(
        file,
        "{} | {} | {}..={} | w{} | {}us",
        timestamp,
        subcommand,
        report.range.start(),
        report.range.end(),
        report.requested_workers,
        report.elapsed.as_micros()
    )?;

    Ok(())
}

/// Print the run summary to stdout, optionally followed by every prime.
pub fn print_summary(report: &PrimeReport, k: usize, list: bool) {
    println!(
        "Primes in range [{}, {}] found using {} threads ({} active):",
        report.range.start(),
        report.range.end(),
        report.requested_workers,
        report.active_workers
    );
    println!("Execution time: {:.6}s", report.elapsed_secs());
    println!("Total: {} primes found", report.count());
    println!("Sum: {}", report.sum());

    let top = report.top_k(k);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut written = write!(out, "Largest {}: ", top.len())
        .and_then(|_| write_prime_line(&mut out, top));
    if list {
        written = written.and_then(|_| write_prime_line(&mut out, report.primes()));
    }
    if let Err(e) = written.and_then(|_| out.flush()) {
        log::warn!("failed to print primes: {}", e);
    }
}

/// Write primes separated by single spaces, then a newline.
fn write_prime_line<W: Write>(out: &mut W, primes: &[u64]) -> io::Result<()> {
    let mut itoa_buf = itoa::Buffer::new();
    for (i, &prime) in primes.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        out.write_all(itoa_buf.format(prime).as_bytes())?;
    }
    out.write_all(b"\n")
}

/// Persist a finished run. Failures are logged as warnings; the in-memory
/// report stays valid either way.
pub fn persist(report: &PrimeReport, output: Option<&Path>, k: usize, save_all: bool) {
    let dir = match data_dir(output) {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("results not saved: {}", e);
            return;
        }
    };

    match save_summary(&dir, report, k) {
        Ok(path) => log::info!("saved summary to {}", path.display()),
        Err(e) => log::warn!("failed to save {}: {}", SUMMARY_FILE, e),
    }

    if save_all {
        match save_all_primes(&dir, report.primes()) {
            Ok(path) => log::info!("saved {} primes to {}", report.count(), path.display()),
            Err(e) => log::warn!("failed to save {}: {}", ALL_PRIMES_FILE, e),
        }
    }

    if let Err(e) = log_execution(&dir, "primes", report) {
        log::warn!("failed to log execution: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Range;
    use crate::sieve::{DEFAULT_TOP_K, find_primes};

    fn report(start: u64, end: u64, workers: usize) -> PrimeReport {
        find_primes(Range::new(start, end).unwrap(), workers).unwrap()
    }

    #[test]
    fn test_summary_layout() {
        let report = report(1, 100, 4);
        let mut buf = Vec::new();
        write_summary(&mut buf, &report, DEFAULT_TOP_K).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Vec<&str> = lines[0].split(' ').collect();
        assert_eq!(first.len(), 3);
        assert!(first[0].parse::<f64>().unwrap() >= 0.0);
        assert_eq!(first[1], "25");
        assert_eq!(first[2], "1060");

        assert_eq!(lines[1], "53 59 61 67 71 73 79 83 89 97 ");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_summary_layout_without_primes() {
        let report = report(1, 1, 1);
        let mut buf = Vec::new();
        write_summary(&mut buf, &report, DEFAULT_TOP_K).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert!(lines[0].ends_with(" 0 0"));
        assert_eq!(lines[1], "");
    }

    #[test]
    fn test_save_summary_and_all_primes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let report = report(1, 30, 3);

        let summary = save_summary(&out, &report, 3).unwrap();
        let content = fs::read_to_string(summary).unwrap();
        assert_eq!(content.lines().nth(1), Some("19 23 29 "));

        let all = save_all_primes(&out, report.primes()).unwrap();
        let saved: Vec<u64> = fs::read_to_string(all)
            .unwrap()
            .lines()
            .map(|l| l.parse().unwrap())
            .collect();
        assert_eq!(saved, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn test_log_execution_appends() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(1, 100, 4);

        log_execution(dir.path(), "primes", &report).unwrap();
        log_execution(dir.path(), "primes", &report).unwrap();

        let content = fs::read_to_string(dir.path().join(EXECUTION_LOG_FILE)).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().all(|l| l.contains("| primes | 1..=100 | w4 |")));
    }

    #[test]
    fn test_explicit_output_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(data_dir(Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    fn test_save_summary_into_file_path_fails() {
        // A regular file where the directory should be
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let report = report(1, 10, 1);
        assert!(matches!(
            save_summary(&blocker, &report, 10),
            Err(ReportError::Io(_))
        ));
        // The computed result is unaffected
        assert_eq!(report.count(), 4);
    }

    #[test]
    fn test_prime_line_is_space_separated() {
        let mut buf = Vec::new();
        write_prime_line(&mut buf, &[89, 97, 101]).unwrap();
        assert_eq!(buf, b"89 97 101\n");

        let mut buf = Vec::new();
        write_prime_line(&mut buf, &[]).unwrap();
        assert_eq!(buf, b"\n");
    }

    #[test]
    fn test_persist_into_unwritable_output_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let report = report(1, 100, 4);
        persist(&report, Some(&blocker), DEFAULT_TOP_K, true);

        // Nothing was written and the blocking file is untouched
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
        assert_eq!(report.count(), 25);
        assert_eq!(report.sum(), 1060);
        assert_eq!(report.top_k(1), &[97]);
    }

    #[test]
    fn test_persist_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(1, 100, 4);

        persist(&report, Some(dir.path()), DEFAULT_TOP_K, true);

        assert!(dir.path().join(SUMMARY_FILE).is_file());
        assert!(dir.path().join(ALL_PRIMES_FILE).is_file());
        assert!(dir.path().join(EXECUTION_LOG_FILE).is_file());
    }
}
