use std::time::Instant;

use tracing_log_record::{args, level, Arg, CapturedError, LevelTable, Record};

fn main() {
    let levels = LevelTable::from_env();
    let failure = Arg::from(
        CapturedError::new("Error", "connection reset").with_stack("Error: connection reset\n    at poll (src/net.rs:17)"),
    );

    let n: u64 = 100_000;
    let start = Instant::now();

    let mut bytes = 0usize;
    for i in 0..n {
        let mut record = Record::now(
            "load",
            level::ERROR,
            "iteration %d of %d failed: %s",
            args![i, n, failure.clone()],
        );
        bytes += record.message().len();
        // second access hits the cached text
        bytes += record.message().len();
        bytes += record.level_name(&levels).map_or(0, str::len);
    }

    let elapsed = start.elapsed();
    println!(
        "formatted {} records ({} bytes) in {:?} (~{:.0} rec/s)",
        n,
        bytes,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
