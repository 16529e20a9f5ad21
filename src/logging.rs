use env_logger::Builder;
use std::io::Write;

/// Logger printing every record as a `c` comment line, so log output can be
/// interleaved with PACE formatted output.
pub fn build_pace_logger() {
    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| writeln!(buf, "c {} - {}", record.level(), record.args()))
        .init();
}
