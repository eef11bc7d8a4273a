use procguard::cli::LogLevel;
use procguard::logging::{env_filter, init_logging};

#[test]
fn cli_level_sets_the_filter() {
    assert_eq!(env_filter(Some(LogLevel::Trace)).to_string().to_lowercase(), "trace");
    assert_eq!(env_filter(Some(LogLevel::Warn)).to_string().to_lowercase(), "warn");
}

// Only test in this binary that touches the global subscriber.
#[test]
fn subscriber_installs_once() {
    init_logging(Some(LogLevel::Error)).unwrap();
    assert!(init_logging(Some(LogLevel::Debug)).is_err());
}
