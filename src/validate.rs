//! Syntax checks applied at the producer boundary.

use once_cell::sync::Lazy;
use regex::Regex;

/// Metric names are dot-separated components of word characters and hyphens,
/// with at least two components (`cpu.load`, not `cpu`).
static METRIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w-]+(\.[\w-]+)+$").expect("metric name pattern compiles"));

pub(crate) fn metric_name_is_valid(name: &str) -> bool {
    METRIC_NAME.is_match(name)
}

/// Notice text travels inside a single protocol line, so it may not contain
/// carriage returns or newlines anywhere.
pub(crate) fn notice_is_valid(message: &str) -> bool {
    !message.contains('\r') && !message.contains('\n')
}
