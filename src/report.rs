//! Resting place for the report formatting helpers -- the `"; "`-separated table the sweep streams
//! to stdout.\
//! Rows are built in two halves so the scenario parameters can be printed (and flushed) before the
//! measurements start, turning the report itself into a progress indicator.

use crate::types::{LockVariant, TestParameters, TimingMillis};


/// separator closing every report field -- trailing one included, easing `split()`-based consumers
pub const FIELD_SEPARATOR: &str = "; ";

/// The quoted column-names row: the three scenario parameters, then one `Time` column per variant,
/// then one `Rel` column per variant -- in the same order measurements & slowdowns are produced
pub fn header_line(variants: &[LockVariant]) -> String {
    let mut line = String::new();
    for name in ["Threads", "Iterations", "Non-contended Work"] {
        line.push_str(&format!("\"{name}\"{FIELD_SEPARATOR}"));
    }
    for variant in variants {
        line.push_str(&format!("\"Time {variant}\"{FIELD_SEPARATOR}"));
    }
    for variant in variants {
        line.push_str(&format!("\"Rel {variant}\"{FIELD_SEPARATOR}"));
    }
    line
}

/// The scenario-parameters half of a row -- printable before any measurement starts
pub fn scenario_prefix(params: &TestParameters) -> String {
    format!("{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}",
            params.thread_count, params.iteration_count, params.non_contended_work)
}

/// The measurements half of a row: every timing (integer milliseconds), then every relative
/// slowdown (2 decimal places), in the header's variant order
pub fn timings_suffix(timings: &[TimingMillis], relative_slowdowns: &[f64]) -> String {
    let mut suffix = String::new();
    for timing in timings {
        suffix.push_str(&format!("{timing}{FIELD_SEPARATOR}"));
    }
    for slowdown in relative_slowdowns {
        suffix.push_str(&format!("{slowdown:.2}{FIELD_SEPARATOR}"));
    }
    suffix
}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [report](super) module

    use super::*;
    use crate::spin_lock::SpinPolicy;

    /// the header names every column, quoted, in scenario-then-timings-then-slowdowns order
    #[cfg_attr(not(doc), test)]
    fn header_names_every_column_in_order() {
        let variants = [LockVariant::Spin(SpinPolicy::NoOp), LockVariant::StdMutex];
        assert_eq!(header_line(&variants),
                   "\"Threads\"; \"Iterations\"; \"Non-contended Work\"; \
                    \"Time NoOp\"; \"Time std::sync::Mutex\"; \
                    \"Rel NoOp\"; \"Rel std::sync::Mutex\"; ",
                   "unexpected header row");
    }

    /// rows are the prefix (scenario parameters) plus the suffix (timings & slowdowns),
    /// every field closed by the separator
    #[cfg_attr(not(doc), test)]
    fn rows_join_prefix_and_suffix() {
        let params = TestParameters { thread_count: 4, iteration_count: 250, non_contended_work: 20 };
        let prefix = scenario_prefix(&params);
        assert_eq!(prefix, "4; 250; 20; ", "unexpected scenario prefix");
        let suffix = timings_suffix(&[12, 3], &[4.0, 1.0]);
        assert_eq!(suffix, "12; 3; 4.00; 1.00; ", "unexpected timings suffix");
        assert_eq!(format!("{prefix}{suffix}"), "4; 250; 20; 12; 3; 4.00; 1.00; ", "prefix & suffix must concatenate into a full row");
    }
}
