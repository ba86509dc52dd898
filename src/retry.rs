//! Retry policy for the request executor.
//!
//! Each attempt's outcome is classified into a [`Disposition`] so the
//! policy stays testable on its own: 2xx succeeds, a configurable set of
//! transient statuses retries after a fixed wait, everything else fails
//! immediately. Transport failures are handled by the executor under the
//! same retry budget.

use reqwest::StatusCode;

/// Total attempts per logical request, first try included.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Fixed wait between attempts, in seconds.
pub const DEFAULT_WAIT_SECS: u64 = 10;

/// Status codes retried by default. 425 is the server's "too early"
/// response while it settles; the rest are the usual gateway hiccups.
pub const DEFAULT_TRANSIENT_STATUSES: [u16; 4] = [425, 502, 503, 504];

/// What to do with one attempt's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// 2xx; hand the response to the caller.
    Success,
    /// Worth another attempt if the budget allows.
    Transient,
    /// Fail now; retrying cannot help.
    Fatal,
}

pub(crate) fn classify(status: StatusCode, transient: &[u16]) -> Disposition {
    if status.is_success() {
        Disposition::Success
    } else if transient.contains(&status.as_u16()) {
        Disposition::Transient
    } else {
        Disposition::Fatal
    }
}
