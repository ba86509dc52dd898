//! Job state and result constants duplicated from the openQA server.
//!
//! These need to stay in sync with upstream (lib/OpenQA/Schema/Result/Jobs.pm),
//! but it is better to maintain them once here than to have every consumer
//! redefine "these are the running states" on the fly. For what each value
//! means, refer to the openQA source; the comments there explain them.

// States

pub const JOB_STATE_SCHEDULED: &str = "scheduled";
pub const JOB_STATE_ASSIGNED: &str = "assigned";
pub const JOB_STATE_SETUP: &str = "setup";
pub const JOB_STATE_RUNNING: &str = "running";
pub const JOB_STATE_UPLOADING: &str = "uploading";
pub const JOB_STATE_CANCELLED: &str = "cancelled";
pub const JOB_STATE_DONE: &str = "done";

pub const JOB_STATES: [&str; 7] = [
    JOB_STATE_SCHEDULED,
    JOB_STATE_SETUP,
    JOB_STATE_RUNNING,
    JOB_STATE_CANCELLED,
    JOB_STATE_DONE,
    JOB_STATE_UPLOADING,
    JOB_STATE_ASSIGNED,
];
pub const JOB_PENDING_STATES: [&str; 5] = [
    JOB_STATE_SCHEDULED,
    JOB_STATE_ASSIGNED,
    JOB_STATE_SETUP,
    JOB_STATE_RUNNING,
    JOB_STATE_UPLOADING,
];
pub const JOB_EXECUTION_STATES: [&str; 4] = [
    JOB_STATE_ASSIGNED,
    JOB_STATE_SETUP,
    JOB_STATE_RUNNING,
    JOB_STATE_UPLOADING,
];
pub const JOB_PRE_EXECUTION_STATES: [&str; 1] = [JOB_STATE_SCHEDULED];
pub const JOB_FINAL_STATES: [&str; 2] = [JOB_STATE_DONE, JOB_STATE_CANCELLED];

// These are referred to as 'meta' states upstream

pub const JOB_STATE_PRE_EXECUTION: &str = "pre_execution";
pub const JOB_STATE_EXECUTION: &str = "execution";
pub const JOB_STATE_FINAL: &str = "final";

// Results

pub const JOB_RESULT_NONE: &str = "none";
pub const JOB_RESULT_PASSED: &str = "passed";
pub const JOB_RESULT_SOFTFAILED: &str = "softfailed";
pub const JOB_RESULT_FAILED: &str = "failed";
pub const JOB_RESULT_INCOMPLETE: &str = "incomplete";
pub const JOB_RESULT_SKIPPED: &str = "skipped";
pub const JOB_RESULT_OBSOLETED: &str = "obsoleted";
pub const JOB_RESULT_PARALLEL_FAILED: &str = "parallel_failed";
pub const JOB_RESULT_PARALLEL_RESTARTED: &str = "parallel_restarted";
pub const JOB_RESULT_USER_CANCELLED: &str = "user_cancelled";
pub const JOB_RESULT_USER_RESTARTED: &str = "user_restarted";
pub const JOB_RESULT_TIMEOUT_EXCEEDED: &str = "timeout_exceeded";

pub const JOB_RESULTS: [&str; 12] = [
    JOB_RESULT_NONE,
    JOB_RESULT_PASSED,
    JOB_RESULT_SOFTFAILED,
    JOB_RESULT_FAILED,
    JOB_RESULT_INCOMPLETE,
    JOB_RESULT_SKIPPED,
    JOB_RESULT_OBSOLETED,
    JOB_RESULT_PARALLEL_FAILED,
    JOB_RESULT_PARALLEL_RESTARTED,
    JOB_RESULT_USER_CANCELLED,
    JOB_RESULT_USER_RESTARTED,
    JOB_RESULT_TIMEOUT_EXCEEDED,
];
pub const JOB_COMPLETE_RESULTS: [&str; 3] =
    [JOB_RESULT_PASSED, JOB_RESULT_SOFTFAILED, JOB_RESULT_FAILED];
pub const JOB_OK_RESULTS: [&str; 2] = [JOB_RESULT_PASSED, JOB_RESULT_SOFTFAILED];
pub const JOB_NOT_COMPLETE_RESULTS: [&str; 2] =
    [JOB_RESULT_INCOMPLETE, JOB_RESULT_TIMEOUT_EXCEEDED];
pub const JOB_ABORTED_RESULTS: [&str; 6] = [
    JOB_RESULT_SKIPPED,
    JOB_RESULT_OBSOLETED,
    JOB_RESULT_PARALLEL_FAILED,
    JOB_RESULT_PARALLEL_RESTARTED,
    JOB_RESULT_USER_CANCELLED,
    JOB_RESULT_USER_RESTARTED,
];
pub const JOB_NOT_OK_RESULTS: [&str; 9] = [
    JOB_RESULT_FAILED,
    JOB_RESULT_INCOMPLETE,
    JOB_RESULT_TIMEOUT_EXCEEDED,
    JOB_RESULT_SKIPPED,
    JOB_RESULT_OBSOLETED,
    JOB_RESULT_PARALLEL_FAILED,
    JOB_RESULT_PARALLEL_RESTARTED,
    JOB_RESULT_USER_CANCELLED,
    JOB_RESULT_USER_RESTARTED,
];

// 'meta' results

pub const JOB_RESULT_COMPLETE: &str = "complete";
pub const JOB_RESULT_NOT_COMPLETE: &str = "not_complete";
pub const JOB_RESULT_ABORTED: &str = "aborted";

// Scenarios

pub const JOB_SCENARIO_KEYS: [&str; 5] = ["DISTRI", "VERSION", "FLAVOR", "ARCH", "TEST"];
pub const JOB_SCENARIO_WITH_MACHINE_KEYS: [&str; 6] =
    ["DISTRI", "VERSION", "FLAVOR", "ARCH", "TEST", "MACHINE"];
