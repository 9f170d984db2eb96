//! Monitoring plugins for the S.M.A.R.T. health of SAS disks
//!
//! The interesting bits live in the [`smartctl`](smartctl/index.html) module:
//! given the text that `smartctl -x` prints for a SAS (or SAS-behind-RAID)
//! disk, it extracts a fixed catalog of health metrics and classifies each
//! one against warning/critical thresholds.
//!
//! The `check-sas-smart` binary wires that up into a Nagios/Icinga-style
//! check: one invocation reads one disk's report, prints a status line with
//! perfdata plus a detail block, and exits with the matching plugin code.
//! See the [`scripts`](scripts/index.html) module for its usage.

use std::fmt;
use std::process;

pub mod scripts;
pub mod smartctl;

/// The exit statuses understood by Nagios-style monitoring supervisors
///
/// The variants are ordered by badness so that `Ok < Warning < Critical`,
/// which makes "worst status wins" aggregation a comparison. `Unknown` sorts
/// above all of them but means "no verdict", not "worst": aggregation code
/// should treat it as the not-yet-started sentinel.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Exit the process with the code the monitoring supervisor expects
    pub fn exit(self) -> ! {
        process::exit(self.exit_code())
    }

    /// The plugin exit code for this status
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}
