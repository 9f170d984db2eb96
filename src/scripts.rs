//! Documentation for the check scripts contained herein
//!
//! - [check-sas-smart](#check-sas-smart)
//!
//! # check-sas-smart
//!
//! Linux only, requires the smartmontools `smartctl` binary and sudo rights
//! to run it (or a pre-captured report via `--input-file`).
//!
//! ```plain
//! $ check-sas-smart --help
//! check-sas-smart (part of sas-smart-plugins) 0.1.0
//! Check the S.M.A.R.T. health of a SAS disk.
//!
//! Scans the `smartctl -x` report for the temperature, cycle counts, SAS phy error counters and the error counter log,
//! and alerts on the thresholds that indicate real data risk.
//!
//! USAGE:
//!     check-sas-smart [FLAGS] [OPTIONS] <disk>
//!
//! FLAGS:
//!     -c, --check      Only check whether the disk speaks SAS
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!     -v, --verbose    Echo the smartctl report before checking it
//!
//! OPTIONS:
//!     -d, --input-file <input-file>        Read smartctl output from this file instead of running smartctl
//!         --raid-selector <raid-selector>  smartctl '-d' device selector for disks behind a RAID controller, e.g.
//!                                          'megaraid,4'
//!
//! ARGS:
//!     <disk>    The disk to check, e.g. /dev/sda
//! ```
//!
//! Example against a live disk behind a MegaRAID controller:
//!
//! ```plain
//! $ check-sas-smart /dev/sda --raid-selector megaraid,4
//! OK disk /dev/sda | 'Temperature'=31;44;46 'Power_On_Hours'=30362 'Start_Stop'=42c ...
//! OK: Temperature = 31
//! OK: Power_On_Hours = 30362
//! ...
//! ```
//!
//! And the transport-protocol check used to decide whether a disk should be
//! monitored by this plugin at all:
//!
//! ```plain
//! $ check-sas-smart -c /dev/sda; echo $?
//! Transport protocol:   SAS (SPL-3)
//! 0
//! ```
