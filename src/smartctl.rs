//! Structs and impls for the output of `smartctl -x` on SAS disks
//!
//! smartctl has no machine-readable format for the SCSI/SAS log pages we
//! care about, so everything here works on the raw report text: a fixed
//! catalog of scalar attributes found by substring match, plus the
//! fixed-layout "Error counter log" table. Extraction and threshold
//! evaluation are separate passes so each can be tested on its own.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::num;
use std::process::Command;
use std::result::Result as StdResult;

use derive_more::From;
use regex::Regex;

use crate::Status;

/// smartctl errors
///
/// Every error from in this module can be converted into a `SmartCtlError`
#[derive(Debug, From)]
pub enum SmartCtlError {
    /// Errors originating in IO (reading a dump, spawning smartctl)
    Io(io::Error),
    /// The report ended before a section it claimed to contain
    InsufficientData(String),
    /// Happens when a counter or attribute does not parse as a number
    InvalidFloat(num::ParseFloatError),
    /// An attribute label matched but no value could be extracted
    MissingValue(MissingValue),
}

impl fmt::Display for SmartCtlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        use self::SmartCtlError::*;
        match self {
            &Io(ref e) => write!(f, "{}", e),
            &InsufficientData(ref e) => write!(f, "{}", e),
            &InvalidFloat(ref e) => write!(f, "{}", e),
            &MissingValue(ref e) => write!(f, "{}", e),
        }
    }
}

#[derive(Debug)]
pub struct MissingValue {
    pub field: &'static str,
    pub line: String,
}

impl fmt::Display for MissingValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        write!(
            f,
            "found the label for '{}' but no value in line '{}'",
            self.field, self.line
        )
    }
}

/// All the results are results with `SmartCtlError`s
pub type Result<T> = StdResult<T, SmartCtlError>;

// ////////////////////////////////////////////////////////////////////////////
// Loading a report

static SMARTCTL: &str = "/usr/sbin/smartctl";

/// Read a pre-captured smartctl report from a file
pub fn load_dump(path: &str) -> Result<Vec<String>> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    Ok(to_lines(&contents))
}

/// Run `smartctl -x` against a disk and capture its report
///
/// smartctl needs raw device access, so it is run through sudo. For disks
/// behind a RAID controller the selector is forwarded as `-d <selector>`.
/// smartctl sets bit-packed exit codes even on healthy disks, so only empty
/// output is treated as a failure to produce a report.
pub fn run_smartctl(disk: &str, raid_selector: Option<&str>) -> Result<Vec<String>> {
    let mut cmd = Command::new("sudo");
    cmd.arg(SMARTCTL).arg("-x").arg(disk);
    if let Some(selector) = raid_selector {
        cmd.arg("-d").arg(selector);
    }
    let output = cmd.output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Err(SmartCtlError::InsufficientData(format!(
            "smartctl produced no output for {}",
            disk
        )));
    }
    Ok(to_lines(&stdout))
}

fn to_lines(contents: &str) -> Vec<String> {
    contents.lines().map(str::to_string).collect()
}

// ////////////////////////////////////////////////////////////////////////////
// Scalar attributes

/// A warning/critical threshold pair
///
/// Boundaries are inclusive-below: a value equal to a threshold does not
/// trip it, only a strictly greater one does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warn: f64,
    pub crit: f64,
}

impl Thresholds {
    pub fn classify(&self, value: f64) -> Status {
        if value > self.crit {
            Status::Critical
        } else if value > self.warn {
            Status::Warning
        } else {
            Status::Ok
        }
    }
}

/// How to pull the value out of a line once its label matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRule {
    /// Split on ':', falling back to '=', and take what follows
    SeparatorSplit,
    /// Take the hours out of an "NNN:MM" hours:minutes token
    HoursMinutes,
}

/// One scalar attribute we look for in the report
#[derive(Debug)]
pub struct FieldSpec {
    /// Substring that identifies the line carrying this attribute
    pub pattern: &'static str,
    /// Name the metric is reported under
    pub name: &'static str,
    pub rule: ValueRule,
    /// Unit suffix for the perfdata token ("c" marks a counter)
    pub unit: &'static str,
    pub thresholds: Option<Thresholds>,
}

/// The catalog of scalar attributes
///
/// Only the temperature carries thresholds; the cycle and phy counters are
/// reported for trending. The power-on time needs its own rule because
/// smartctl prints it as an hours:minutes pair in free text.
pub static FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        pattern: "Current Drive Temperature",
        name: "Temperature",
        rule: ValueRule::SeparatorSplit,
        unit: "",
        thresholds: Some(Thresholds {
            warn: 44.0,
            crit: 46.0,
        }),
    },
    FieldSpec {
        pattern: "Accumulated start-stop cycles",
        name: "Start_Stop",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Accumulated load-unload cycles",
        name: "Load_Unload",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Non-medium error count",
        name: "Non_media_errors",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Accumulated power on time",
        name: "Power_On_Hours",
        rule: ValueRule::HoursMinutes,
        unit: "",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Invalid DWORD count",
        name: "InvalidDWORD",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Loss of DWORD synchronization",
        name: "DWORDSyncLoss",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
    FieldSpec {
        pattern: "Phy reset problem",
        name: "PhyResetProblems",
        rule: ValueRule::SeparatorSplit,
        unit: "c",
        thresholds: None,
    },
];

/// A scalar attribute found in the report
#[derive(Debug)]
pub struct FieldReading {
    pub spec: &'static FieldSpec,
    /// The value exactly as it appeared, for display
    pub raw: String,
    pub value: f64,
}

/// Scan the report for every cataloged scalar attribute
///
/// The first line matching a spec wins; later matches for the same spec are
/// ignored. A matched label whose value cannot be extracted is an error, not
/// a skip: it means the report format changed under us and a human should
/// look at it.
pub fn scan_fields(lines: &[String]) -> Result<Vec<FieldReading>> {
    let mut resolved = vec![false; FIELD_SPECS.len()];
    let mut readings = Vec::new();
    for line in lines {
        for (idx, spec) in FIELD_SPECS.iter().enumerate() {
            if resolved[idx] || !line.contains(spec.pattern) {
                continue;
            }
            let raw = extract_value(spec, line)?;
            let value = raw.parse::<f64>()?;
            readings.push(FieldReading { spec, raw, value });
            resolved[idx] = true;
        }
    }
    Ok(readings)
}

fn missing(spec: &FieldSpec, line: &str) -> SmartCtlError {
    MissingValue {
        field: spec.name,
        line: line.to_string(),
    }
    .into()
}

fn extract_value(spec: &'static FieldSpec, line: &str) -> Result<String> {
    match spec.rule {
        ValueRule::HoursMinutes => {
            let re = Regex::new(r"(\d+):\d+").unwrap();
            let caps = re.captures(line).ok_or_else(|| missing(spec, line))?;
            Ok(caps[1].to_string())
        }
        ValueRule::SeparatorSplit => {
            let tail = line
                .splitn(2, ':')
                .nth(1)
                .or_else(|| line.splitn(2, '=').nth(1))
                .ok_or_else(|| missing(spec, line))?;
            // Temperatures come with a " C" suffix, everything else is bare
            let value: String = tail
                .replace(" C", "")
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if value.is_empty() {
                return Err(missing(spec, line));
            }
            Ok(value)
        }
    }
}

// ////////////////////////////////////////////////////////////////////////////
// The error counter log

/// One column of an error counter log row
#[derive(Debug)]
pub struct SubCounter {
    /// Token position within the whitespace-split row
    pub position: usize,
    pub name: &'static str,
    pub thresholds: Option<Thresholds>,
    /// Some firmwares do not report this column at all
    pub optional: bool,
}

/// The columns of the error counter log worth reporting
///
/// Position 0 is the row label and position 5 the correction algorithm
/// invocation count, neither of which says anything about disk health.
/// Uncorrected errors are the only column with thresholds: a corrected
/// error is recovered data, an uncorrected one is not.
pub static SUB_COUNTERS: &[SubCounter] = &[
    SubCounter {
        position: 1,
        name: "CorrectedECCFast",
        thresholds: None,
        optional: false,
    },
    SubCounter {
        position: 2,
        name: "CorrectedECCSlow",
        thresholds: None,
        optional: false,
    },
    SubCounter {
        position: 3,
        name: "CorrectedRedo",
        thresholds: None,
        optional: false,
    },
    SubCounter {
        position: 4,
        name: "CorrectedTotal",
        thresholds: None,
        optional: false,
    },
    SubCounter {
        position: 6,
        name: "ProcessedTotal",
        thresholds: None,
        optional: true,
    },
    SubCounter {
        position: 7,
        name: "UncorrectedTotal",
        thresholds: Some(Thresholds {
            warn: 1.0,
            crit: 3.0,
        }),
        optional: false,
    },
];

/// One counter out of a read/write/verify row
#[derive(Debug)]
pub struct CounterReading {
    pub sub: &'static SubCounter,
    pub raw: String,
    pub value: f64,
}

/// A decoded row of the error counter log, named after its operation
#[derive(Debug)]
pub struct CounterRow {
    pub operation: &'static str,
    pub counters: Vec<CounterReading>,
}

impl CounterRow {
    fn from_line(operation: &'static str, line: &str) -> Result<CounterRow> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut counters = Vec::with_capacity(SUB_COUNTERS.len());
        for sub in SUB_COUNTERS {
            let token = match tokens.get(sub.position) {
                Some(token) => token,
                None if sub.optional => continue,
                None => {
                    return Err(SmartCtlError::InsufficientData(format!(
                        "{} row of the error counter log has no column {}: '{}'",
                        operation, sub.position, line
                    )))
                }
            };
            counters.push(CounterReading {
                sub,
                raw: token.to_string(),
                // counters can be fractional, e.g. gigabytes processed
                value: token.parse()?,
            });
        }
        Ok(CounterRow {
            operation,
            counters,
        })
    }
}

/// The "Error counter log" section of the report
///
/// Only SAS disks expose this log page, so its absence is normal and not an
/// error.
#[derive(Debug)]
pub struct ErrorCounterLog {
    pub rows: Vec<CounterRow>,
}

impl ErrorCounterLog {
    /// Find and decode the error counter log, if the device reports one
    ///
    /// The table layout is fixed: three heading lines under the header, then
    /// the read and write rows. The verify row only exists on disks that
    /// count verify operations, so it is probed rather than assumed.
    pub fn scan(lines: &[String]) -> Result<Option<ErrorCounterLog>> {
        let header = match lines
            .iter()
            .position(|line| line.starts_with("Error counter log"))
        {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let row_at = |offset: usize, operation: &'static str| -> Result<CounterRow> {
            let line = lines.get(header + offset).ok_or_else(|| {
                SmartCtlError::InsufficientData(format!(
                    "error counter log ends before its {} row",
                    operation
                ))
            })?;
            CounterRow::from_line(operation, line)
        };
        let mut rows = vec![row_at(4, "Read")?, row_at(5, "Write")?];
        if let Some(line) = lines.get(header + 6) {
            if line.starts_with("Verify") {
                rows.push(CounterRow::from_line("Verify", line)?);
            }
        }
        Ok(Some(ErrorCounterLog { rows }))
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Transport protocol

/// The "Transport protocol:" line of the report, if the device has one
pub fn transport_line(lines: &[String]) -> Option<&str> {
    lines
        .iter()
        .find(|line| line.starts_with("Transport protocol:"))
        .map(|line| line.as_str())
}

// ////////////////////////////////////////////////////////////////////////////
// Threshold evaluation

/// The aggregate result of classifying every extracted metric
#[derive(Debug)]
pub struct Verdict {
    status: Status,
    perf_tokens: Vec<String>,
    detail_lines: Vec<String>,
}

impl Verdict {
    fn new() -> Verdict {
        Verdict {
            status: Status::Unknown,
            perf_tokens: Vec::new(),
            detail_lines: Vec::new(),
        }
    }

    /// Classify one metric and fold it into the aggregate
    fn record(
        &mut self,
        name: &str,
        raw: &str,
        value: f64,
        unit: &str,
        thresholds: Option<Thresholds>,
    ) {
        let (status, annotation) = match thresholds {
            Some(t) => (t.classify(value), format!(";{};{}", t.warn, t.crit)),
            None => (Status::Ok, String::new()),
        };
        self.update(status);
        self.detail_lines
            .push(format!("{}: {} = {}", status, name, raw));
        self.perf_tokens
            .push(format!("'{}'={}{}{}", name, raw, unit, annotation));
    }

    /// Worst status wins; `Unknown` is "no verdict yet", so the first real
    /// status always replaces it.
    fn update(&mut self, new: Status) {
        if self.status == Status::Unknown || new > self.status {
            self.status = new;
        }
    }

    /// "Some data but no problems" is OK; no data at all stays UNKNOWN.
    fn finish(&mut self) {
        if !self.perf_tokens.is_empty() {
            self.update(Status::Ok);
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Space-joined `'name'=value[unit][;warn;crit]` perfdata tokens
    pub fn perf_data(&self) -> String {
        self.perf_tokens.join(" ")
    }

    /// One `SEVERITY: name = value` line per metric
    pub fn details(&self) -> String {
        self.detail_lines.join("\n")
    }
}

/// Apply the threshold rules to everything the extractor found
pub fn evaluate(fields: &[FieldReading], log: Option<&ErrorCounterLog>) -> Verdict {
    let mut verdict = Verdict::new();
    for reading in fields {
        verdict.record(
            reading.spec.name,
            &reading.raw,
            reading.value,
            reading.spec.unit,
            reading.spec.thresholds,
        );
    }
    if let Some(log) = log {
        for row in &log.rows {
            for counter in &row.counters {
                let name = format!("{}{}", row.operation, counter.sub.name);
                verdict.record(
                    &name,
                    &counter.raw,
                    counter.value,
                    "c",
                    counter.sub.thresholds,
                );
            }
        }
    }
    verdict.finish();
    verdict
}
