//! Check the S.M.A.R.T. health of a SAS disk

use structopt::StructOpt;

use sas_smart_plugins::smartctl::{self, ErrorCounterLog, SmartCtlError, Verdict};
use sas_smart_plugins::Status;

/// Check the S.M.A.R.T. health of a SAS disk.
///
/// Scans the `smartctl -x` report for the temperature, cycle counts, SAS phy
/// error counters and the error counter log, and alerts on the thresholds
/// that indicate real data risk.
#[derive(StructOpt, Debug)]
#[structopt(
    name = "check-sas-smart (part of sas-smart-plugins)",
    setting = structopt::clap::AppSettings::ColoredHelp
)]
struct Args {
    #[structopt(help = "The disk to check, e.g. /dev/sda")]
    disk: String,
    #[structopt(
        short = "c",
        long = "check",
        help = "Only check whether the disk speaks SAS"
    )]
    check: bool,
    #[structopt(
        short = "d",
        long = "input-file",
        help = "Read smartctl output from this file instead of running smartctl"
    )]
    input_file: Option<String>,
    #[structopt(
        short = "v",
        long = "verbose",
        help = "Echo the smartctl report before checking it"
    )]
    verbose: bool,
    #[structopt(
        long = "raid-selector",
        help = "smartctl '-d' device selector for disks behind a RAID controller, \
                e.g. 'megaraid,4'"
    )]
    raid_selector: Option<String>,
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::from_args();
    let lines = load_input(&args).unwrap_or_else(|e| die_unknown(&args.disk, &e));
    if args.verbose {
        println!("Output from smartctl:");
        for line in &lines {
            println!("{}", line);
        }
    }
    if args.check {
        transport_status(&lines).exit();
    }
    let verdict = check_disk(&lines).unwrap_or_else(|e| die_unknown(&args.disk, &e));
    println!(
        "{}",
        status_line(verdict.status(), &args.disk, &verdict.perf_data())
    );
    println!("{}", verdict.details());
    verdict.status().exit();
}

fn load_input(args: &Args) -> Result<Vec<String>, SmartCtlError> {
    match &args.input_file {
        Some(path) => smartctl::load_dump(path),
        None => smartctl::run_smartctl(&args.disk, args.raid_selector.as_deref()),
    }
}

/// Report whether the disk speaks SAS at all, skipping all metric logic
fn transport_status(lines: &[String]) -> Status {
    match smartctl::transport_line(lines) {
        Some(line) => {
            println!("{}", line);
            if line.contains("SAS") {
                Status::Ok
            } else {
                Status::Warning
            }
        }
        None => Status::Warning,
    }
}

fn check_disk(lines: &[String]) -> Result<Verdict, SmartCtlError> {
    let fields = smartctl::scan_fields(lines)?;
    let log = ErrorCounterLog::scan(lines)?;
    Ok(smartctl::evaluate(&fields, log.as_ref()))
}

fn status_line(status: Status, disk: &str, perf_data: &str) -> String {
    format!("{} disk {} | {}", status, disk, perf_data)
}

/// A plugin that escapes with an unhandled failure is a broken plugin from
/// the supervisor's perspective, so every error path funnels through here
/// and becomes UNKNOWN.
fn die_unknown(disk: &str, err: &SmartCtlError) -> ! {
    println!("UNKNOWN disk {}: {}", disk, err);
    Status::Unknown.exit()
}
