//! Host facts: `pmset`, `sysctl`/`system_profiler`, `uptime`, `top`, `vm_stat`.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::snapshot::{BatteryInfo, MemoryBreakdown, MemoryPages, UNKNOWN};

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+):(\d+)").unwrap());
static APPLE_CHIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Apple (M\d+(?:\s+\w+)?)").unwrap());
static UPTIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"up\s+(.*?),\s+\d+\s+user").unwrap());
static CPU_IDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)% idle").unwrap());
static CPU_USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)% user").unwrap());
static PAGE_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"page size of (\d+) bytes").unwrap());

const DEFAULT_PAGE_SIZE: u64 = 4096;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// `pmset -g batt`:
///
/// ```text
/// Now drawing from 'AC Power'
///  -InternalBattery-0 (id=4653155)	87%; charging; 0:42 remaining present: true
/// ```
pub fn parse_battery(output: &str) -> BatteryInfo {
    let percentage = PERCENT_RE
        .captures(output)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    let time_remaining = CLOCK_RE
        .captures(output)
        .and_then(|c| {
            let hours: u32 = c[1].parse().ok()?;
            let mins: u32 = c[2].parse().ok()?;
            hours.checked_mul(60)?.checked_add(mins)
        })
        .unwrap_or(0);

    BatteryInfo {
        percentage,
        charging: output.contains("AC Power"),
        time_remaining,
    }
}

/// Short chip name: "M1 Pro" for Apple Silicon, the brand string for Intel.
pub fn parse_chip(output: &str) -> String {
    if output.contains("Apple M") {
        APPLE_CHIP_RE
            .captures(output)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| "Apple Silicon".into())
    } else if output.contains("Intel") {
        output.trim().lines().next().unwrap_or("").trim().to_string()
    } else {
        output.trim().to_string()
    }
}

/// Human-readable uptime from `uptime`, e.g. "3 days, 4:12".
pub fn parse_uptime(output: &str) -> String {
    UPTIME_RE
        .captures(output)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN.into())
}

/// CPU busy percentage from the `CPU usage:` line of `top -l 1 -n 0`.
///
/// Prefers `100 - idle`; falls back to the user share alone.
pub fn parse_cpu_usage(output: &str) -> Option<f64> {
    let line = output.lines().find(|l| l.contains("CPU usage"))?;
    if let Some(idle) = CPU_IDLE_RE
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
    {
        return Some((100.0 - idle).clamp(0.0, 100.0));
    }
    CPU_USER_RE
        .captures(line)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|u| u.clamp(0.0, 100.0))
}

fn vm_stat_pages(output: &str, label: &str) -> u64 {
    output
        .lines()
        .find(|l| l.trim_start().starts_with(label))
        .and_then(|l| {
            l.split(':')
                .nth(1)
                .and_then(|v| v.trim().trim_end_matches('.').parse().ok())
        })
        .unwrap_or(0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Memory usage from `vm_stat` page counts.
///
/// Used pages are active + wired + compressed; the total is those plus free
/// and inactive pages.
pub fn parse_vm_stat(output: &str) -> MemoryBreakdown {
    let page_size = PAGE_SIZE_RE
        .captures(output)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let details = MemoryPages {
        free: vm_stat_pages(output, "Pages free:"),
        active: vm_stat_pages(output, "Pages active:"),
        inactive: vm_stat_pages(output, "Pages inactive:"),
        wired: vm_stat_pages(output, "Pages wired down:"),
        compressed: vm_stat_pages(output, "Pages occupied by compressor:"),
    };

    let total_pages =
        details.free + details.active + details.inactive + details.wired + details.compressed;
    let used_pages = details.active + details.wired + details.compressed;

    let percentage = if total_pages > 0 {
        used_pages as f64 / total_pages as f64 * 100.0
    } else {
        0.0
    };

    MemoryBreakdown {
        percentage,
        used: round2(used_pages as f64 * page_size as f64 / BYTES_PER_GB),
        total: round2(total_pages as f64 * page_size as f64 / BYTES_PER_GB),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_on_ac_power() {
        let text = "Now drawing from 'AC Power'\n -InternalBattery-0 (id=4653155)\t87%; charging; 0:42 remaining present: true\n";
        let battery = parse_battery(text);
        assert_eq!(battery.percentage, 87);
        assert!(battery.charging);
        assert_eq!(battery.time_remaining, 42);
    }

    #[test]
    fn battery_discharging_hours() {
        let text = "Now drawing from 'Battery Power'\n -InternalBattery-0 (id=4653155)\t54%; discharging; 3:05 remaining present: true\n";
        let battery = parse_battery(text);
        assert_eq!(battery.percentage, 54);
        assert!(!battery.charging);
        assert_eq!(battery.time_remaining, 185);
    }

    #[test]
    fn battery_without_estimate() {
        let battery = parse_battery("Now drawing from 'AC Power'\n");
        assert_eq!(battery, BatteryInfo { percentage: 0, charging: true, time_remaining: 0 });
    }

    #[test]
    fn battery_estimate_out_of_range() {
        let text = " -InternalBattery-0 (id=1)\t40%; discharging; 99999999:59 remaining\n";
        let battery = parse_battery(text);
        assert_eq!(battery.percentage, 40);
        assert_eq!(battery.time_remaining, 0);
    }

    #[test]
    fn chip_names() {
        assert_eq!(parse_chip("Apple M1 Pro\n"), "M1 Pro");
        assert_eq!(parse_chip("Apple M2\n"), "M2");
        assert_eq!(parse_chip("      Chip: Apple M3 Max\n"), "M3 Max");
        assert_eq!(
            parse_chip("Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz\n"),
            "Intel(R) Core(TM) i7-9750H CPU @ 2.60GHz"
        );
        assert_eq!(parse_chip("  VirtualApple  \n"), "VirtualApple");
    }

    #[test]
    fn uptime_strings() {
        assert_eq!(
            parse_uptime("10:42  up 3 days,  4:12, 2 users, load averages: 1.92 2.01 2.10\n"),
            "3 days,  4:12"
        );
        assert_eq!(
            parse_uptime("9:01  up 17 mins, 1 user, load averages: 0.5 0.6 0.7\n"),
            "17 mins"
        );
        assert_eq!(parse_uptime("garbage"), "Unknown");
    }

    #[test]
    fn cpu_from_idle() {
        let text = "Processes: 512 total\nCPU usage: 5.26% user, 3.50% sys, 91.24% idle\n";
        let cpu = parse_cpu_usage(text).unwrap();
        assert!((cpu - 8.76).abs() < 0.001);
    }

    #[test]
    fn cpu_from_user_only() {
        assert_eq!(parse_cpu_usage("CPU usage: 12.5% user\n"), Some(12.5));
        assert_eq!(parse_cpu_usage("no cpu line"), None);
    }

    const VM_STAT: &str = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                               10000.
Pages active:                            200000.
Pages inactive:                          190000.
Pages speculative:                         5000.
Pages throttled:                              0.
Pages wired down:                        100000.
Pages purgeable:                           3000.
\"Translation faults\":                 123456789.
Pages copy-on-write:                    1234567.
Pages occupied by compressor:             50000.
";

    #[test]
    fn vm_stat_breakdown() {
        let mem = parse_vm_stat(VM_STAT);
        assert_eq!(mem.details.free, 10000);
        assert_eq!(mem.details.active, 200000);
        assert_eq!(mem.details.inactive, 190000);
        assert_eq!(mem.details.wired, 100000);
        assert_eq!(mem.details.compressed, 50000);

        // 350000 used of 550000 pages
        assert!((mem.percentage - 63.636).abs() < 0.01);
        // 550000 * 16384 bytes = 8.39 GB
        assert_eq!(mem.total, 8.39);
        assert_eq!(mem.used, 5.34);
    }

    #[test]
    fn vm_stat_defaults_to_zero() {
        let mem = parse_vm_stat("");
        assert_eq!(mem, MemoryBreakdown::default());
    }
}
