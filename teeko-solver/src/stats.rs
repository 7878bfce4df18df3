//! Solver statistics tracking.

use std::time::Instant;

use log::info;
use teeko_core::Value;

/// Get current process memory usage in bytes (RSS - Resident Set Size).
/// Returns None if unable to determine.
#[cfg(target_os = "macos")]
pub fn get_memory_usage() -> Option<u64> {
    use std::mem::MaybeUninit;

    // macOS: use mach APIs
    extern "C" {
        fn mach_task_self() -> u32;
        fn task_info(
            target_task: u32,
            flavor: i32,
            task_info_out: *mut libc::c_void,
            task_info_outCnt: *mut u32,
        ) -> i32;
    }

    #[repr(C)]
    struct TaskBasicInfo {
        suspend_count: i32,
        virtual_size: u64,
        resident_size: u64,
        user_time: (i32, i32),
        system_time: (i32, i32),
        policy: i32,
    }

    const TASK_BASIC_INFO_64: i32 = 5;
    const TASK_BASIC_INFO_64_COUNT: u32 = 10;

    unsafe {
        let mut info = MaybeUninit::<TaskBasicInfo>::uninit();
        let mut count = TASK_BASIC_INFO_64_COUNT;

        let result = task_info(
            mach_task_self(),
            TASK_BASIC_INFO_64,
            info.as_mut_ptr() as *mut libc::c_void,
            &mut count,
        );

        if result == 0 {
            Some(info.assume_init().resident_size)
        } else {
            None
        }
    }
}

#[cfg(target_os = "linux")]
pub fn get_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn get_memory_usage() -> Option<u64> {
    None
}

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// `HH:MM:SS` for a number of seconds.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Statistics collected during solving.
#[derive(Debug, Default)]
pub struct SolverStats {
    /// Back-propagation passes completed
    pub passes: u32,

    /// Keys re-evaluated across all passes
    pub keys_evaluated: u64,

    /// Keys whose value changed in the current pass
    pub pass_changes: u64,

    /// Changes per completed pass
    pub changes_per_pass: Vec<u64>,

    /// Breakdown of the initialization pass
    pub wins: u64,
    pub losses: u64,
    pub illegal: u64,
    pub ties: u64,

    /// For rate calculation
    start_time: Option<Instant>,
    last_log_time: Option<Instant>,
    last_log_keys: u64,
}

impl SolverStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_log_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Record the initial classification of a key
    pub fn record_initial(&mut self, value: Value) {
        match value {
            Value::Win => self.wins += 1,
            Value::Lose => self.losses += 1,
            Value::Illegal => self.illegal += 1,
            _ => self.ties += 1,
        }
    }

    /// Close the current pass
    pub fn finish_pass(&mut self) {
        self.passes += 1;
        self.changes_per_pass.push(self.pass_changes);
        self.pass_changes = 0;
    }

    /// Get current keys evaluated per second
    pub fn keys_per_sec(&self) -> f64 {
        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                return self.keys_evaluated as f64 / elapsed;
            }
        }
        0.0
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.start_time.map(|s| s.elapsed().as_secs()).unwrap_or(0)
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        if let Some(last) = self.last_log_time {
            last.elapsed().as_secs() >= interval_secs
        } else {
            true
        }
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self, key: u64, key_count: u64) {
        let now = Instant::now();

        // Calculate rate since last log
        let rate = if let Some(last) = self.last_log_time {
            let elapsed = last.elapsed().as_secs_f64();
            let keys = self.keys_evaluated - self.last_log_keys;
            if elapsed > 0.0 {
                keys as f64 / elapsed
            } else {
                0.0
            }
        } else {
            self.keys_per_sec()
        };

        let done_pct = if key_count > 0 {
            100.0 * key as f64 / key_count as f64
        } else {
            100.0
        };

        let mem_str = get_memory_usage()
            .map(|m| format!(" mem={}", format_bytes(m)))
            .unwrap_or_default();

        info!(
            "[{}] pass={} key={}/{} ({:.1}%) changes={} rate={:.0}/s{}",
            format_clock(self.elapsed_secs()),
            self.passes + 1,
            key,
            key_count,
            done_pct,
            self.pass_changes,
            rate,
            mem_str,
        );

        self.last_log_time = Some(now);
        self.last_log_keys = self.keys_evaluated;
    }

    /// Log final summary
    pub fn log_summary(&self) {
        info!("Passes: {}", self.passes);
        info!("Keys evaluated: {}", self.keys_evaluated);
        info!("Initial classification:");
        info!("  - Wins: {}", self.wins);
        info!("  - Losses: {}", self.losses);
        info!("  - Illegal: {}", self.illegal);
        info!("  - Ties: {}", self.ties);
        if !self.changes_per_pass.is_empty() {
            info!("Changes per pass: {:?}", self.changes_per_pass);
        }
        info!("Average rate: {:.0} keys/sec", self.keys_per_sec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(190 * 1024 * 1024), "190.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_725), "01:02:05");
    }

    #[test]
    fn test_pass_bookkeeping() {
        let mut stats = SolverStats::new();
        stats.record_initial(Value::Win);
        stats.record_initial(Value::Tie);
        stats.record_initial(Value::Illegal);
        stats.pass_changes = 7;
        stats.finish_pass();
        stats.finish_pass();

        assert_eq!((stats.wins, stats.ties, stats.illegal, stats.losses), (1, 1, 1, 0));
        assert_eq!(stats.passes, 2);
        assert_eq!(stats.changes_per_pass, vec![7, 0]);
        assert_eq!(stats.pass_changes, 0);
    }
}
