use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::metrics::CpuTimes;
use crate::queries::PROCESS_BLOCK_SEPARATOR;

/// Scheduler state from the third field of `/proc/<pid>/stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// `R`
    Running,
    /// `S`
    Sleeping,
    /// `D`, uninterruptible
    DiskSleep,
    /// `Z`
    Zombie,
    /// `T`
    Stopped,
    /// `t`
    TracingStop,
    /// `X` or `x`
    Dead,
    /// `I`, idle kernel thread
    Idle,
    /// Anything else, kept verbatim
    Other(char),
}

impl ProcessState {
    /// Maps the single-letter state code
    #[must_use]
    pub const fn from_code(code: char) -> Self {
        match code {
            'R' => Self::Running,
            'S' => Self::Sleeping,
            'D' => Self::DiskSleep,
            'Z' => Self::Zombie,
            'T' => Self::Stopped,
            't' => Self::TracingStop,
            'X' | 'x' => Self::Dead,
            'I' => Self::Idle,
            other => Self::Other(other),
        }
    }

    /// The single-letter state code
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Running => 'R',
            Self::Sleeping => 'S',
            Self::DiskSleep => 'D',
            Self::Zombie => 'Z',
            Self::Stopped => 'T',
            Self::TracingStop => 't',
            Self::Dead => 'X',
            Self::Idle => 'I',
            Self::Other(c) => c,
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One process as read in a single poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProcessEntry {
    /// Process id
    pub pid: u32,
    /// utime + stime
    pub jiffies: u64,
    /// Kernel-truncated command name (`comm`)
    pub name: String,
    /// Resident set size in pages
    pub rss_pages: u64,
    /// Owning UID, 0 when the listing had no entry
    pub uid: u32,
    /// First argument of the command line, `name` when `ps` had no entry
    pub cmdline: String,
    /// Scheduler state
    pub state: ProcessState,
}

/// Every process from one poll plus the aggregate jiffies needed to turn
/// tick deltas into percentages
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    /// Processes keyed by PID
    pub processes: BTreeMap<u32, RawProcessEntry>,
    /// Sum of every field of the aggregate `cpu` line
    pub total_jiffies: u64,
    /// Idle field of the aggregate `cpu` line
    pub idle_jiffies: u64,
}

impl ProcessSnapshot {
    /// Number of processes
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether no process was parsed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

/// Parses the fields of one `/proc/<pid>/stat` line that the table needs.
///
/// Returns `(pid, name, state, utime + stime, rss_pages)`, or `None` for a
/// line that is truncated or not a stat line. The name is bounded by the
/// first `(` and the last `)` since `comm` may itself contain either.
#[must_use]
pub fn parse_pid_stat(line: &str) -> Option<(u32, String, ProcessState, u64, u64)> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let pid: u32 = line[..open].trim().parse().ok()?;
    let name = line[open + 1..close].to_string();

    let fields: Vec<&str> = line[close + 1..].split_whitespace().collect();
    if fields.len() < 22 {
        return None;
    }
    let state = ProcessState::from_code(fields[0].chars().next()?);
    let utime: u64 = fields[11].parse().ok()?;
    let stime: u64 = fields[12].parse().ok()?;
    let rss_pages = fields[21].parse::<i64>().ok()?.max(0) as u64;

    Some((pid, name, state, utime.saturating_add(stime), rss_pages))
}

/// Parses `ls -ldn /proc/[0-9]*` into PID → UID
///
/// The UID is the third column; the PID is the last path component of the
/// final column.
#[must_use]
pub fn parse_owner_listing(text: &str) -> HashMap<u32, u32> {
    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            let uid: u32 = parts[2].parse().ok()?;
            let path = parts.last()?;
            let pid: u32 = path.rsplit('/').next()?.parse().ok()?;
            Some((pid, uid))
        })
        .collect()
}

/// Parses `ps -A -o PID,ARGS` into PID → first argument
#[must_use]
pub fn parse_args_listing(text: &str) -> HashMap<u32, String> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid: u32 = parts.next()?.parse().ok()?;
            let arg0 = parts.next()?;
            Some((pid, arg0.to_string()))
        })
        .collect()
}

/// Builds a snapshot from the output of the process stat command and the
/// concurrent `ps` listing.
///
/// The stat output is split on `---` lines into the `/proc/stat` block, the
/// per-process stat block and the ownership listing. Lines that do not parse
/// are skipped; a PID missing from the listing or from `ps` still yields an
/// entry with UID 0 and `cmdline` set to its name.
#[must_use]
pub fn parse_snapshot(stat_output: &str, args_output: &str) -> ProcessSnapshot {
    let mut blocks: [String; 3] = Default::default();
    let mut index = 0;
    for line in stat_output.lines() {
        if line.trim() == PROCESS_BLOCK_SEPARATOR {
            index = (index + 1).min(2);
            continue;
        }
        blocks[index].push_str(line);
        blocks[index].push('\n');
    }
    let [system_block, pid_block, owner_block] = blocks;

    let aggregate = system_block
        .lines()
        .find_map(|l| l.strip_prefix("cpu "))
        .map(|rest| {
            let fields: Vec<u64> = rest
                .split_whitespace()
                .map(|p| p.parse().unwrap_or(0))
                .collect();
            CpuTimes::from_fields(&fields)
        })
        .unwrap_or_default();

    let owners = parse_owner_listing(&owner_block);
    let mut args = parse_args_listing(args_output);

    let processes = pid_block
        .lines()
        .filter_map(parse_pid_stat)
        .map(|(pid, name, state, jiffies, rss_pages)| {
            let cmdline = args.remove(&pid).unwrap_or_else(|| name.clone());
            let entry = RawProcessEntry {
                pid,
                jiffies,
                uid: owners.get(&pid).copied().unwrap_or(0),
                cmdline,
                name,
                rss_pages,
                state,
            };
            (pid, entry)
        })
        .collect();

    ProcessSnapshot {
        processes,
        total_jiffies: aggregate.total(),
        idle_jiffies: aggregate.idle,
    }
}
