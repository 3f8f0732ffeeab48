//! Replay a recorded hook script through a trace session
//!
//! Scripts are JSON lines, one [`HookEvent`] per line. End events carry no
//! identifiers; the replayer pairs each with the most recent outstanding
//! begin of the same kind, the way the host runtime hands a begin
//! identifier back to the matching end hook. Blank lines and lines starting
//! with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use kerntrace_core::{ExecId, FenceId, HookEvent, Session, SessionConfig};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Hook script to replay (one JSON event per line)
    pub script: PathBuf,

    /// Render every printed identifier number as zero
    #[arg(long)]
    pub suppress_ids: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Outstanding begin identifiers, popped LIFO as end events arrive.
#[derive(Debug, Default)]
struct Outstanding {
    parallel_for: Vec<ExecId>,
    parallel_scan: Vec<ExecId>,
    parallel_reduce: Vec<ExecId>,
    fences: Vec<FenceId>,
}

/// What a replay did, for the closing status line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub unmatched_ends: usize,
}

pub fn run(args: ReplayArgs) -> Result<()> {
    let file = File::open(&args.script)
        .with_context(|| format!("failed to open script {}", args.script.display()))?;
    let events = parse_script(BufReader::new(file))?;

    let mut config = SessionConfig::from_env(0, 0);
    if args.suppress_ids {
        config = config.with_suppressed_ids(true);
    }

    let mut session = Session::stdout(config)?;
    let summary = replay_events(&mut session, &events)?;
    session.finalize()?;

    crate::output::success(&format!(
        "replayed {} events from {}",
        summary.events,
        args.script.display()
    ));
    if summary.unmatched_ends > 0 {
        crate::output::warning(&format!(
            "{} end events had no matching begin",
            summary.unmatched_ends
        ));
    }
    Ok(())
}

/// Parse a JSON-lines hook script.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<HookEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read script line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: HookEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid hook event on line {}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Drive a session with a parsed event sequence.
///
/// Unmatched end events are tolerated with a warning, mirroring the
/// session's own tolerance for unmatched region pops.
pub fn replay_events<W: Write>(
    session: &mut Session<W>,
    events: &[HookEvent],
) -> Result<ReplaySummary> {
    let mut outstanding = Outstanding::default();
    let mut summary = ReplaySummary::default();

    for event in events {
        summary.events += 1;
        match event {
            HookEvent::BeginParallelFor { name, device } => {
                let id = session.begin_parallel_for(name, *device)?;
                outstanding.parallel_for.push(id);
            }
            HookEvent::EndParallelFor => match outstanding.parallel_for.pop() {
                Some(id) => session.end_parallel_for(id)?,
                None => unmatched(&mut summary, "parallel-for"),
            },
            HookEvent::BeginParallelScan { name, device } => {
                let id = session.begin_parallel_scan(name, *device)?;
                outstanding.parallel_scan.push(id);
            }
            HookEvent::EndParallelScan => match outstanding.parallel_scan.pop() {
                Some(id) => session.end_parallel_scan(id)?,
                None => unmatched(&mut summary, "parallel-scan"),
            },
            HookEvent::BeginParallelReduce { name, device } => {
                let id = session.begin_parallel_reduce(name, *device)?;
                outstanding.parallel_reduce.push(id);
            }
            HookEvent::EndParallelReduce => match outstanding.parallel_reduce.pop() {
                Some(id) => session.end_parallel_reduce(id)?,
                None => unmatched(&mut summary, "parallel-reduce"),
            },
            HookEvent::BeginFence { name, device } => {
                let id = session.begin_fence(name, *device)?;
                outstanding.fences.push(id);
            }
            HookEvent::EndFence => match outstanding.fences.pop() {
                Some(id) => session.end_fence(id)?,
                None => unmatched(&mut summary, "fence"),
            },
            HookEvent::PushRegion { name } => session.push_region(name)?,
            HookEvent::PopRegion => session.pop_region()?,
            HookEvent::Allocate {
                space,
                name,
                ptr,
                size,
            } => session.allocate(space, name, *ptr, *size)?,
            HookEvent::Deallocate {
                space,
                name,
                ptr,
                size,
            } => session.deallocate(space, name, *ptr, *size)?,
            HookEvent::DeepCopy {
                dst_space,
                dst_name,
                dst_ptr,
                src_space,
                src_name,
                src_ptr,
                size,
            } => session.begin_deep_copy(
                dst_space, dst_name, *dst_ptr, src_space, src_name, *src_ptr, *size,
            )?,
        }
    }
    Ok(summary)
}

fn unmatched(summary: &mut ReplaySummary, kind: &str) {
    warn!("end {} event with no outstanding begin", kind);
    summary.unmatched_ends += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use kerntrace_core::{Backend, DeviceId};

    fn session_over(buf: &mut Vec<u8>) -> Session<&mut Vec<u8>> {
        let config = SessionConfig {
            load_sequence: 0,
            interface_version: 1,
            suppress_ids: false,
        };
        Session::new(config, buf).unwrap()
    }

    #[test]
    fn test_parse_script_skips_blanks_and_comments() {
        let script = r#"
# warm-up phase
{"type":"push_region","name":"setup"}

{"type":"begin_parallel_for","name":"init","device":33554432}
{"type":"end_parallel_for"}
{"type":"pop_region"}
"#;
        let events = parse_script(Cursor::new(script)).unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], HookEvent::PushRegion { name } if name == "setup"));
    }

    #[test]
    fn test_parse_script_reports_line_number() {
        let script = "{\"type\":\"pop_region\"}\n{\"type\":\"not_a_hook\"}\n";
        let err = parse_script(Cursor::new(script)).unwrap_err();
        assert!(err.to_string().contains("line 2"), "got {err:#}");
    }

    #[test]
    fn test_replay_pairs_ends_lifo() {
        let device = DeviceId::new(Backend::Cuda, 0);
        let events = vec![
            HookEvent::BeginParallelFor {
                name: "outer".to_string(),
                device,
            },
            HookEvent::BeginParallelFor {
                name: "inner".to_string(),
                device,
            },
            HookEvent::EndParallelFor,
            HookEvent::EndParallelFor,
        ];

        let mut buf = Vec::new();
        let mut session = session_over(&mut buf);
        let summary = replay_events(&mut session, &events).unwrap();
        assert_eq!(summary.events, 4);
        assert_eq!(summary.unmatched_ends, 0);
        drop(session);

        let output = String::from_utf8(buf).unwrap();
        let completed: Vec<&str> = output
            .lines()
            .filter(|l| l.contains("completed"))
            .collect();
        assert_eq!(
            completed,
            vec![
                "KernTrace: Execution of kernel 1 is completed.",
                "KernTrace: Execution of kernel 0 is completed.",
            ]
        );
    }

    #[test]
    fn test_replay_tolerates_unmatched_ends() {
        let events = vec![HookEvent::EndFence, HookEvent::EndParallelScan];

        let mut buf = Vec::new();
        let mut session = session_over(&mut buf);
        let summary = replay_events(&mut session, &events).unwrap();
        assert_eq!(summary.unmatched_ends, 2);
        drop(session);

        // nothing beyond the banner was printed
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_parse_script_from_file() {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", r#"{"type":"begin_fence","name":"sync","device":0}"#).unwrap();
        writeln!(file, "{}", r#"{"type":"end_fence"}"#).unwrap();
        file.flush().unwrap();

        let reader = BufReader::new(File::open(file.path()).unwrap());
        let events = parse_script(reader).unwrap();
        assert_eq!(events.len(), 2);
    }
}
