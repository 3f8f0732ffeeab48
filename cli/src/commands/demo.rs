//! Built-in demonstration trace
//!
//! Emits a canned hook sequence covering every event kind: nested regions,
//! kernels on several backends, a user fence, a filtered tool-issued fence,
//! and the memory hooks.

use anyhow::Result;
use clap::Args;

use kerntrace_core::{
    Backend, DeviceId, HookEvent, Session, SessionConfig, SpaceHandle, INTERNAL_FENCE_MARKER,
};

use super::replay;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Render every printed identifier number as zero
    #[arg(long)]
    pub suppress_ids: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: DemoArgs) -> Result<()> {
    let mut config = SessionConfig::from_env(0, 0);
    if args.suppress_ids {
        config = config.with_suppressed_ids(true);
    }

    let mut session = Session::stdout(config)?;
    let summary = replay::replay_events(&mut session, &events())?;
    session.finalize()?;

    crate::output::success(&format!("demo emitted {} events", summary.events));
    Ok(())
}

/// The demonstration sequence.
pub fn events() -> Vec<HookEvent> {
    let cuda = DeviceId::new(Backend::Cuda, 0);
    let openmp = DeviceId::new(Backend::OpenMp, 1);
    let serial = DeviceId::new(Backend::Serial, 0);
    let host = SpaceHandle::new("Host");
    let device_space = SpaceHandle::new("CudaSpace");

    vec![
        HookEvent::Allocate {
            space: device_space.clone(),
            name: "field".to_string(),
            ptr: 0x7f80_0000_0000,
            size: 1 << 20,
        },
        HookEvent::DeepCopy {
            dst_space: device_space.clone(),
            dst_name: "field".to_string(),
            dst_ptr: 0x7f80_0000_0000,
            src_space: host.clone(),
            src_name: "field_host".to_string(),
            src_ptr: 0x5000_0000,
            size: 1 << 20,
        },
        HookEvent::PushRegion {
            name: "setup".to_string(),
        },
        HookEvent::BeginParallelFor {
            name: "initialize_field".to_string(),
            device: cuda,
        },
        HookEvent::EndParallelFor,
        HookEvent::PopRegion,
        HookEvent::PushRegion {
            name: "timestep".to_string(),
        },
        HookEvent::PushRegion {
            name: "exchange".to_string(),
        },
        HookEvent::BeginParallelScan {
            name: "offsets".to_string(),
            device: openmp,
        },
        HookEvent::EndParallelScan,
        HookEvent::BeginParallelReduce {
            name: "residual_norm".to_string(),
            device: cuda,
        },
        HookEvent::EndParallelReduce,
        HookEvent::BeginFence {
            name: "wait for residual".to_string(),
            device: cuda,
        },
        HookEvent::EndFence,
        // filtered: the profiling layer fencing on its own behalf
        HookEvent::BeginFence {
            name: format!("{INTERNAL_FENCE_MARKER} CudaSpace"),
            device: cuda,
        },
        HookEvent::EndFence,
        HookEvent::PopRegion,
        HookEvent::BeginParallelFor {
            name: "write_checkpoint".to_string(),
            device: serial,
        },
        HookEvent::EndParallelFor,
        HookEvent::PopRegion,
        HookEvent::Deallocate {
            space: device_space,
            name: "field".to_string(),
            ptr: 0x7f80_0000_0000,
            size: 1 << 20,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_sequence_replays_cleanly() {
        let mut buf = Vec::new();
        let config = SessionConfig {
            load_sequence: 0,
            interface_version: 1,
            suppress_ids: false,
        };
        let mut session = Session::new(config, &mut buf).unwrap();

        let summary = replay::replay_events(&mut session, &events()).unwrap();
        assert_eq!(summary.unmatched_ends, 0);
        assert_eq!(session.region_depth(), 0);
        drop(session);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("(OpenMP Instance 1)"));
        assert!(output.contains("DeepCopy<CudaSpace,Host>"));
        // the tool-issued fence never reaches the output
        assert!(!output.contains(INTERNAL_FENCE_MARKER));
    }
}
