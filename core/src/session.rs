//! Trace session: the hook state machine
//!
//! A [`Session`] is the explicit home of everything the hooks mutate: the
//! execution-identifier counter, the region stack, and the cached
//! suppression flag. The embedding host constructs one when the library is
//! loaded and calls [`Session::finalize`] on unload. Hooks borrow the
//! session mutably, so callers are serialized by the borrow checker; hosts
//! that invoke hooks from several threads wrap the session in
//! [`SharedSession`](crate::sync::SharedSession) instead.

use std::io::{self, Write};

use tracing::trace;

use crate::device::DeviceId;
use crate::error::Result;
use crate::events::{KernelKind, SpaceHandle};
use crate::region::RegionStack;
use crate::suppress;
use crate::LINE_PREFIX;

/// Unique identifier of one in-flight kernel or fence execution.
pub type ExecId = u64;

/// Marker substring identifying fences the profiling layer issues on its
/// own behalf. Tracing those would only echo the tool's bookkeeping back at
/// the user, so they are filtered.
pub const INTERNAL_FENCE_MARKER: &str = "Profile Tool Fence";

/// Identifier handed back by [`Session::begin_fence`].
///
/// Tool-issued fences get an explicit `Internal` tag instead of a reserved
/// counter value; they consume no identifier and print nothing on either
/// side of the fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceId {
    /// A fence requested by the application; traced like a kernel.
    User(ExecId),
    /// A fence issued by the profiling layer itself; fully silent.
    Internal,
}

/// Session configuration, captured once at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Load sequence number assigned by the host when the tool was loaded.
    pub load_sequence: i32,

    /// Version of the host's profiling hook interface.
    pub interface_version: u64,

    /// Render every printed identifier number as zero.
    pub suppress_ids: bool,
}

impl SessionConfig {
    /// Build a configuration, resolving the suppression flag from the
    /// process environment.
    pub fn from_env(load_sequence: i32, interface_version: u64) -> SessionConfig {
        SessionConfig {
            load_sequence,
            interface_version,
            suppress_ids: suppress::suppress_ids_from_env(),
        }
    }

    /// Override the suppression flag, ignoring the environment.
    pub fn with_suppressed_ids(mut self, suppress_ids: bool) -> SessionConfig {
        self.suppress_ids = suppress_ids;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig::from_env(0, 0)
    }
}

/// One trace session writing line-oriented output to a sink.
#[derive(Debug)]
pub struct Session<W: Write> {
    config: SessionConfig,
    next_id: ExecId,
    regions: RegionStack,
    sink: W,
}

impl Session<io::Stdout> {
    /// Session printing to standard output, the normal hosted arrangement.
    pub fn stdout(config: SessionConfig) -> Result<Session<io::Stdout>> {
        Session::new(config, io::stdout())
    }
}

impl<W: Write> Session<W> {
    /// Construct the session and print the initialization banner. The
    /// identifier counter starts at zero.
    pub fn new(config: SessionConfig, sink: W) -> Result<Session<W>> {
        let mut session = Session {
            config,
            next_id: 0,
            regions: RegionStack::new(),
            sink,
        };
        writeln!(
            session.sink,
            "{LINE_PREFIX}Kernel Logger Library Initialized (sequence is {}, version: {})",
            session.config.load_sequence, session.config.interface_version
        )?;
        Ok(session)
    }

    /// Whether printed identifier numbers are being rendered as zero.
    pub fn suppresses_ids(&self) -> bool {
        self.config.suppress_ids
    }

    /// Number of currently open profiling regions.
    pub fn region_depth(&self) -> usize {
        self.regions.depth()
    }

    fn assign_id(&mut self) -> ExecId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn display_id(&self, id: ExecId) -> ExecId {
        if self.config.suppress_ids {
            0
        } else {
            id
        }
    }

    fn indent(sink: &mut W, level: usize) -> Result<()> {
        write!(sink, "{LINE_PREFIX}")?;
        for _ in 0..level {
            write!(sink, "  ")?;
        }
        Ok(())
    }

    /// Print the open regions oldest-first, one indentation level per line,
    /// returning the resulting depth so the caller can align a kernel name
    /// underneath.
    fn write_region_stack(&mut self) -> Result<usize> {
        let mut level = 0;
        for name in self.regions.iter() {
            Self::indent(&mut self.sink, level)?;
            writeln!(self.sink, "{name}")?;
            level += 1;
        }
        Ok(level)
    }

    fn begin_kernel(&mut self, kind: KernelKind, name: &str, device: DeviceId) -> Result<ExecId> {
        let id = self.assign_id();
        let shown = self.display_id(id);
        writeln!(
            self.sink,
            "{LINE_PREFIX}Executing {kind} kernel on device {device} with unique execution \
             identifier {shown}"
        )?;
        let level = self.write_region_stack()?;
        Self::indent(&mut self.sink, level)?;
        writeln!(self.sink, "    {name}")?;
        Ok(id)
    }

    fn end_kernel(&mut self, id: ExecId) -> Result<()> {
        let shown = self.display_id(id);
        writeln!(self.sink, "{LINE_PREFIX}Execution of kernel {shown} is completed.")?;
        Ok(())
    }

    pub fn begin_parallel_for(&mut self, name: &str, device: DeviceId) -> Result<ExecId> {
        self.begin_kernel(KernelKind::ParallelFor, name, device)
    }

    pub fn end_parallel_for(&mut self, id: ExecId) -> Result<()> {
        self.end_kernel(id)
    }

    pub fn begin_parallel_scan(&mut self, name: &str, device: DeviceId) -> Result<ExecId> {
        self.begin_kernel(KernelKind::ParallelScan, name, device)
    }

    pub fn end_parallel_scan(&mut self, id: ExecId) -> Result<()> {
        self.end_kernel(id)
    }

    pub fn begin_parallel_reduce(&mut self, name: &str, device: DeviceId) -> Result<ExecId> {
        self.begin_kernel(KernelKind::ParallelReduce, name, device)
    }

    pub fn end_parallel_reduce(&mut self, id: ExecId) -> Result<()> {
        self.end_kernel(id)
    }

    /// Trace a fence begin. Tool-issued fences (name contains
    /// [`INTERNAL_FENCE_MARKER`]) are tagged [`FenceId::Internal`], consume
    /// no identifier, and print nothing.
    pub fn begin_fence(&mut self, name: &str, device: DeviceId) -> Result<FenceId> {
        if name.contains(INTERNAL_FENCE_MARKER) {
            trace!("filtering tool-issued fence {:?}", name);
            return Ok(FenceId::Internal);
        }

        let id = self.assign_id();
        let shown = self.display_id(id);
        writeln!(
            self.sink,
            "{LINE_PREFIX}Executing fence on device {device} with unique execution \
             identifier {shown}"
        )?;
        let level = self.write_region_stack()?;
        Self::indent(&mut self.sink, level)?;
        writeln!(self.sink, "    {name}")?;
        Ok(FenceId::User(id))
    }

    pub fn end_fence(&mut self, id: FenceId) -> Result<()> {
        match id {
            FenceId::Internal => Ok(()),
            FenceId::User(id) => {
                let shown = self.display_id(id);
                writeln!(self.sink, "{LINE_PREFIX}Execution of fence {shown} is completed.")?;
                Ok(())
            }
        }
    }

    pub fn push_region(&mut self, name: &str) -> Result<()> {
        writeln!(self.sink, "{LINE_PREFIX}Entering profiling region: {name}")?;
        self.regions.push(name);
        Ok(())
    }

    /// Print and remove the most recently entered region. Silent no-op when
    /// no region is open.
    pub fn pop_region(&mut self) -> Result<()> {
        if let Some(name) = self.regions.pop() {
            writeln!(self.sink, "{LINE_PREFIX}Exiting profiling region: {name}")?;
        }
        Ok(())
    }

    pub fn allocate(
        &mut self,
        space: &SpaceHandle,
        name: &str,
        ptr: u64,
        size: u64,
    ) -> Result<()> {
        writeln!(
            self.sink,
            "{LINE_PREFIX}Allocate<{space}> name: {name} pointer: {ptr:#x} size: {size}"
        )?;
        Ok(())
    }

    pub fn deallocate(
        &mut self,
        space: &SpaceHandle,
        name: &str,
        ptr: u64,
        size: u64,
    ) -> Result<()> {
        writeln!(
            self.sink,
            "{LINE_PREFIX}Deallocate<{space}> name: {name} pointer: {ptr:#x} size: {size}"
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn begin_deep_copy(
        &mut self,
        dst_space: &SpaceHandle,
        dst_name: &str,
        dst_ptr: u64,
        src_space: &SpaceHandle,
        src_name: &str,
        src_ptr: u64,
        size: u64,
    ) -> Result<()> {
        writeln!(
            self.sink,
            "{LINE_PREFIX}DeepCopy<{dst_space},{src_space}> DST(name: {dst_name} pointer: \
             {dst_ptr:#x}) SRC(name: {src_name} pointer: {src_ptr:#x}) Size: {size}"
        )?;
        Ok(())
    }

    /// Print the finalization line and consume the session. Matches the
    /// host's library-unload hook.
    pub fn finalize(mut self) -> Result<()> {
        writeln!(self.sink, "{LINE_PREFIX}Library finalization called.")?;
        Ok(())
    }
}
