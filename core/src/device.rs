//! Device identifier decoding and display labels
//!
//! The host runtime hands every kernel and fence hook a packed 32-bit
//! device identifier: the top 8 bits select the backend, the low 24 bits
//! carry the instance descriptor. Decoding is display-only; nothing in the
//! session stores a device identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

const INSTANCE_BITS: u32 = 24;
const INSTANCE_MASK: u32 = (1 << INSTANCE_BITS) - 1;

/// Instance descriptor reserved for a synchronization spanning every
/// instance of a device.
pub const ALL_INSTANCES: u32 = INSTANCE_MASK;

/// Instance descriptor reserved for the runtime's dedicated deep-copy
/// execution resource.
pub const DEEP_COPY_RESOURCE: u32 = INSTANCE_MASK - 1;

/// Execution backends the runtime can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Serial,
    OpenMp,
    Cuda,
    Hip,
    OpenMpTarget,
    Hpx,
    Threads,
    Sycl,
    OpenAcc,
    Unknown,
}

impl Backend {
    /// Decode the backend sub-field. `None` for raw values outside the
    /// known set (the caller renders the fallback label).
    pub fn from_raw(raw: u32) -> Option<Backend> {
        match raw {
            0 => Some(Backend::Serial),
            1 => Some(Backend::OpenMp),
            2 => Some(Backend::Cuda),
            3 => Some(Backend::Hip),
            4 => Some(Backend::OpenMpTarget),
            5 => Some(Backend::Hpx),
            6 => Some(Backend::Threads),
            7 => Some(Backend::Sycl),
            8 => Some(Backend::OpenAcc),
            9 => Some(Backend::Unknown),
            _ => None,
        }
    }

    fn to_raw(self) -> u32 {
        match self {
            Backend::Serial => 0,
            Backend::OpenMp => 1,
            Backend::Cuda => 2,
            Backend::Hip => 3,
            Backend::OpenMpTarget => 4,
            Backend::Hpx => 5,
            Backend::Threads => 6,
            Backend::Sycl => 7,
            Backend::OpenAcc => 8,
            Backend::Unknown => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Serial => "Serial",
            Backend::OpenMp => "OpenMP",
            Backend::Cuda => "Cuda",
            Backend::Hip => "HIP",
            Backend::OpenMpTarget => "OpenMPTarget",
            Backend::Hpx => "HPX",
            Backend::Threads => "Threads",
            Backend::Sycl => "SYCL",
            Backend::OpenAcc => "OpenACC",
            Backend::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packed backend/instance identifier as supplied by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Pack a backend and instance descriptor into an identifier.
    pub fn new(backend: Backend, instance: u32) -> DeviceId {
        DeviceId((backend.to_raw() << INSTANCE_BITS) | (instance & INSTANCE_MASK))
    }

    /// Raw backend sub-field (top 8 bits).
    pub fn backend_raw(self) -> u32 {
        self.0 >> INSTANCE_BITS
    }

    /// Decoded backend, if the sub-field is in the known set.
    pub fn backend(self) -> Option<Backend> {
        Backend::from_raw(self.backend_raw())
    }

    /// Instance descriptor (low 24 bits).
    pub fn instance(self) -> u32 {
        self.0 & INSTANCE_MASK
    }
}

/// Renders `(<Backend> <InstanceDescriptor>)`, e.g. `(Cuda Instance 0)`,
/// `(Serial All Instances)`, `(HIP DeepCopyResource)`. Unrecognized backend
/// sub-fields render the fallback literal.
impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match self.backend() {
            Some(b) => b.as_str(),
            None => "Unrecognized",
        };
        match self.instance() {
            ALL_INSTANCES => write!(f, "({backend} All Instances)"),
            DEEP_COPY_RESOURCE => write!(f, "({backend} DeepCopyResource)"),
            n => write!(f, "({backend} Instance {n})"),
        }
    }
}
