//! Typed metrics parsed from host pseudo-file text.
//!
//! Each submodule pairs pure parsing functions (testable on synthetic text)
//! with a `collect` entry point that drives the host-path cascade and
//! degrades to container-local introspection. No collector can fail; every
//! miss falls to the next heuristic or to a local value.

pub mod cpu;
pub mod disk;
mod local;
pub mod memory;
pub mod os;

pub use cpu::CpuMetrics;
pub use disk::DiskMetrics;
pub use memory::MemoryMetrics;
pub use os::OsIdentity;
