//! Host IPv4 address inference.
//!
//! A containerized process cannot simply ask for "the host's IP": its own
//! interfaces carry bridge addresses. This module runs an ordered cascade of
//! strategies over namespace-entered commands and kernel network tables,
//! filtering loopback and container-bridge ranges throughout.
mod filter;
mod resolver;

pub use filter::{is_excluded, is_preferred_private, is_subnet_mask, scan_ipv4_tokens};
pub use resolver::{AddressResolver, UNAVAILABLE, local_interface_address, resolve_host_address};
