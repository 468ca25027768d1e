//! Forwarded port allocation.
//!
//! Ports come from a shared counter that only ever moves down. The counter
//! backend is what makes two callers never see the same value; this crate
//! never caches a value between calls.

pub mod allocator;
pub mod counter;

pub use allocator::{ForwardedPort, PortAllocator};
pub use counter::{AtomicCounter, FileCounter, MemoryCounter};
