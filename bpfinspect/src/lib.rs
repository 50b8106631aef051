//! Live inspection of loaded BPF programs and maps through `bpftool`.

pub mod data;
pub mod error;
pub mod monitor;
pub mod probe;

pub use monitor::Monitor;
