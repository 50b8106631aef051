pub mod collector;
pub mod enrich;
pub mod map;
pub mod program;
pub mod registry;
pub mod scheduler;
