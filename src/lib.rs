pub mod allocator;
pub mod app;
pub mod config;
pub mod registry;
pub mod shared;
pub mod store;
pub mod workflow;
