pub mod backend;
pub mod cli;
pub mod core;
pub mod orchestrator;
pub mod session;
