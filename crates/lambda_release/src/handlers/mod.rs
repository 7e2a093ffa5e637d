pub mod orchestrator;
pub mod release;
