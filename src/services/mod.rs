pub mod classifier;
pub mod frequency;
pub mod ledger;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod store;
