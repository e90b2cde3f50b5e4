pub mod combination;
pub mod ensemble;
pub mod evaluation;
pub mod scoring;
pub mod tuning;
