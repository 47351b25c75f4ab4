pub mod coordinator;
pub mod counter;
pub mod function;
pub mod input;
pub mod job;
pub mod output;
pub mod worker;
