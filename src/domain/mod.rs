pub mod classify;
pub mod collector;
pub mod outcome;
pub mod parse;
pub mod probes;
pub mod runner;
pub mod snapshot;
pub mod traffic;
