pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod outcome;
pub mod policy;
pub mod rational;
pub mod simulation;
pub mod solver;
pub mod strategy;
pub mod table;
