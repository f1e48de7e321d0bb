pub mod cloud;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod ledger;
pub mod match_dataset;
pub mod outcome;
pub mod rankings;
pub mod scout;
pub mod secrets;
pub mod settlement;
pub mod state;
