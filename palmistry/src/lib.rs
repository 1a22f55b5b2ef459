pub mod args;
pub mod backend;
pub mod commands;
pub mod report;
