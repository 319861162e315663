pub mod action_io;
pub mod config_io;
