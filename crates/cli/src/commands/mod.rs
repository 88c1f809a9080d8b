pub mod config_cmd;
pub mod console;
pub mod show;
pub mod solve;
pub mod tools;
