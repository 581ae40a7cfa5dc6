pub mod audio;
pub mod command;
pub mod config;
pub mod events;
pub mod session;
pub mod settings;
pub mod spin;
pub mod sys;
