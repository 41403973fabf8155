pub mod cli;
pub mod command_catalog;
pub mod command_dispatch;
pub mod command_handlers;
pub mod command_support;
