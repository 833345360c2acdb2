// apps/hl_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod validate;
