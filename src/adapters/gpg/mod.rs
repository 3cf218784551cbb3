pub mod command_builder;
pub mod gpg_tool;
