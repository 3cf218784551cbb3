pub mod pgp_tool;
pub mod process;
