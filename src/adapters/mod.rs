pub mod gpg;
pub mod process;
