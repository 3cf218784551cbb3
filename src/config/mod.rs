pub mod gpg_config;
