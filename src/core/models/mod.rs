pub mod data_request;
pub mod operation;
