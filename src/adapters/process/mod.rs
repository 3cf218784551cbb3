pub mod redirected_process;
