pub mod check_cmd;
pub mod dump_cmd;
pub mod run_cmd;
