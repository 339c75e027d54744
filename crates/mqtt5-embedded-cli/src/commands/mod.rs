pub mod provision_cmd;
pub mod run_cmd;
