pub mod remote;
pub mod remote_ui;
