//! One module per subcommand, each exposing `execute`.

pub mod add;
pub mod audit_cmd;
pub mod completions;
pub mod delete;
pub mod get;
pub mod init;
pub mod list;
pub mod purge;
pub mod unlock;
pub mod update;
