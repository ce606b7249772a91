mod compose;
mod download;
mod import;
mod install;
mod start_stop;
mod update;

pub use compose::cmd_compose;
pub use download::cmd_download;
pub use import::cmd_import;
pub use install::{cmd_install, cmd_uninstall};
pub use start_stop::{cmd_start, cmd_stop};
pub use update::cmd_update;
