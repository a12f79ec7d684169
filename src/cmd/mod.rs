//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `run`    | `Run`            |
//! | `teams`  | `Teams`          |
//! | `config` | `Config`         |

pub mod config;
pub mod run;
pub mod teams;

pub use config::cmd_config;
pub use run::{RunOptions, cmd_run};
pub use teams::cmd_teams;
