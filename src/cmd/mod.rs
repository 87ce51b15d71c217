//! CLI command implementations.
//!
//! | Module    | Commands handled            |
//! |-----------|-----------------------------|
//! | `serve`   | `Serve`                     |
//! | `project` | `Init`                      |
//! | `forms`   | `Check`, `Forms`, `Export`  |

pub mod forms;
pub mod project;
pub mod serve;

pub use forms::{cmd_check, cmd_export, cmd_forms};
pub use project::cmd_init;
pub use serve::cmd_serve;
