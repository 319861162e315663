pub mod action;
pub mod config;
pub mod patch;
pub mod recurrence;
pub mod view;

pub use action::*;
pub use config::*;
pub use patch::*;
pub use recurrence::*;
pub use view::*;
