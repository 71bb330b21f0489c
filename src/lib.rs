pub mod app;
pub mod component;
pub mod config;
pub mod error;
pub mod holder;
mod order;
pub mod registry;
pub mod views;

// allow `conductor::...` self-references inside this crate (used by the
// proc-macro expansions)
extern crate self as conductor;

pub mod prelude {
    pub use crate::app::{App, BuildContext};
    pub use crate::component::{Dep, Deps, Host, HostRef, Init, Shared, Tick, View, Views};
    pub use crate::config::AppConfig;
    pub use crate::error::{ConductorError, Result};
}

pub use conductor_macros::*;
