//! Application state module

mod app_state;
mod forms;

pub use app_state::*;
pub use forms::*;
