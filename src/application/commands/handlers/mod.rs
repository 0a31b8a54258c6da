//! Command Handlers 实现

mod storybook_handlers;

pub use storybook_handlers::*;
