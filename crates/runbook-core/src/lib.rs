pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod params;
pub mod paths;
pub mod playbook;
pub mod readiness;
pub mod recorder;
pub mod session;
pub mod store;
pub mod view;

pub use engine::{Catalogue, Engine, WhenLoaded};
pub use error::{Result, RunbookError};
