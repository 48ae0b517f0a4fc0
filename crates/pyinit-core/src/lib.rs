pub mod archive;
pub mod bootstrap;
pub mod ci;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod io;
pub mod manifest;
pub mod notify;
pub mod paths;
pub mod render;

pub use error::{PyinitError, Result};
