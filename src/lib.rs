//! Load process-manager launch descriptors into validated launch specs.
//!
//! ```no_run
//! use launchspec::{LoadOptions, load_path};
//!
//! let specs = load_path("ecosystem.config.js", &LoadOptions::default())?;
//! for spec in &specs {
//!     println!("{}: {}", spec.name(), spec.command_line());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod descriptor;
pub mod error;
pub mod export;
pub mod launch;
pub mod load;

pub use descriptor::Format;
pub use error::{EntryRef, LoadError};
pub use export::{export, to_descriptor};
pub use launch::LaunchSpec;
pub use load::{ArgStyle, LoadOptions, load, load_path, validate_and_build};

pub type Result<T> = anyhow::Result<T>;
