//! Actions a front end can invoke.
//!
//! - [`start_downsizing`]: Validate the user's folder and budget, then start a run
//! - [`stop_processing`]: Ask the active run to stop

mod image;

pub use image::*;
