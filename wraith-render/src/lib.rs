pub mod error;
pub mod render;
pub mod supervisor;

pub use error::RenderError;
pub use supervisor::{RenderOptions, execute_render};
