//! Typed models

mod entity;
mod value;

pub use entity::*;
pub use value::*;
