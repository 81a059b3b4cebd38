//! Domain layer: color codec, markup rendering and tag records.

pub mod color;
pub mod error;
pub mod markup;
pub mod tags;
