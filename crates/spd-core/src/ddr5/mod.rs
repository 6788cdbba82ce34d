//! DDR5 (JESD400-5) decode and edit.

pub mod decoder;
pub mod editor;
pub mod geometry;
pub mod label;

pub use decoder::Ddr5Decoder;
pub use editor::Ddr5Editor;
pub use geometry::Ddr5Geometry;
