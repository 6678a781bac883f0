pub mod align;
pub mod font;
pub mod geometry;
pub mod measure;
