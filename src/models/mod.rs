pub mod cover;
pub mod generation;
pub mod image;
pub mod text;

pub use cover::*;
pub use generation::*;
pub use image::*;
pub use text::*;
