mod image;
mod swap;

pub use image::ImageFile;
pub use swap::SwapFile;
