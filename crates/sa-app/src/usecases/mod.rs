//! Use cases spanning more than one port.

pub mod upload_gallery_image;

pub use upload_gallery_image::UploadGalleryImage;
