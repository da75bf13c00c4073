//! Image media helpers: content-type detection and the local image server.

pub mod media_server;
pub mod mime_detect;

pub use media_server::media_router;
pub use mime_detect::{detect_mime_type, is_image, is_inline_safe, sniff_image_type};
