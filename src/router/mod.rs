pub mod data_router;
pub mod image_decoder;

pub use data_router::{DataRouter, DispatchOutcome, RouterStats};
pub use image_decoder::{ImagePayloadDecoder, ImageSource};
