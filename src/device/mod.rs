//! Device Module
//!
//! Seams for the two sensors the evidence flow needs: a one-shot
//! geolocation fix and an image to submit.

mod geolocation;
mod image;

pub use geolocation::{CachedGeolocation, FixedGeolocation, GeolocationProvider, LocationError, PositionOptions};
pub use image::{CapturedImage, HttpImageStore, ImageStore};
