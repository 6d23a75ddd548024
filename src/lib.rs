//! Lay images out one per page into a single PDF.
//!
//! [`layout`] holds the page geometry, [`assemble`] drives a [`writer::PdfWriter`]
//! over an ordered set of images, and [`decode`] prepares each image for
//! embedding.

pub mod assemble;
pub mod decode;
pub mod error;
pub mod layout;
pub mod options;
pub mod parse;
pub mod queue;
pub mod writer;

pub use assemble::{assemble, AssemblySummary};
pub use error::{ConfigError, ConvertError, DecodeError, IntakeError};
pub use layout::{compute_placement, PageGeometry, Placement};
pub use options::{ConvertOptions, MarginPreset, PageSize, Rgb};
pub use queue::{ImageAsset, ImageId, ImageQueue};
