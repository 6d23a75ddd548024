use thiserror::Error;

/// Invalid conversion settings, caught before any page is laid out
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "margins of {margin_left}x{margin_top} leave no content area on a {page_width:.2}x{page_height:.2} page"
    )]
    /// The margins meet or exceed half of the page width or height
    MarginTooLarge {
        page_width: f64,
        page_height: f64,
        margin_left: f64,
        margin_top: f64,
    },

    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColour(String),
}

/// An image blob could not be turned into something a page can show
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("image data is empty or truncated")]
    TooSmall,

    #[error("malformed JPEG: {0}")]
    Jpeg(&'static str),

    #[error("malformed PNG: {0}")]
    Png(&'static str),

    #[error("unsupported {format} image: {detail}")]
    Unsupported {
        format: &'static str,
        detail: String,
    },

    #[error("image has zero width or height")]
    ZeroSized,

    #[error(transparent)]
    /// [png] failed to decode the image
    PngDecode(#[from] png::DecodingError),

    #[error(transparent)]
    /// [image] failed to decode the image
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from building a document out of a sequence of images
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("no images to convert")]
    EmptyInput,

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("failed to decode image #{} ({name})", .index + 1)]
    Decode {
        index: usize,
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    /// [lopdf] failed to encode the document
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Misuse of the image collection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("index {index} is out of bounds (collection holds {len} images)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("no image with id {0}")]
    UnknownId(u32),
}
