//! Placement of a single image on a page.
//!
//! All values are in layout units with the origin at the top-left corner of
//! the page. The image is shrunk (never grown) to fit the content area left
//! after the margins, keeping its aspect ratio, and centred in that area.

use crate::error::ConfigError;
use crate::options::{MarginPreset, PageSize};

/// where and how large an image is drawn on its page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub target_width: f64,
    pub target_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Compute the placement of an `image_width` x `image_height` image on a page.
///
/// The fit is done in two passes: width first, then height against the
/// already width-fitted size. This is kept as-is rather than collapsed into a
/// single `min(cw / w, ch / h)` ratio so page output stays identical to the
/// classic converter.
///
/// # Panics
///
/// If either image dimension is zero, or if the margins leave no content area.
/// Validate margins up front with [`PageGeometry::new`].
pub fn compute_placement(
    image_width: u32,
    image_height: u32,
    page_width: f64,
    page_height: f64,
    margin_left: f64,
    margin_top: f64,
) -> Placement {
    assert!(
        image_width > 0 && image_height > 0,
        "image dimensions must be positive, got {}x{}",
        image_width,
        image_height
    );
    assert!(
        page_width > 2.0 * margin_left && page_height > 2.0 * margin_top,
        "margins {}x{} leave no content area on a {}x{} page",
        margin_left,
        margin_top,
        page_width,
        page_height
    );

    let content_width = page_width - 2.0 * margin_left;
    let content_height = page_height - 2.0 * margin_top;

    let image_w = image_width as f64;
    let image_h = image_height as f64;
    let mut target_width = image_w;
    let mut target_height = image_h;

    if target_width > content_width {
        target_width = content_width;
        target_height = image_h * (target_width / image_w);
    }
    if target_height > content_height {
        target_height = content_height;
        target_width = image_w * (target_height / image_h);
    }

    Placement {
        target_width,
        target_height,
        offset_x: margin_left + (content_width - target_width) / 2.0,
        offset_y: margin_top + (content_height - target_height) / 2.0,
    }
}

/// A page with validated margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    page_width: f64,
    page_height: f64,
    margin_left: f64,
    margin_top: f64,
}

impl PageGeometry {
    /// Fails if the margins would leave an empty or negative content area
    pub fn new(
        page_width: f64,
        page_height: f64,
        margin_left: f64,
        margin_top: f64,
    ) -> Result<PageGeometry, ConfigError> {
        let fits = margin_left >= 0.0
            && margin_top >= 0.0
            && page_width - 2.0 * margin_left > 0.0
            && page_height - 2.0 * margin_top > 0.0;
        if !fits {
            return Err(ConfigError::MarginTooLarge {
                page_width,
                page_height,
                margin_left,
                margin_top,
            });
        }
        Ok(PageGeometry {
            page_width,
            page_height,
            margin_left,
            margin_top,
        })
    }

    /// Geometry of a standard page with a uniform preset margin
    pub fn for_page(page_size: PageSize, margin: MarginPreset) -> Result<PageGeometry, ConfigError> {
        let (w, h) = page_size.dimensions();
        PageGeometry::new(w, h, margin.pixels(), margin.pixels())
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin_left
    }

    pub fn content_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin_top
    }

    pub fn place(&self, image_width: u32, image_height: u32) -> Placement {
        compute_placement(
            image_width,
            image_height,
            self.page_width,
            self.page_height,
            self.margin_left,
            self.margin_top,
        )
    }
}
