use tracing::{debug, info};

use crate::decode::decode_image;
use crate::error::ConvertError;
use crate::layout::PageGeometry;
use crate::options::ConvertOptions;
use crate::queue::ImageAsset;
use crate::writer::PdfWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblySummary {
    pub pages: usize,
}

/// Lay out `images` one per page, in order, and save the document.
///
/// Images are decoded and drawn strictly one after another. The first
/// image that fails to decode aborts the run; nothing is saved in that case.
/// Every page gets a full-page background fill before its image.
pub fn assemble<W: PdfWriter>(
    images: &[ImageAsset],
    options: &ConvertOptions,
    mut writer: W,
) -> Result<(W::Output, AssemblySummary), ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::EmptyInput);
    }
    let geometry = PageGeometry::for_page(options.page_size, options.margin)?;
    debug!(
        margin = %options.margin,
        background = %options.background,
        content_width = geometry.content_width(),
        content_height = geometry.content_height(),
        "page geometry"
    );

    writer.new_document(options.page_size);

    for (index, asset) in images.iter().enumerate() {
        let image = decode_image(&asset.data).map_err(|source| ConvertError::Decode {
            index,
            name: asset.name.clone(),
            source,
        })?;
        let (width, height) = image.dimensions();
        let placement = geometry.place(width, height);

        // start a fresh page for every image after the first, so no blank page trails
        if index > 0 {
            writer.add_page()?;
        }
        writer.set_fill_color(options.background);
        writer.fill_rect(0.0, 0.0, geometry.page_width(), geometry.page_height());
        writer.add_image(
            image,
            placement.offset_x,
            placement.offset_y,
            placement.target_width,
            placement.target_height,
        )?;

        debug!(?placement, width, height, "placed image");
        info!("  [{}/{}] {}", index + 1, images.len(), asset.name);
    }

    let pages = writer.page_count();
    let output = writer.save()?;
    Ok((output, AssemblySummary { pages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedImage;
    use crate::options::{MarginPreset, PageSize, Rgb};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        NewDocument(PageSize),
        Fill(Rgb),
        Rect(f64, f64, f64, f64),
        Image((u32, u32), f64, f64, f64, f64),
        AddPage,
    }

    /// records drawing calls; pages are counted the way a real writer would
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        pages: usize,
    }

    impl PdfWriter for Recorder {
        type Output = Vec<Call>;

        fn new_document(&mut self, page_size: PageSize) {
            self.calls.push(Call::NewDocument(page_size));
            self.pages = 1;
        }

        fn set_fill_color(&mut self, colour: Rgb) {
            self.calls.push(Call::Fill(colour));
        }

        fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
            self.calls.push(Call::Rect(x, y, width, height));
        }

        fn add_image(
            &mut self,
            image: DecodedImage,
            x: f64,
            y: f64,
            width: f64,
            height: f64,
        ) -> Result<(), ConvertError> {
            self.calls
                .push(Call::Image(image.dimensions(), x, y, width, height));
            Ok(())
        }

        fn add_page(&mut self) -> Result<(), ConvertError> {
            self.calls.push(Call::AddPage);
            self.pages += 1;
            Ok(())
        }

        fn page_count(&self) -> usize {
            self.pages
        }

        fn save(self) -> Result<Vec<Call>, ConvertError> {
            Ok(self.calls)
        }
    }

    fn png_asset(name: &str, width: u32, height: u32) -> ImageAsset {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 80, 120]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::from(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        ImageAsset::new(name, out.into_inner())
    }

    fn options(margin: MarginPreset) -> ConvertOptions {
        ConvertOptions {
            margin,
            background: Rgb::new(0x33, 0x66, 0x99),
            page_size: PageSize::A4,
        }
    }

    #[test]
    fn one_page_per_image_without_trailing_blank() {
        let images = [
            png_asset("a.png", 10, 20),
            png_asset("b.png", 30, 10),
            png_asset("c.png", 5, 5),
        ];
        let (calls, summary) =
            assemble(&images, &options(MarginPreset::Low), Recorder::default()).unwrap();
        assert_eq!(summary.pages, 3);

        let add_pages = calls.iter().filter(|c| **c == Call::AddPage).count();
        assert_eq!(add_pages, 2);
        assert_ne!(calls.last(), Some(&Call::AddPage));

        let fills = calls
            .iter()
            .filter(|c| **c == Call::Fill(Rgb::new(0x33, 0x66, 0x99)))
            .count();
        assert_eq!(fills, 3);
    }

    #[test]
    fn page_is_filled_before_image_is_drawn() {
        let images = [png_asset("only.png", 100, 100)];
        let (calls, _) =
            assemble(&images, &options(MarginPreset::None), Recorder::default()).unwrap();
        let (pw, ph) = PageSize::A4.dimensions();
        assert_eq!(
            calls[..3],
            [
                Call::NewDocument(PageSize::A4),
                Call::Fill(Rgb::new(0x33, 0x66, 0x99)),
                Call::Rect(0.0, 0.0, pw, ph),
            ]
        );
        match &calls[3] {
            Call::Image(dims, x, y, w, h) => {
                assert_eq!(*dims, (100, 100));
                assert_eq!((*w, *h), (100.0, 100.0));
                assert!((x - (pw - 100.0) / 2.0).abs() < 1e-9);
                assert!((y - (ph - 100.0) / 2.0).abs() < 1e-9);
            }
            other => panic!("expected image draw, got {:?}", other),
        }
    }

    #[test]
    fn large_image_is_fitted_inside_margins() {
        let images = [png_asset("wide.png", 2000, 500)];
        let (calls, _) =
            assemble(&images, &options(MarginPreset::Big), Recorder::default()).unwrap();
        let (pw, _) = PageSize::A4.dimensions();
        let Some(Call::Image(_, x, _, w, h)) = calls.last() else {
            panic!("last call should draw the image");
        };
        assert!((w - (pw - 140.0)).abs() < 1e-9);
        assert!((h - (pw - 140.0) / 4.0).abs() < 1e-9);
        assert!((x - 70.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_rejected_before_writing() {
        let err = assemble(&[], &options(MarginPreset::None), Recorder::default()).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyInput));
    }

    #[test]
    fn decode_failure_aborts_with_index() {
        let images = [
            png_asset("good.png", 4, 4),
            ImageAsset::new("broken.png", b"not an image at all".to_vec()),
            png_asset("never.png", 4, 4),
        ];
        let err = assemble(&images, &options(MarginPreset::None), Recorder::default())
            .unwrap_err();
        match err {
            ConvertError::Decode { index, name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "broken.png");
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn lopdf_output_has_one_page_per_image() {
        let images = [
            png_asset("a.png", 8, 8),
            png_asset("b.png", 600, 900),
            png_asset("c.png", 900, 600),
        ];
        let writer = crate::writer::LopdfWriter::new(Default::default());
        let (bytes, summary) = assemble(&images, &options(MarginPreset::Medium), writer).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(summary.pages, 3);
    }
}
