use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::decode::DecodedImage;
use crate::error::ConvertError;
use crate::options::{PageSize, Rgb, PT_PER_UNIT};

/// Drawing surface the assembler renders pages onto.
///
/// Coordinates are layout units with the origin at the top-left corner of
/// the page. A new document starts with one empty page.
pub trait PdfWriter {
    type Output;

    fn new_document(&mut self, page_size: PageSize);

    fn set_fill_color(&mut self, colour: Rgb);

    /// fill a rectangle with the current fill colour
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn add_image(
        &mut self,
        image: DecodedImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ConvertError>;

    /// finish the current page and start a new empty one
    fn add_page(&mut self) -> Result<(), ConvertError>;

    fn page_count(&self) -> usize;

    fn save(self) -> Result<Self::Output, ConvertError>;
}

/// document metadata written to the Info dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Default)]
struct PageContent {
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// [`PdfWriter`] building the document with lopdf; saves to PDF bytes
pub struct LopdfWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<Object>,
    /// page size in points
    page_pt: (f64, f64),
    current: Option<PageContent>,
    fill: Rgb,
    info: DocumentInfo,
}

impl LopdfWriter {
    pub fn new(info: DocumentInfo) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        LopdfWriter {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_pt: PageSize::default().dimensions_pt(),
            current: None,
            fill: Rgb::WHITE,
            info,
        }
    }

    fn page(&mut self) -> &mut PageContent {
        self.current.get_or_insert_with(PageContent::default)
    }

    /// layout rect (top-left origin, units) to PDF rect (bottom-left origin, points)
    fn to_pdf_rect(&self, x: f64, y: f64, width: f64, height: f64) -> [f32; 4] {
        let (_, page_h) = self.page_pt;
        [
            (x * PT_PER_UNIT) as f32,
            (page_h - (y + height) * PT_PER_UNIT) as f32,
            (width * PT_PER_UNIT) as f32,
            (height * PT_PER_UNIT) as f32,
        ]
    }

    fn finish_page(&mut self) -> Result<(), ConvertError> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };
        let content = Content {
            operations: page.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => page.xobjects,
        });
        let (w, h) = self.page_pt;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(w as f32), Object::Real(h as f32)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        self.page_ids.push(page_id.into());
        Ok(())
    }

    fn write_info(&mut self) {
        let mut info_dict = Dictionary::new();
        info_dict.set(
            "Producer",
            Object::string_literal(format!("pagefit {}", env!("CARGO_PKG_VERSION"))),
        );
        // PDF date format: D:YYYYMMDDHHmmSSZ
        let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        info_dict.set("CreationDate", Object::string_literal(created));
        if let Some(t) = &self.info.title {
            info_dict.set("Title", Object::string_literal(t.as_str()));
        }
        if let Some(a) = &self.info.author {
            info_dict.set("Author", Object::string_literal(a.as_str()));
        }
        let info_id = self.doc.add_object(Object::Dictionary(info_dict));
        self.doc.trailer.set("Info", info_id);
    }
}

impl PdfWriter for LopdfWriter {
    type Output = Vec<u8>;

    fn new_document(&mut self, page_size: PageSize) {
        let info = std::mem::take(&mut self.info);
        *self = LopdfWriter::new(info);
        self.page_pt = page_size.dimensions_pt();
        self.current = Some(PageContent::default());
    }

    fn set_fill_color(&mut self, colour: Rgb) {
        self.fill = colour;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let [px, py, pw, ph] = self.to_pdf_rect(x, y, width, height);
        let (r, g, b) = self.fill.unit_components();
        self.page().operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("re", vec![px.into(), py.into(), pw.into(), ph.into()]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn add_image(
        &mut self,
        image: DecodedImage,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ConvertError> {
        let [px, py, pw, ph] = self.to_pdf_rect(x, y, width, height);
        let image_id = add_image_xobject(&mut self.doc, image);
        let page = self.page();
        let name = format!("Im{}", page.xobjects.len());
        page.xobjects.set(name.as_bytes(), image_id);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    pw.into(),
                    0.into(),
                    0.into(),
                    ph.into(),
                    px.into(),
                    py.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn add_page(&mut self) -> Result<(), ConvertError> {
        self.finish_page()?;
        self.current = Some(PageContent::default());
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.current.is_some())
    }

    fn save(mut self) -> Result<Vec<u8>, ConvertError> {
        self.finish_page()?;

        let count = self.page_ids.len() as i64;
        let kids = std::mem::take(&mut self.page_ids);
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.write_info();

        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

fn image_dict(width: u32, height: u32, color_space: Object, filter: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => Object::Name(filter.as_bytes().to_vec()),
    }
}

fn device_space(channels: u8) -> Object {
    match channels {
        1 => Object::Name(b"DeviceGray".to_vec()),
        4 => Object::Name(b"DeviceCMYK".to_vec()),
        _ => Object::Name(b"DeviceRGB".to_vec()),
    }
}

/// add the image (and its SMask, if any) to the document as XObjects
fn add_image_xobject(doc: &mut Document, image: DecodedImage) -> ObjectId {
    match image {
        DecodedImage::Jpeg {
            width,
            height,
            components,
            invert_cmyk,
            data,
        } => {
            let mut dict = image_dict(width, height, device_space(components), "DCTDecode");
            if invert_cmyk {
                dict.set("Decode", [1, 0, 1, 0, 1, 0, 1, 0].map(Object::from).to_vec());
            }
            doc.add_object(Stream::new(dict, data))
        }
        DecodedImage::PngPassthrough { info } => {
            let (color_space, colors) = if info.color_type == 3 {
                let max_index = (info.plte_data.len() / 3).saturating_sub(1) as i64;
                let indexed = Object::Array(vec![
                    Object::Name(b"Indexed".to_vec()),
                    Object::Name(b"DeviceRGB".to_vec()),
                    Object::Integer(max_index),
                    Object::String(info.plte_data, lopdf::StringFormat::Hexadecimal),
                ]);
                (indexed, 1)
            } else {
                let colors = if info.color_type == 0 { 1 } else { 3 };
                (device_space(colors), colors)
            };
            let mut dict = image_dict(info.width, info.height, color_space, "FlateDecode");
            dict.set("BitsPerComponent", info.bit_depth as i64);
            dict.set(
                "DecodeParms",
                dictionary! {
                    "Predictor" => 15,
                    "Colors" => colors as i64,
                    "BitsPerComponent" => info.bit_depth as i64,
                    "Columns" => info.width as i64,
                },
            );
            doc.add_object(Stream::new(dict, info.idat_data))
        }
        DecodedImage::Compressed {
            width,
            height,
            color_channels,
            color_compressed,
            alpha_compressed,
        } => {
            let mut dict = image_dict(width, height, device_space(color_channels), "FlateDecode");
            if let Some(alpha) = alpha_compressed {
                let smask = image_dict(width, height, device_space(1), "FlateDecode");
                let smask_id = doc.add_object(Stream::new(smask, alpha));
                dict.set("SMask", smask_id);
            }
            doc.add_object(Stream::new(dict, color_compressed))
        }
    }
}
