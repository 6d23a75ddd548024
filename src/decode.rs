use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

use crate::error::DecodeError;
use crate::parse::{parse_jpeg_header, parse_png_header, PngInfo, JPEG_SOI, PNG_SIGNATURE};

/// image data in the shape a PDF image XObject needs
#[derive(Debug)]
pub enum DecodedImage {
    /// JPEG bytes, embedded as-is with DCTDecode
    Jpeg {
        width: u32,
        height: u32,
        components: u8,
        /// true if CMYK values need inversion
        invert_cmyk: bool,
        data: Vec<u8>,
    },
    /// IDAT stream reused directly with a PNG predictor
    PngPassthrough { info: PngInfo },
    /// decoded pixels, deflated; alpha kept apart for an SMask
    Compressed {
        width: u32,
        height: u32,
        color_channels: u8,
        color_compressed: Vec<u8>,
        alpha_compressed: Option<Vec<u8>>,
    },
}

impl DecodedImage {
    /// intrinsic size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            DecodedImage::Jpeg { width, height, .. } => (*width, *height),
            DecodedImage::PngPassthrough { info } => (info.width, info.height),
            DecodedImage::Compressed { width, height, .. } => (*width, *height),
        }
    }
}

/// Decode an image blob far enough to know its size and embed it.
///
/// JPEGs pass through untouched. Opaque, non-interlaced PNGs reuse their
/// IDAT data. Anything else is decoded and recompressed, with any alpha
/// channel split out so the page background shows through.
pub fn decode_image(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::TooSmall);
    }

    let decoded = if data.starts_with(&JPEG_SOI) {
        decode_jpeg(data)?
    } else if data.starts_with(&PNG_SIGNATURE) {
        decode_png(data)?
    } else {
        decode_generic_image(data)?
    };

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSized);
    }
    Ok(decoded)
}

fn decode_jpeg(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let info = parse_jpeg_header(data)?;
    if !matches!(info.components, 1 | 3 | 4) {
        return Err(DecodeError::Unsupported {
            format: "JPEG",
            detail: format!("{} colour components", info.components),
        });
    }
    // DCT data cannot be rotated in place
    if info.exif_orientation.is_some_and(|o| o != 1) {
        return decode_generic_image(data);
    }
    // Adobe CMYK is stored inverted unless the APP14 transform says otherwise
    let invert_cmyk = info.components == 4 && info.adobe_color_transform != Some(0);
    Ok(DecodedImage::Jpeg {
        width: info.width,
        height: info.height,
        components: info.components,
        invert_cmyk,
        data: data.to_vec(),
    })
}

fn decode_png(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let info = parse_png_header(data)?;

    // interlaced rows and tRNS transparency cannot be expressed through IDAT passthrough
    if info.interlace != 0 || info.has_trns {
        return decode_generic_image(data);
    }

    match info.color_type {
        0 | 2 => Ok(DecodedImage::PngPassthrough { info }),
        3 => {
            if info.plte_data.is_empty() {
                return Err(DecodeError::Png("palette image without PLTE chunk"));
            }
            Ok(DecodedImage::PngPassthrough { info })
        }
        4 | 6 => decode_alpha_png(data),
        other => Err(DecodeError::Unsupported {
            format: "PNG",
            detail: format!("colour type {}", other),
        }),
    }
}

/// decode a PNG with an alpha channel into separate colour and alpha planes
fn decode_alpha_png(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let mut decoder = png::Decoder::new(std::io::Cursor::new(data));
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let buf_size = reader
        .output_buffer_size()
        .ok_or(DecodeError::Png("image too large to buffer"))?;
    let mut buf = vec![0u8; buf_size];
    let frame = reader.next_frame(&mut buf)?;
    let pixels = &buf[..frame.buffer_size()];

    let color_channels: usize = match frame.color_type {
        png::ColorType::GrayscaleAlpha => 1,
        png::ColorType::Rgba => 3,
        other => {
            return Err(DecodeError::Unsupported {
                format: "PNG",
                detail: format!("unexpected decoded layout {:?}", other),
            })
        }
    };
    let (color, alpha) = split_alpha(pixels, color_channels)?;

    Ok(DecodedImage::Compressed {
        width: frame.width,
        height: frame.height,
        color_channels: color_channels as u8,
        color_compressed: color,
        alpha_compressed: Some(alpha),
    })
}

/// decode any format the image crate knows, upright per its EXIF orientation,
/// and deflate the pixels
fn decode_generic_image(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    use image::{GenericImageView, ImageDecoder};

    let mut decoder = image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = image::DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    let (width, height) = img.dimensions();

    if img.color().has_alpha() {
        let rgba = img.into_rgba8();
        let (color, alpha) = split_alpha(rgba.as_raw(), 3)?;
        Ok(DecodedImage::Compressed {
            width,
            height,
            color_channels: 3,
            color_compressed: color,
            alpha_compressed: Some(alpha),
        })
    } else if img.color().channel_count() == 1 {
        let gray = img.into_luma8();
        Ok(DecodedImage::Compressed {
            width,
            height,
            color_channels: 1,
            color_compressed: deflate(gray.as_raw())?,
            alpha_compressed: None,
        })
    } else {
        let rgb = img.into_rgb8();
        Ok(DecodedImage::Compressed {
            width,
            height,
            color_channels: 3,
            color_compressed: deflate(rgb.as_raw())?,
            alpha_compressed: None,
        })
    }
}

/// stream interleaved pixels with a trailing alpha sample into two deflated planes
fn split_alpha(pixels: &[u8], color_channels: usize) -> Result<(Vec<u8>, Vec<u8>), DecodeError> {
    let stride = color_channels + 1;
    let pixel_count = pixels.len() / stride;
    let mut color_enc = ZlibEncoder::new(
        Vec::with_capacity(pixel_count * color_channels / 2),
        Compression::fast(),
    );
    let mut alpha_enc = ZlibEncoder::new(Vec::with_capacity(pixel_count / 2), Compression::fast());

    for px in pixels.chunks_exact(stride) {
        color_enc.write_all(&px[..color_channels])?;
        alpha_enc.write_all(&px[color_channels..])?;
    }
    Ok((color_enc.finish()?, alpha_enc.finish()?))
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::fast());
    enc.write_all(bytes)?;
    enc.finish()
}
