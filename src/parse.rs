use anyhow::{Context, Result};
use image::metadata::Orientation;
use std::path::{Path, PathBuf};

use crate::error::DecodeError;

pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp", "gif"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn is_glob_pattern(path: &Path) -> bool {
    path.to_str().is_some_and(|s| s.contains(['*', '?', '[']))
}

/// expand dirs and glob patterns in the input list into image files, keeping
/// argument order; files inside one dir or one pattern are sorted by name
pub fn expand_image_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut result = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Cannot read directory: {}", path.display()))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            entries.sort();
            anyhow::ensure!(
                !entries.is_empty(),
                "No image files found in {}",
                path.display()
            );
            result.extend(entries);
        } else if !path.exists() && is_glob_pattern(path) {
            // shells on some platforms hand patterns through unexpanded
            let pattern = path.to_string_lossy();
            let mut matches: Vec<PathBuf> = glob::glob(&pattern)
                .with_context(|| format!("Invalid glob pattern: {}", pattern))?
                .filter_map(|entry| match entry {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::warn!("skipping unreadable path: {}", e);
                        None
                    }
                })
                .filter(|p| p.is_file())
                .collect();
            matches.sort();
            anyhow::ensure!(!matches.is_empty(), "No files match {}", pattern);
            result.extend(matches);
        } else {
            result.push(path.clone());
        }
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    /// transform flag of the Adobe APP14 segment, if present
    pub adobe_color_transform: Option<u8>,
    /// EXIF orientation tag (1-8) from the APP1 segment, if present
    pub exif_orientation: Option<u8>,
}

/// scan JPEG markers up to the first SOF for dimensions and colour layout
pub fn parse_jpeg_header(data: &[u8]) -> Result<JpegInfo, DecodeError> {
    if data.len() < 2 || data[..2] != JPEG_SOI {
        return Err(DecodeError::Jpeg("missing SOI marker"));
    }
    let mut adobe_color_transform = None;
    let mut exif_orientation = None;
    let mut pos = 2;
    while pos + 4 < data.len() {
        if data[pos] != 0xFF {
            return Err(DecodeError::Jpeg("invalid marker"));
        }
        let marker = data[pos + 1];
        // fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // standalone markers carry no length field
        if marker == 0x00 || (0xD0..=0xD9).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let segment_end = pos + 2 + len;
        if len < 2 || segment_end > data.len() {
            return Err(DecodeError::Jpeg("truncated segment"));
        }
        let payload = &data[pos + 4..segment_end];

        if marker == 0xEE && payload.len() >= 12 && payload.starts_with(b"Adobe") {
            adobe_color_transform = Some(payload[11]);
        }
        if marker == 0xE1 {
            if let Some(tiff) = payload.strip_prefix(b"Exif\0\0") {
                exif_orientation = Orientation::from_exif_chunk(tiff).map(Orientation::to_exif);
            }
        }

        // SOF0-3, SOF5-7, SOF9-11, SOF13-15 (0xC4 DHT, 0xC8 JPG, 0xCC DAC are not frames)
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            if payload.len() < 6 {
                return Err(DecodeError::Jpeg("truncated SOF"));
            }
            let height = u16::from_be_bytes([payload[1], payload[2]]) as u32;
            let width = u16::from_be_bytes([payload[3], payload[4]]) as u32;
            return Ok(JpegInfo {
                width,
                height,
                components: payload[5],
                adobe_color_transform,
                exif_orientation,
            });
        }
        pos = segment_end;
    }
    Err(DecodeError::Jpeg("no SOF marker"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
    pub has_trns: bool,
    pub idat_data: Vec<u8>,
    pub plte_data: Vec<u8>,
}

/// walk PNG chunks for IHDR info and the concatenated IDAT stream
pub fn parse_png_header(data: &[u8]) -> Result<PngInfo, DecodeError> {
    if data.len() < 8 || data[..8] != PNG_SIGNATURE {
        return Err(DecodeError::Png("missing signature"));
    }

    let mut pos = 8;
    let mut ihdr = None;
    let mut has_trns = false;
    let mut idat_data = Vec::new();
    let mut plte_data = Vec::new();

    while pos + 8 <= data.len() {
        let chunk_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let chunk_type = &data[pos + 4..pos + 8];
        let start = pos + 8;
        // +4 for CRC
        let chunk_end = start
            .checked_add(chunk_len)
            .and_then(|end| end.checked_add(4))
            .filter(|&end| end <= data.len())
            .ok_or(DecodeError::Png("truncated chunk"))?;
        let body = &data[start..start + chunk_len];

        match chunk_type {
            b"IHDR" => {
                if body.len() < 13 {
                    return Err(DecodeError::Png("truncated IHDR"));
                }
                ihdr = Some((
                    u32::from_be_bytes([body[0], body[1], body[2], body[3]]),
                    u32::from_be_bytes([body[4], body[5], body[6], body[7]]),
                    body[8],
                    body[9],
                    body[12],
                ));
            }
            b"PLTE" => plte_data.extend_from_slice(body),
            b"tRNS" => has_trns = true,
            b"IDAT" => idat_data.extend_from_slice(body),
            b"IEND" => break,
            _ => {}
        }

        pos = chunk_end;
    }

    let (width, height, bit_depth, color_type, interlace) =
        ihdr.ok_or(DecodeError::Png("no IHDR chunk"))?;
    if idat_data.is_empty() {
        return Err(DecodeError::Png("no IDAT chunks"));
    }

    Ok(PngInfo {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
        has_trns,
        idat_data,
        plte_data,
    })
}
