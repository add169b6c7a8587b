use ::image::ImageFormat;
use log::warn;

use crate::error::{Result, XlsxError};

const DEFAULT_DPI: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Png,
    Jpeg,
    Bmp,
}

impl ImageType {
    /// Extension used for `xl/media/imageN.<ext>` and the content-type
    /// default.
    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpeg",
            ImageType::Bmp => "bmp",
        }
    }
}

/// Pixel size and resolution recovered from an image header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub image_type: ImageType,
    pub width: u32,
    pub height: u32,
    pub x_dpi: f64,
    pub y_dpi: f64,
}

#[inline]
fn be_u16(data: &[u8], pos: usize) -> Option<u16> {
    data.get(pos..pos + 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

#[inline]
fn be_u32(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline]
fn le_i32(data: &[u8], pos: usize) -> Option<i32> {
    data.get(pos..pos + 4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Sniff the format from the magic bytes and read dimensions and DPI from
/// the header. `name` only appears in warnings.
pub fn image_properties(data: &[u8], name: &str) -> Result<ImageInfo> {
    let format = match ::image::guess_format(data) {
        Ok(format) => format,
        Err(_) => {
            warn!("insert_image(): unsupported image format for file: {}", name);
            return Err(XlsxError::ImageDimensions);
        }
    };

    let info = match format {
        ImageFormat::Png => process_png(data),
        ImageFormat::Jpeg => process_jpeg(data),
        ImageFormat::Bmp => process_bmp(data),
        _ => {
            warn!("insert_image(): unsupported image format for file: {}", name);
            return Err(XlsxError::ImageDimensions);
        }
    };

    match info {
        Some(info) if info.width > 0 && info.height > 0 => Ok(info),
        _ => {
            warn!("insert_image(): no size data found in file: {}", name);
            Err(XlsxError::ImageDimensions)
        }
    }
}

fn process_png(data: &[u8]) -> Option<ImageInfo> {
    let mut width = 0;
    let mut height = 0;
    let mut x_dpi = DEFAULT_DPI;
    let mut y_dpi = DEFAULT_DPI;

    // Chunks start after the 8 byte signature: length, type, data, crc.
    let mut pos = 8;
    while let Some(length) = be_u32(data, pos) {
        let Some(chunk_type) = data.get(pos + 4..pos + 8) else {
            break;
        };
        let body = pos + 8;

        match chunk_type {
            b"IHDR" => {
                width = be_u32(data, body)?;
                height = be_u32(data, body + 4)?;
            }
            b"pHYs" => {
                let x_ppu = be_u32(data, body)?;
                let y_ppu = be_u32(data, body + 4)?;
                let units = *data.get(body + 8)?;
                if units == 1 {
                    x_dpi = x_ppu as f64 * 0.0254;
                    y_dpi = y_ppu as f64 * 0.0254;
                }
            }
            b"IEND" => break,
            _ => {}
        }

        pos = body.saturating_add(length as usize).saturating_add(4);
    }

    Some(ImageInfo {
        image_type: ImageType::Png,
        width,
        height,
        x_dpi: if x_dpi > 0.0 { x_dpi } else { DEFAULT_DPI },
        y_dpi: if y_dpi > 0.0 { y_dpi } else { DEFAULT_DPI },
    })
}

fn process_jpeg(data: &[u8]) -> Option<ImageInfo> {
    let mut width = 0;
    let mut height = 0;
    let mut x_dpi = DEFAULT_DPI;
    let mut y_dpi = DEFAULT_DPI;

    // Markers start right after SOI (FFD8).
    let mut pos = 2;
    while let (Some(marker), Some(length)) = (be_u16(data, pos), be_u16(data, pos + 2)) {
        let body = pos + 4;

        // SOFn markers carry the frame size. C4, C8 and CC share the range
        // but are not frame headers.
        if marker & 0xFFF0 == 0xFFC0 && !matches!(marker, 0xFFC4 | 0xFFC8 | 0xFFCC) {
            height = be_u16(data, body + 1)? as u32;
            width = be_u16(data, body + 3)? as u32;
        }

        // JFIF APP0: identifier and version precede units and densities.
        if marker == 0xFFE0 {
            let units = *data.get(body + 7)?;
            let x_density = be_u16(data, body + 8)? as f64;
            let y_density = be_u16(data, body + 10)? as f64;
            match units {
                1 => {
                    x_dpi = x_density;
                    y_dpi = y_density;
                }
                2 => {
                    x_dpi = x_density * 2.54;
                    y_dpi = y_density * 2.54;
                }
                _ => {}
            }
        }

        if marker == 0xFFDA {
            break;
        }

        pos = pos + 2 + length as usize;
    }

    Some(ImageInfo {
        image_type: ImageType::Jpeg,
        width,
        height,
        x_dpi: if x_dpi > 0.0 { x_dpi } else { DEFAULT_DPI },
        y_dpi: if y_dpi > 0.0 { y_dpi } else { DEFAULT_DPI },
    })
}

/// A negative height marks a top-down bitmap.
fn process_bmp(data: &[u8]) -> Option<ImageInfo> {
    let width = u32::try_from(le_i32(data, 18)?).ok()?;
    Some(ImageInfo {
        image_type: ImageType::Bmp,
        width,
        height: le_i32(data, 22)?.unsigned_abs(),
        x_dpi: DEFAULT_DPI,
        y_dpi: DEFAULT_DPI,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn chunk(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    /// Minimal PNG header stream: signature, IHDR, optional pHYs, IEND.
    pub(crate) fn png_bytes(width: u32, height: u32, ppm: Option<u32>) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        let mut ihdr = width.to_be_bytes().to_vec();
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
        data.extend(chunk(b"IHDR", &ihdr));
        if let Some(ppm) = ppm {
            let mut phys = ppm.to_be_bytes().to_vec();
            phys.extend_from_slice(&ppm.to_be_bytes());
            phys.push(1);
            data.extend(chunk(b"pHYs", &phys));
        }
        data.extend(chunk(b"IEND", &[]));
        data
    }

    fn jpeg_bytes(width: u16, height: u16, units: u8, density: u16) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[1, 1, units]);
        data.extend_from_slice(&density.to_be_bytes());
        data.extend_from_slice(&density.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&[0u8; 10]);
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        data
    }

    #[test]
    fn test_png_dimensions_and_default_dpi() {
        let info = image_properties(&png_bytes(32, 16, None), "a.png").unwrap();
        assert_eq!(info.image_type, ImageType::Png);
        assert_eq!((info.width, info.height), (32, 16));
        assert_eq!((info.x_dpi, info.y_dpi), (96.0, 96.0));
    }

    #[test]
    fn test_png_phys_dpi() {
        let info = image_properties(&png_bytes(10, 10, Some(5906)), "a.png").unwrap();
        assert!((info.x_dpi - 150.0124).abs() < 1e-3);
        assert!((info.y_dpi - 150.0124).abs() < 1e-3);
    }

    #[test]
    fn test_jpeg_sof_and_jfif() {
        let info = image_properties(&jpeg_bytes(640, 480, 1, 72), "a.jpg").unwrap();
        assert_eq!(info.image_type, ImageType::Jpeg);
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.x_dpi, 72.0);

        let info = image_properties(&jpeg_bytes(10, 20, 2, 100), "a.jpg").unwrap();
        assert!((info.y_dpi - 254.0).abs() < 1e-9);
    }

    #[test]
    fn test_bmp_header() {
        let mut data = b"BM".to_vec();
        data.resize(26, 0);
        data[18..22].copy_from_slice(&7u32.to_le_bytes());
        data[22..26].copy_from_slice(&9u32.to_le_bytes());
        let info = image_properties(&data, "a.bmp").unwrap();
        assert_eq!(info.image_type.extension(), "bmp");
        assert_eq!((info.width, info.height), (7, 9));

        data[22..26].copy_from_slice(&(-9i32).to_le_bytes());
        let top_down = image_properties(&data, "top_down.bmp").unwrap();
        assert_eq!((top_down.width, top_down.height), (7, 9));

        data[18..22].copy_from_slice(&(-7i32).to_le_bytes());
        assert!(matches!(image_properties(&data, "bad.bmp"), Err(XlsxError::ImageDimensions)));
    }

    #[test]
    fn test_rejects_unknown_and_sizeless() {
        assert!(matches!(
            image_properties(b"GIF89a......", "a.gif"),
            Err(XlsxError::ImageDimensions)
        ));
        assert!(matches!(
            image_properties(b"nothing here", "a.txt"),
            Err(XlsxError::ImageDimensions)
        ));
        assert!(matches!(
            image_properties(&png_bytes(0, 5, None), "empty.png"),
            Err(XlsxError::ImageDimensions)
        ));
        assert!(matches!(
            image_properties(&png_bytes(5, 0, None), "flat.png"),
            Err(XlsxError::ImageDimensions)
        ));
        assert!(matches!(
            image_properties(&jpeg_bytes(5, 0, 1, 72), "flat.jpg"),
            Err(XlsxError::ImageDimensions)
        ));
    }
}
