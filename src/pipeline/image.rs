// src/pipeline/image.rs

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::pipeline::{FileSet, Stage, StageContext, StageError};

/// Encoder preferences for image optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Progressive JPEG scans. The `image` JPEG encoder only writes baseline
    /// scans, so this is reported and otherwise has no effect.
    pub progressive: bool,
    /// Interlaced PNG output. The `image` PNG encoder never interlaces, so
    /// this is reported and otherwise has no effect.
    pub interlaced: bool,
    /// Quality used when re-encoding JPEG.
    pub jpeg_quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            progressive: true,
            interlaced: true,
            jpeg_quality: 85,
        }
    }
}

/// `optimize`: losslessly recompress PNGs, re-encode JPEGs, and keep whichever
/// of the original and re-encoded bytes is smaller. Formats without an
/// encoder here (GIF, SVG, WebP, ...) pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeImages {
    options: ImageOptions,
}

impl OptimizeImages {
    pub fn new(options: ImageOptions) -> Self {
        Self { options }
    }

    fn reencode(&self, bytes: &[u8]) -> image::ImageResult<Option<Vec<u8>>> {
        let Ok(format) = image::guess_format(bytes) else {
            return Ok(None);
        };

        let mut out = Vec::new();
        match format {
            ImageFormat::Png => {
                let img = image::load_from_memory_with_format(bytes, format)?;
                let encoder = PngEncoder::new_with_quality(
                    Cursor::new(&mut out),
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
            }
            ImageFormat::Jpeg => {
                let img = image::load_from_memory_with_format(bytes, format)?;
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder =
                    JpegEncoder::new_with_quality(Cursor::new(&mut out), self.options.jpeg_quality);
                rgb.write_with_encoder(encoder)?;
            }
            _ => return Ok(None),
        }

        Ok(Some(out))
    }
}

impl Stage for OptimizeImages {
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn apply(&self, mut files: FileSet, _ctx: &StageContext) -> Result<FileSet, StageError> {
        if self.options.progressive || self.options.interlaced {
            debug!(
                progressive = self.options.progressive,
                interlaced = self.options.interlaced,
                "encoders write baseline JPEG and non-interlaced PNG"
            );
        }

        for file in &mut files {
            let reencoded = self
                .reencode(&file.contents)
                .map_err(|source| StageError::Image {
                    file: file.source.clone(),
                    source,
                })?;

            match reencoded {
                Some(bytes) if bytes.len() < file.contents.len() => {
                    debug!(
                        file = ?file.relative,
                        before = file.contents.len(),
                        after = bytes.len(),
                        "image optimized"
                    );
                    file.contents = bytes;
                }
                _ => debug!(file = ?file.relative, "image kept as is"),
            }
        }
        Ok(files)
    }
}
