use crate::domain::model::PortraitImage;
use crate::domain::ports::ImageCodec;
use crate::utils::error::Result;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortraitFormat {
    Jpeg,
    #[default]
    Png,
}

/// Portrait codec backed by the `image` crate.
///
/// PNG (the default) is lossless, so a saved portrait decodes back to the
/// same pixels. JPEG drops the alpha channel and is lossy even at quality 100.
#[derive(Debug, Clone, Copy)]
pub struct StandardCodec {
    format: PortraitFormat,
    jpeg_quality: u8,
}

impl StandardCodec {
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: PortraitFormat::Jpeg,
            jpeg_quality: quality.clamp(1, 100),
        }
    }

    pub fn png() -> Self {
        Self {
            format: PortraitFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn new(format: PortraitFormat, jpeg_quality: u8) -> Self {
        match format {
            PortraitFormat::Jpeg => Self::jpeg(jpeg_quality),
            PortraitFormat::Png => Self::png(),
        }
    }

    pub fn format(&self) -> PortraitFormat {
        self.format
    }
}

impl Default for StandardCodec {
    fn default() -> Self {
        Self::png()
    }
}

impl ImageCodec for StandardCodec {
    fn encode(&self, portrait: &PortraitImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        match self.format {
            PortraitFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(portrait.image().to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(
                    &mut buffer,
                    self.jpeg_quality,
                ))?;
            }
            PortraitFormat::Png => {
                portrait
                    .image()
                    .write_with_encoder(PngEncoder::new(&mut buffer))?;
            }
        }

        tracing::debug!(
            "Encoded {}x{} portrait as {:?} ({} bytes)",
            portrait.width(),
            portrait.height(),
            self.format,
            buffer.len()
        );
        Ok(buffer)
    }

    fn decode(&self, data: &[u8]) -> Result<PortraitImage> {
        // 依內容判斷格式，不依副檔名（設定為 jpeg 時 birthday.png 實際上是 JPEG）
        let image = image::load_from_memory(data)?;
        Ok(PortraitImage::new(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> PortraitImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let on = (x + y) % 2 == 0;
                pixels.extend_from_slice(if on { &[250, 120, 120] } else { &[10, 40, 200] });
            }
        }
        PortraitImage::from_rgb8(width, height, pixels).unwrap()
    }

    #[test]
    fn test_default_codec_round_trip_is_lossless() {
        let codec = StandardCodec::default();
        assert_eq!(codec.format(), PortraitFormat::Png);
        let portrait = checker(6, 4);

        let bytes = codec.encode(&portrait).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded, portrait);
    }

    #[test]
    fn test_jpeg_encoding_writes_jpeg_stream() {
        let codec = StandardCodec::jpeg(DEFAULT_JPEG_QUALITY);
        assert_eq!(codec.format(), PortraitFormat::Jpeg);

        let bytes = codec.encode(&checker(16, 16)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = StandardCodec::default();
        assert!(codec.decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_quality_is_clamped() {
        let codec = StandardCodec::jpeg(0);
        assert!(codec.encode(&checker(2, 2)).is_ok());
    }
}
