/// Raster edits applied before saving
///
/// Edits are kept as a small description (`EditOps`) and only rendered into
/// pixels when the user previews or saves. Pipeline order is fixed:
/// crop, then rotate, then flip, then filter.
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::GalleryError;

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw90,
            Rotation::Cw90 => Rotation::Cw180,
            Rotation::Cw180 => Rotation::Cw270,
            Rotation::Cw270 => Rotation::None,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw270,
            Rotation::Cw90 => Rotation::None,
            Rotation::Cw180 => Rotation::Cw90,
            Rotation::Cw270 => Rotation::Cw180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Filter {
    #[default]
    None,
    Grayscale,
    Invert,
    /// Added to every channel (-255 to +255)
    Brighten(i32),
    /// Percentage, negative flattens
    Contrast(f32),
    /// Gaussian sigma in pixels
    Blur(f32),
}

impl Filter {
    /// Presets offered by the editor toolbar
    pub const PRESETS: &'static [Filter] = &[
        Filter::None,
        Filter::Grayscale,
        Filter::Invert,
        Filter::Brighten(40),
        Filter::Contrast(30.0),
        Filter::Blur(2.0),
    ];
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::None => write!(f, "None"),
            Filter::Grayscale => write!(f, "Grayscale"),
            Filter::Invert => write!(f, "Invert"),
            Filter::Brighten(v) => write!(f, "Brighten {:+}", v),
            Filter::Contrast(v) => write!(f, "Contrast {:+}", v),
            Filter::Blur(v) => write!(f, "Blur {}", v),
        }
    }
}

/// Crop rectangle in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Centered crop shapes offered by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropPreset {
    #[default]
    Original,
    Square,
    Landscape,
    Portrait,
}

impl CropPreset {
    pub const ALL: &'static [CropPreset] = &[
        CropPreset::Original,
        CropPreset::Square,
        CropPreset::Landscape,
        CropPreset::Portrait,
    ];

    /// Largest centered rectangle with this preset's aspect ratio
    pub fn rect_for(self, width: u32, height: u32) -> Option<CropRect> {
        let (rw, rh) = match self {
            CropPreset::Original => return None,
            CropPreset::Square => (1u64, 1u64),
            CropPreset::Landscape => (16, 9),
            CropPreset::Portrait => (4, 5),
        };
        let (w, h) = (width as u64, height as u64);
        let (cw, ch) = if w * rh > h * rw {
            (h * rw / rh, h)
        } else {
            (w, w * rh / rw)
        };
        (cw > 0 && ch > 0).then(|| CropRect {
            x: ((w - cw) / 2) as u32,
            y: ((h - ch) / 2) as u32,
            width: cw as u32,
            height: ch as u32,
        })
    }
}

impl std::fmt::Display for CropPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CropPreset::Original => "Original",
            CropPreset::Square => "Square",
            CropPreset::Landscape => "16:9",
            CropPreset::Portrait => "4:5",
        })
    }
}

/// Formats offered by "Save as"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Bmp,
}

impl SaveFormat {
    pub const ALL: &'static [SaveFormat] = &[SaveFormat::Jpeg, SaveFormat::Png, SaveFormat::Webp, SaveFormat::Bmp];

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Png => "png",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            SaveFormat::Jpeg => ImageFormat::Jpeg,
            SaveFormat::Png => ImageFormat::Png,
            SaveFormat::Webp => ImageFormat::WebP,
            SaveFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Only JPEG is lossy here
    pub fn uses_quality(self) -> bool {
        self == SaveFormat::Jpeg
    }
}

impl std::fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SaveFormat::Jpeg => "JPEG",
            SaveFormat::Png => "PNG",
            SaveFormat::Webp => "WebP",
            SaveFormat::Bmp => "BMP",
        })
    }
}

/// JPEG quality range offered by the editor
pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 10..=100;
pub const DEFAULT_QUALITY: u8 = 92;

/// How an edited image is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Format implied by the target's extension
    MatchPath,
    /// Format chosen by the user, quality applies to JPEG only
    Chosen { format: SaveFormat, quality: u8 },
}

/// All pending edits for one image
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EditOps {
    pub rotation: Rotation,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub filter: Filter,
    pub crop: Option<CropRect>,
}

impl EditOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if applying these edits would leave the image untouched
    pub fn is_unedited(&self) -> bool {
        *self == Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Render the edits into a new image
    pub fn apply(&self, source: &DynamicImage) -> DynamicImage {
        let mut img = match self.crop.and_then(|crop| clamp_crop(crop, source.width(), source.height())) {
            Some(crop) => source.crop_imm(crop.x, crop.y, crop.width, crop.height),
            None => source.clone(),
        };

        img = match self.rotation {
            Rotation::None => img,
            Rotation::Cw90 => img.rotate90(),
            Rotation::Cw180 => img.rotate180(),
            Rotation::Cw270 => img.rotate270(),
        };

        if self.flip_horizontal {
            img = img.fliph();
        }
        if self.flip_vertical {
            img = img.flipv();
        }

        match self.filter {
            Filter::None => img,
            Filter::Grayscale => img.grayscale(),
            Filter::Invert => {
                img.invert();
                img
            }
            Filter::Brighten(value) => img.brighten(value),
            Filter::Contrast(value) => img.adjust_contrast(value),
            Filter::Blur(sigma) if sigma > 0.0 => img.blur(sigma),
            Filter::Blur(_) => img,
        }
    }
}

/// Keep the crop inside the image; an empty crop means no crop
fn clamp_crop(crop: CropRect, width: u32, height: u32) -> Option<CropRect> {
    let x = crop.x.min(width);
    let y = crop.y.min(height);
    let w = crop.width.min(width - x);
    let h = crop.height.min(height - y);
    (w > 0 && h > 0).then_some(CropRect {
        x,
        y,
        width: w,
        height: h,
    })
}

/// Encode `img` as requested, or PNG when that format cannot be written
///
/// Returns the bytes and the format that was actually used.
pub fn encode_image(img: &DynamicImage, encoding: Encoding, path: &Path) -> Result<(Vec<u8>, ImageFormat), GalleryError> {
    let (format, quality) = match encoding {
        Encoding::MatchPath => (ImageFormat::from_path(path).ok(), DEFAULT_QUALITY),
        Encoding::Chosen { format, quality } => (Some(format.image_format()), quality),
    };

    if let Some(format) = format {
        match encode(img, format, quality) {
            Ok(bytes) => return Ok((bytes, format)),
            Err(e) => log::warn!("⚠️  Cannot encode {:?}, saving as PNG: {}", format, e),
        }
    }
    let bytes = encode(img, ImageFormat::Png, quality).map_err(|e| GalleryError::Write(e.to_string()))?;
    Ok((bytes, ImageFormat::Png))
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => {
            let quality = quality.clamp(*QUALITY_RANGE.start(), *QUALITY_RANGE.end());
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?
        }
        _ => img.write_to(&mut out, format)?,
    }
    Ok(out.into_inner())
}

/// Encoded result of an edit
#[derive(Debug, Clone)]
pub struct RenderedEdit {
    pub bytes: Vec<u8>,
    /// Format actually written, PNG when the requested one failed
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Decode, edit and re-encode an image file's bytes
///
/// `path` is where the result will be written. CPU heavy, call from `spawn_blocking`.
pub fn render_edit(bytes: &[u8], ops: &EditOps, path: &Path, encoding: Encoding) -> Result<RenderedEdit, GalleryError> {
    let source = image::load_from_memory(bytes).map_err(|e| GalleryError::Decode(e.to_string()))?;
    let edited = ops.apply(&source);
    let (encoded, format) = encode_image(&edited, encoding, path)?;
    log::debug!(
        "encoded {}x{} edit for {} as {:?}",
        edited.width(),
        edited.height(),
        path.display(),
        format
    );
    Ok(RenderedEdit {
        bytes: encoded,
        format,
        width: edited.width(),
        height: edited.height(),
    })
}
