//! # Sheet — Sprite-Sheet Descriptors and Frame Resolution
//!
//! A sprite sheet (atlas) is a pair of images laid out as a uniform grid of
//! equally-sized frames: a color image and a depth image with the same
//! geometry. A [`SpriteSheetDesc`] describes that grid and where to find the
//! two images. It is produced by an external asset pipeline and consumed here
//! at load time.
//!
//! ```text
//!  origin_x
//!  ├──►┌────┬────┬────┬────┐
//!      │ 0  │ 1  │ 2  │ 3  │   num_across = 4, num_down = 2
//!      ├────┼────┼────┼────┤   total = 7 (last row partial)
//!      │ 4  │ 5  │ 6  │    │
//!      └────┴────┴────┴────┘   frame i → column i % num_across,
//!                                         row    i / num_across
//! ```
//!
//! ## Valid or Rejected
//!
//! Nothing resolves frames from a raw [`SpriteSheetDesc`]. Calling
//! [`SpriteSheetDesc::validate`] either rejects it with a configuration error
//! or returns a [`ValidSheet`], the only type that offers
//! [`resolve`](ValidSheet::resolve). Decoding from the wire validates as part
//! of decoding.
//!
//! ## Wire Formats
//!
//! Descriptors travel as compact binary ([postcard](https://docs.rs/postcard))
//! for shipped assets and as JSON for hand-edited ones. The field names and
//! types are the contract; both encodings carry the same record.

use std::ops::Deref;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpriteError};
use crate::math::{Rect, Vec2};

/// Geometry and image locations of one sprite-sheet atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheetDesc {
    /// Logical identifier, used as the key in a [`SheetStore`](crate::store::SheetStore).
    pub name: String,
    /// Width of the atlas, in texels.
    pub img_width: u16,
    /// Height of the atlas, in texels.
    pub img_height: u16,
    /// X offset of the first frame within the atlas, in texels.
    pub origin_x: u16,
    /// Y offset of the first frame within the atlas, in texels.
    pub origin_y: u16,
    /// Width of one frame, in texels.
    pub spr_width: u16,
    /// Height of one frame, in texels.
    pub spr_height: u16,
    /// Number of frames in each row.
    pub num_across: u16,
    /// Number of frames in each column.
    pub num_down: u16,
    /// Number of usable frames. May be less than `num_across * num_down`.
    pub total: u16,
    /// Path to the color image.
    pub color_path: String,
    /// Path to the depth image.
    pub depth_path: String,
}

impl SpriteSheetDesc {
    /// Check every invariant and promote to a [`ValidSheet`].
    pub fn validate(self) -> Result<ValidSheet> {
        if self.name.is_empty() {
            return Err(SpriteError::MissingField("name"));
        }
        if self.color_path.is_empty() {
            return Err(SpriteError::MissingField("color_path"));
        }
        if self.depth_path.is_empty() {
            return Err(SpriteError::MissingField("depth_path"));
        }

        for (field, value) in [
            ("img_width", self.img_width),
            ("img_height", self.img_height),
            ("spr_width", self.spr_width),
            ("spr_height", self.spr_height),
            ("num_across", self.num_across),
            ("num_down", self.num_down),
        ] {
            if value == 0 {
                return Err(SpriteError::ZeroDimension(field));
            }
        }

        let capacity = self.num_across as u32 * self.num_down as u32;
        if self.total as u32 > capacity {
            return Err(SpriteError::GridOverflow {
                total: self.total as u32,
                capacity,
            });
        }

        // Only the cells that hold usable frames have to lie inside the image.
        let total = self.total as u32;
        let across = self.num_across as u32;
        let cols_used = total.min(across);
        let rows_used = total.div_ceil(across);
        let right = self.origin_x as u32 + cols_used * self.spr_width as u32;
        let bottom = self.origin_y as u32 + rows_used * self.spr_height as u32;
        if right > self.img_width as u32 {
            return Err(SpriteError::FrameOutOfBounds {
                axis: "x",
                extent: right,
                image: self.img_width as u32,
            });
        }
        if bottom > self.img_height as u32 {
            return Err(SpriteError::FrameOutOfBounds {
                axis: "y",
                extent: bottom,
                image: self.img_height as u32,
            });
        }

        Ok(ValidSheet(self))
    }

    /// Encode as compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| SpriteError::Encode(e.to_string()))
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SpriteError::Encode(e.to_string()))
    }

    /// Decode from compact binary and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<ValidSheet> {
        let desc: SpriteSheetDesc =
            postcard::from_bytes(bytes).map_err(|e| SpriteError::Decode(e.to_string()))?;
        desc.validate()
    }

    /// Decode from JSON and validate.
    pub fn from_json(text: &str) -> Result<ValidSheet> {
        let desc: SpriteSheetDesc =
            serde_json::from_str(text).map_err(|e| SpriteError::Decode(e.to_string()))?;
        desc.validate()
    }

    /// Load a descriptor file. `.json` files are parsed as JSON, anything
    /// else as binary.
    pub fn load(path: impl AsRef<Path>) -> Result<ValidSheet> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let sheet = if is_json {
            Self::from_json(&std::fs::read_to_string(path)?)?
        } else {
            Self::from_bytes(&std::fs::read(path)?)?
        };

        log::debug!(
            "Loaded sprite sheet '{}' ({} frames) from {}",
            sheet.name,
            sheet.total,
            path.display()
        );
        Ok(sheet)
    }
}

/// A [`SpriteSheetDesc`] that has passed validation. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSheet(SpriteSheetDesc);

impl ValidSheet {
    /// The underlying descriptor.
    pub fn desc(&self) -> &SpriteSheetDesc {
        &self.0
    }

    /// Give back the descriptor, e.g. to edit and re-validate it.
    pub fn into_desc(self) -> SpriteSheetDesc {
        self.0
    }

    /// Number of usable frames.
    pub fn frame_count(&self) -> u16 {
        self.0.total
    }

    /// Size of one frame as a fraction of the atlas.
    pub fn frame_size_uv(&self) -> Vec2 {
        Vec2::new(
            self.0.spr_width as f32 / self.0.img_width as f32,
            self.0.spr_height as f32 / self.0.img_height as f32,
        )
    }

    /// Size of one frame in texels.
    pub fn frame_size_px(&self) -> Vec2 {
        Vec2::new(self.0.spr_width as f32, self.0.spr_height as f32)
    }

    /// Pixel rectangle `(x, y, width, height)` of frame `frame_index`.
    pub fn frame_pixels(&self, frame_index: i64) -> Result<(u32, u32, u32, u32)> {
        let d = &self.0;
        if frame_index < 0 || frame_index >= d.total as i64 {
            return Err(SpriteError::IndexOutOfRange {
                index: frame_index,
                total: d.total,
            });
        }

        let i = frame_index as u32;
        let across = d.num_across as u32;
        let x = d.origin_x as u32 + (i % across) * d.spr_width as u32;
        let y = d.origin_y as u32 + (i / across) * d.spr_height as u32;
        Ok((x, y, d.spr_width as u32, d.spr_height as u32))
    }

    /// Normalized texture rectangle of frame `frame_index`: `min` is the
    /// frame's top-left texture coordinate, `max` its bottom-right.
    pub fn resolve(&self, frame_index: i64) -> Result<Rect> {
        let (x, y, w, h) = self.frame_pixels(frame_index)?;
        Ok(Rect::from_pixels(
            x as f32,
            y as f32,
            w as f32,
            h as f32,
            self.0.img_width as f32,
            self.0.img_height as f32,
        ))
    }
}

impl Deref for ValidSheet {
    type Target = SpriteSheetDesc;

    fn deref(&self) -> &SpriteSheetDesc {
        &self.0
    }
}

/// Free-function form of [`ValidSheet::resolve`].
pub fn resolve(sheet: &ValidSheet, frame_index: i64) -> Result<Rect> {
    sheet.resolve(frame_index)
}
