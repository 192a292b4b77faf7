//! # Batch — From Draw Requests to Instance Ranges
//!
//! Game code asks for sprites with [`DrawRequest`]s: "draw frame 9 of the
//! `trees` sheet at this point in the world". The [`Batcher`] collects them
//! over a frame, then [`build`](Batcher::build)s one contiguous instance
//! array with one [`DrawGroup`] per sheet.
//!
//! ```text
//!  register(req) ──► by_sheet[sheet].push(req)
//!
//!  build(store, camera)
//!    for each sheet with requests:
//!      group = { sheet, first: instances.len(), count }
//!      for each request:
//!        world ─camera─► screen px ─anchor─► screen rect ─► NDC
//!        frame ─resolve─► texture rect
//!        push DepthSpriteInstance
//!    clear by_sheet for the next frame
//! ```
//!
//! ## Why Group by Sheet
//!
//! Every sheet has its own pair of textures. Binding textures is the
//! expensive part of a draw call, so all sprites that share a sheet go into
//! one instanced draw. Order within a sheet does not matter: the depth test
//! resolves occlusion per fragment.
//!
//! ## Bad Requests
//!
//! A request naming an unknown sheet, or a frame outside the sheet, is
//! dropped with a warning. It never renders some other frame instead.

use crate::camera::IsoCamera;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::instance::DepthSpriteInstance;
use crate::math::{Rect, Vec2, Vec3};
use crate::store::{Sheet, SheetHandle, SheetStore};

/// A request to draw one frame of one sheet at a point in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRequest {
    pub sheet: SheetHandle,
    /// Frame index within the sheet.
    pub frame: u32,
    /// World location of the sprite's anchor, in meters.
    pub location: Vec3,
    /// Pixel offset of the anchor from the frame's top-left corner.
    /// `None` anchors at the bottom centre of the frame.
    pub anchor: Option<Vec2>,
}

impl DrawRequest {
    pub fn new(sheet: SheetHandle, frame: u32, location: Vec3) -> Self {
        Self {
            sheet,
            frame,
            location,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = Some(anchor);
        self
    }

    fn to_instance<T>(&self, camera: &IsoCamera, sheet: &Sheet<T>) -> Result<DepthSpriteInstance> {
        let size = sheet.desc.frame_size_px();
        let anchor = self.anchor.unwrap_or(Vec2::new(size.x * 0.5, size.y));

        let (screen, depth) = camera.game_to_screen(self.location);
        let tl_px = screen - anchor;
        let br_px = tl_px + size;

        let screen_rect = Rect::new(camera.screen_to_ndc(tl_px), camera.screen_to_ndc(br_px));
        DepthSpriteInstance::from_frame(screen_rect, &sheet.desc, i64::from(self.frame), depth)
    }
}

/// A run of instances drawn with one sheet's textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawGroup {
    pub sheet: SheetHandle,
    pub first: u32,
    pub count: u32,
}

impl DrawGroup {
    /// Instance range for this group, or `None` if `first + count` overflows.
    pub fn range(&self) -> Option<std::ops::Range<u32>> {
        let end = self.first.checked_add(self.count)?;
        Some(self.first..end)
    }
}

/// One frame's worth of instances, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub instances: Vec<DepthSpriteInstance>,
    pub groups: Vec<DrawGroup>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Collects draw requests for a frame and groups them by sheet.
#[derive(Debug)]
pub struct Batcher {
    by_sheet: Vec<Vec<DrawRequest>>,
    pending: usize,
    max_sprites: usize,
    dropped: usize,
}

impl Batcher {
    pub fn new(max_sprites: usize) -> Self {
        Self {
            by_sheet: Vec::new(),
            pending: 0,
            max_sprites,
            dropped: 0,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.max_sprites)
    }

    /// Queue a request for this frame. Returns `false` if the frame is full.
    pub fn register(&mut self, req: DrawRequest) -> bool {
        if self.pending >= self.max_sprites {
            self.dropped += 1;
            return false;
        }

        let id = req.sheet.index();
        if id >= self.by_sheet.len() {
            self.by_sheet.resize_with(id + 1, Vec::new);
        }
        self.by_sheet[id].push(req);
        self.pending += 1;
        true
    }

    /// Number of requests queued so far this frame.
    pub fn len(&self) -> usize {
        self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Turn all queued requests into a [`Batch`] and clear the batcher.
    pub fn build<T>(&mut self, store: &SheetStore<T>, camera: &IsoCamera) -> Batch {
        if self.dropped > 0 {
            log::warn!(
                "Dropped {} sprite requests over the {} sprite limit",
                self.dropped,
                self.max_sprites
            );
        }

        let mut batch = Batch {
            instances: Vec::with_capacity(self.pending),
            groups: Vec::new(),
        };

        for (id, reqs) in self.by_sheet.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
            let handle = SheetHandle(id);
            let Some(sheet) = store.get(handle) else {
                log::warn!("Skipping {} sprites for unknown sheet {id}", reqs.len());
                continue;
            };

            let first = batch.instances.len() as u32;
            for req in reqs {
                match req.to_instance(camera, sheet) {
                    Ok(instance) => batch.instances.push(instance),
                    Err(e) => log::warn!("Skipping sprite from sheet '{}': {e}", sheet.desc.name),
                }
            }

            let count = batch.instances.len() as u32 - first;
            if count > 0 {
                batch.groups.push(DrawGroup {
                    sheet: handle,
                    first,
                    count,
                });
            }
        }

        for reqs in &mut self.by_sheet {
            reqs.clear();
        }
        self.pending = 0;
        self.dropped = 0;

        batch
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::from_config(&RendererConfig::default())
    }
}
