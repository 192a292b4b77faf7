//! # Reload — Shader Hot Reload
//!
//! [`ShaderWatcher`] watches WGSL files on disk and tells the caller when
//! one has changed, so the matching pipeline can be rebuilt without
//! restarting.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ ShaderWatcher                                        │
//! │                                                      │
//! │  watcher ──► background thread (notify crate)        │
//! │       │                                              │
//! │       ▼ mpsc channel                                 │
//! │  rx ─────► poll() drains events each frame           │
//! │                                                      │
//! │  pending ── debounce buffer (path → mode, timestamp) │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Debounce
//!
//! Editors often save in several steps (truncate, write, rename), which
//! shows up as a burst of events for one file. Each event refreshes the
//! file's timestamp; a reload only fires once the file has been quiet for
//! 100 ms.
//!
//! ## Failure
//!
//! If the watcher cannot be created (for example the inotify limit is
//! reached), hot reload is disabled with a warning and everything else keeps
//! working. A shader that fails to compile leaves the old pipeline in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::instance::SpriteDrawMode;
use crate::render::{GpuContext, SpriteRenderer};

/// Events within this window of each other collapse into one reload.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Watches shader sources and reports files ready to reload.
pub struct ShaderWatcher {
    /// `None` if the watcher failed to start.
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
    watched: HashMap<PathBuf, SpriteDrawMode>,
    pending: HashMap<PathBuf, (SpriteDrawMode, Instant)>,
    rx_disconnected: bool,
}

impl ShaderWatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        });

        let watcher = match watcher {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Shader hot reload disabled.");
                None
            }
        };

        Self {
            watcher,
            rx,
            watched: HashMap::new(),
            pending: HashMap::new(),
            rx_disconnected: false,
        }
    }

    /// Watch the crate's own shader sources, when they exist on disk.
    pub fn with_builtin_shaders() -> Self {
        let mut this = Self::new();
        for mode in [SpriteDrawMode::Depth, SpriteDrawMode::Plain] {
            if let Some(path) = mode.shader_path() {
                this.watch(path, mode);
            }
        }
        this
    }

    /// Watch `path` as the shader source for `mode`.
    pub fn watch(&mut self, path: impl Into<PathBuf>, mode: SpriteDrawMode) {
        let path = path.into();

        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot watch '{}': {e}", path.display());
                return;
            }
        };

        if let Some(watcher) = &mut self.watcher {
            if let Err(e) = watcher.watch(&canonical, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch '{}': {e}", canonical.display());
                return;
            }
        }

        log::debug!("Watching {} shader '{}'", mode.label(), canonical.display());
        self.watched.insert(canonical, mode);
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        path.canonicalize()
            .map(|p| self.watched.contains_key(&p))
            .unwrap_or(false)
    }

    /// Drain filesystem events and return the shaders that are ready to
    /// reload.
    pub fn poll(&mut self) -> Vec<(PathBuf, SpriteDrawMode)> {
        self.drain_events();
        self.drain_ready(Instant::now())
    }

    /// Poll, then rebuild every ready pipeline in `renderer`. Returns the
    /// number of pipelines rebuilt.
    pub fn apply(&mut self, gpu: &GpuContext, renderer: &mut SpriteRenderer) -> usize {
        let mut rebuilt = 0;
        for (path, mode) in self.poll() {
            let source = match std::fs::read_to_string(&path) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("Hot reload failed for shader '{}': {e}", path.display());
                    continue;
                }
            };
            if renderer.reload_shader(gpu, mode, &source).is_ok() {
                log::info!("Hot-reloaded shader: {}", path.display());
                rebuilt += 1;
            }
        }
        rebuilt
    }

    fn drain_events(&mut self) {
        if self.rx_disconnected {
            return;
        }

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    use notify::EventKind;
                    // Atomic saves show up as create.
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        let now = Instant::now();
                        for path in &event.paths {
                            self.note_change(path, now);
                        }
                    }
                }
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Shader hot reload disabled.");
                    self.rx_disconnected = true;
                    break;
                }
            }
        }
    }

    fn note_change(&mut self, path: &Path, at: Instant) {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(mode) = self.watched.get(&canonical) {
            self.pending.insert(canonical, (*mode, at));
        }
    }

    fn drain_ready(&mut self, now: Instant) -> Vec<(PathBuf, SpriteDrawMode)> {
        let mut ready = Vec::new();
        self.pending.retain(|path, (mode, at)| {
            if now.duration_since(*at) >= DEBOUNCE_DURATION {
                ready.push((path.clone(), *mode));
                false
            } else {
                true
            }
        });
        ready
    }
}

impl Default for ShaderWatcher {
    fn default() -> Self {
        Self::new()
    }
}
