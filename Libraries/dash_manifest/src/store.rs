//! The currently published manifest.
//!
//! Readers take an `Arc<Manifest>` snapshot and keep it for as long as they like. A
//! refresh builds a complete new manifest off to the side and swaps the pointer; the
//! lock is only held for that swap or for cloning the `Arc`.

use crate::error::Result;
use crate::mpd::parser::DashParser;
use crate::mpd::{Manifest, Representation, RepresentationId};
use crate::segment::getters::{refresh_representation, SegmentRequest};
use crate::segment::Segment;
use crate::timeline::TimelineConverter;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ManifestStore {
    current: RwLock<Option<Arc<Manifest>>>,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer cannot leave a half-swapped pointer behind.
    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Arc<Manifest>>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Arc<Manifest>>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Option<Arc<Manifest>> {
        self.read_slot().clone()
    }

    /// Publishes `manifest` and returns the snapshot it replaced.
    pub fn publish(&self, manifest: Manifest) -> Option<Arc<Manifest>> {
        let manifest = Arc::new(manifest);
        debug!("Publishing manifest with {} representations", manifest.representations.len());
        self.write_slot().replace(manifest)
    }

    /// Parses `text` and publishes the result. On error the published manifest stays
    /// as it was.
    pub fn refresh(&self, parser: &DashParser, text: &str) -> Result<Arc<Manifest>> {
        let manifest = match parser.parse(text) {
            Ok(manifest) => Arc::new(manifest),
            Err(e) => {
                warn!("Manifest refresh failed, keeping the current one: {}", e);
                return Err(e);
            }
        };
        *self.write_slot() = Some(manifest.clone());
        Ok(manifest)
    }

    /// Publishes a copy of the current manifest in which `id` carries `segments`.
    /// Returns `false` when nothing is published or the id is unknown.
    pub fn replace_segments(&self, id: RepresentationId, segments: Vec<Segment>) -> bool {
        self.update_representation(id, |rep| rep.with_segments(segments))
    }

    /// Recomputes the availability window and segments of `id` against the current
    /// snapshot and publishes the result.
    pub fn rebuild_segments(&self, converter: &dyn TimelineConverter, id: RepresentationId, request: &SegmentRequest) -> bool {
        let Some(current) = self.snapshot() else {
            return false;
        };
        let Some(representation) = current.representation_ref(id) else {
            return false;
        };
        let updated = refresh_representation(converter, current.is_dynamic(), representation, request);
        self.swap_representation(&current, id, updated)
    }

    /// Swaps one representation of the current snapshot for `update(old)`.
    pub fn update_representation(&self, id: RepresentationId, update: impl FnOnce(&Representation) -> Representation) -> bool {
        let Some(current) = self.snapshot() else {
            return false;
        };
        let Some(old) = current.representation(id) else {
            return false;
        };
        let updated = update(old);
        self.swap_representation(&current, id, updated)
    }

    /// Publishes `base` with `id` replaced, unless another manifest was published since
    /// `base` was taken.
    fn swap_representation(&self, base: &Arc<Manifest>, id: RepresentationId, replacement: Representation) -> bool {
        let mut next = Manifest::clone(base);
        if !next.set_representation(id, replacement) {
            return false;
        }
        let mut slot = self.write_slot();
        match slot.as_ref() {
            Some(published) if Arc::ptr_eq(published, base) => {
                *slot = Some(Arc::new(next));
                true
            }
            _ => {
                debug!("Manifest changed while representation {:?} was rebuilt, dropping the update", id);
                false
            }
        }
    }
}
