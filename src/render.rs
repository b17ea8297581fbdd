//! One-way projection of the layout model onto a [`Host`].
//!
//! [`RenderSync`] owns the `TileId → handle` mapping so the geometric model
//! never touches visual elements.  It makes no decisions: whoever mutates
//! the model calls [`sync`](RenderSync::sync) afterwards, including once
//! right after initialization so tiles appear in place without a drag.

use crate::layout::{GridLayout, TileId};
use crate::resolver::Placeholder;
use crate::traits::Host;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct RenderSync<K> {
    handles: HashMap<TileId, K>,
    placeholder: Option<K>,
}

impl<K> Default for RenderSync<K> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
            placeholder: None,
        }
    }
}

impl<K: Clone + Eq + Hash + Debug> RenderSync<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind tile `id` to its visual element.
    pub fn register(&mut self, id: TileId, handle: K) {
        self.handles.insert(id, handle);
    }

    /// Bind the placeholder's visual element.
    pub fn set_placeholder(&mut self, handle: K) {
        self.placeholder = Some(handle);
    }

    pub fn handle(&self, id: TileId) -> Option<&K> {
        self.handles.get(&id)
    }

    pub fn placeholder_handle(&self) -> Option<&K> {
        self.placeholder.as_ref()
    }

    /// Reverse lookup: the tile drawn by `handle`.
    pub fn tile_for(&self, handle: &K) -> Option<TileId> {
        self.handles
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(id, _)| *id)
    }

    /// Number of registered tiles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Apply every tile's box to its element.
    pub fn sync_tiles<H>(&self, host: &mut H, layout: &GridLayout) -> Result<(), H::Error>
    where
        H: Host<Handle = K>,
    {
        for tile in layout.tiles() {
            if let Some(handle) = self.handles.get(&tile.id) {
                host.apply_box(handle, tile.rect())?;
            }
        }
        Ok(())
    }

    /// Apply the placeholder's box to its element.
    pub fn sync_placeholder<H>(&self, host: &mut H, placeholder: &Placeholder) -> Result<(), H::Error>
    where
        H: Host<Handle = K>,
    {
        if let Some(handle) = &self.placeholder {
            host.apply_box(handle, placeholder.rect())?;
        }
        Ok(())
    }

    /// Tiles first, then the placeholder.
    pub fn sync<H>(
        &self,
        host: &mut H,
        layout: &GridLayout,
        placeholder: &Placeholder,
    ) -> Result<(), H::Error>
    where
        H: Host<Handle = K>,
    {
        self.sync_tiles(host, layout)?;
        self.sync_placeholder(host, placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Transition;
    use crate::event::{Point, PointerKind};
    use crate::layout::{LayoutConfig, Rect, Size};

    #[derive(Debug, thiserror::Error)]
    #[error("recorder error")]
    struct RecorderErr;

    /// Records every `apply_box` call.
    #[derive(Default)]
    struct Recorder {
        boxes: Vec<(u32, Rect)>,
    }

    impl Host for Recorder {
        type Handle = u32;
        type Error = RecorderErr;

        fn query(&self, _: &str) -> Result<Option<u32>, RecorderErr> {
            Ok(None)
        }
        fn query_all(&self, _: &str) -> Result<Vec<u32>, RecorderErr> {
            Ok(Vec::new())
        }
        fn element_at(&self, _: Point) -> Result<Option<u32>, RecorderErr> {
            Ok(None)
        }
        fn closest(&self, _: &u32, _: &str) -> Result<Option<u32>, RecorderErr> {
            Ok(None)
        }
        fn prepare_container(&mut self, _: &u32) -> Result<(), RecorderErr> {
            Ok(())
        }
        fn prepare_tile(&mut self, _: &u32, _: Size) -> Result<(), RecorderErr> {
            Ok(())
        }
        fn create_placeholder(&mut self, _: &u32, _: &u32) -> Result<u32, RecorderErr> {
            Ok(0)
        }
        fn apply_box(&mut self, element: &u32, rect: Rect) -> Result<(), RecorderErr> {
            self.boxes.push((*element, rect));
            Ok(())
        }
        fn set_z_index(&mut self, _: &u32, _: i32) -> Result<(), RecorderErr> {
            Ok(())
        }
        fn set_transition(&mut self, _: &u32, _: Option<Transition>) -> Result<(), RecorderErr> {
            Ok(())
        }
        fn set_listener(&mut self, _: PointerKind, _: bool) -> Result<(), RecorderErr> {
            Ok(())
        }
    }

    fn layout(n: usize) -> GridLayout {
        GridLayout::new(
            n,
            LayoutConfig {
                tile_size: Size::new(50.0, 40.0),
                gap: 5.0,
                columns_per_row: 2,
                transition_duration_ms: 200,
            },
        )
    }

    #[test]
    fn sync_projects_every_registered_tile_and_placeholder() {
        let layout = layout(3);
        let mut sync = RenderSync::new();
        for (i, tile) in layout.tiles().iter().enumerate() {
            sync.register(tile.id, 10 + i as u32);
        }
        sync.set_placeholder(99);

        let mut host = Recorder::default();
        sync.sync(&mut host, &layout, &Placeholder::default()).unwrap();

        assert_eq!(
            host.boxes,
            vec![
                (10, Rect::new(0.0, 0.0, 50.0, 40.0)),
                (11, Rect::new(55.0, 0.0, 50.0, 40.0)),
                (12, Rect::new(0.0, 45.0, 50.0, 40.0)),
                (99, Rect::default()),
            ]
        );
    }

    #[test]
    fn unregistered_tiles_are_skipped() {
        let layout = layout(2);
        let mut sync = RenderSync::new();
        sync.register(layout.tiles()[1].id, 7);
        let mut host = Recorder::default();
        sync.sync_tiles(&mut host, &layout).unwrap();
        assert_eq!(host.boxes.len(), 1);
        assert_eq!(host.boxes[0].0, 7);
    }

    #[test]
    fn reverse_lookup() {
        let layout = layout(2);
        let mut sync = RenderSync::new();
        let id = layout.tiles()[0].id;
        sync.register(id, 4u32);
        assert_eq!(sync.tile_for(&4), Some(id));
        assert_eq!(sync.tile_for(&5), None);
        assert_eq!(sync.handle(id), Some(&4));
        assert_eq!(sync.len(), 1);
    }
}
