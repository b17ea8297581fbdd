//! In-memory [`Host`]: a tiny element tree with classes, boxes and
//! stacking, plus simulated transitions on a manually advanced clock.
//!
//! Used by the headless daemon, the replay tool and the tests.  Hit-testing
//! follows the browser rules the engine relies on:
//!
//! * a positioned element's box is relative to its parent's origin;
//! * an element without a box covers its parent's box (e.g. a label inside
//!   a tile);
//! * the topmost interactive element wins, by z-index then document order.

use crate::easing::{Transition, Tween};
use crate::event::{Point, PointerKind};
use crate::layout::{Rect, Size};
use crate::traits::Host;
use std::collections::HashSet;
use std::time::Duration;

/// Handle to an element of a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone, Default)]
struct Element {
    classes: Vec<String>,
    parent: Option<usize>,
    /// Client position of a positioning container.
    origin: Option<Point>,
    rect: Option<Rect>,
    z_index: Option<i32>,
    transition: Option<Transition>,
    tween: Option<(Tween, Duration)>,
    interactive: bool,
    positioned: bool,
    selectable: bool,
    transparent: bool,
}

impl Element {
    fn leaf(classes: &[&str], parent: Option<ElementId>) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent: parent.map(|p| p.0),
            interactive: true,
            selectable: true,
            ..Default::default()
        }
    }
}

/// Errors produced by the in-memory host.
#[derive(Debug, thiserror::Error)]
pub enum MemoryHostError {
    #[error("unknown element {0}")]
    UnknownElement(usize),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    elements: Vec<Element>,
    listeners: HashSet<PointerKind>,
    clock: Duration,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A container at `origin` holding `count` tiles, each with one inner
    /// label element.
    pub fn with_grid(container_class: &str, item_class: &str, count: usize, origin: Point) -> Self {
        let mut host = Self::new();
        let container = host.add_container(&[container_class], origin);
        for _ in 0..count {
            let tile = host.push(Element::leaf(&[item_class], Some(container)));
            host.push(Element::leaf(&["label"], Some(tile)));
        }
        host
    }

    /// Append a top-level positioning container.
    pub fn add_container(&mut self, classes: &[&str], origin: Point) -> ElementId {
        self.push(Element {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            origin: Some(origin),
            interactive: true,
            selectable: true,
            ..Default::default()
        })
    }

    /// Append an element under `parent` (or at the root).  `parent` must
    /// belong to this host.
    pub fn add_element(
        &mut self,
        parent: Option<ElementId>,
        classes: &[&str],
    ) -> Result<ElementId, MemoryHostError> {
        if let Some(p) = &parent {
            self.get(p)?;
        }
        Ok(self.push(Element::leaf(classes, parent)))
    }

    fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    fn get(&self, id: &ElementId) -> Result<&Element, MemoryHostError> {
        self.elements
            .get(id.0)
            .ok_or(MemoryHostError::UnknownElement(id.0))
    }

    fn get_mut(&mut self, id: &ElementId) -> Result<&mut Element, MemoryHostError> {
        self.elements
            .get_mut(id.0)
            .ok_or(MemoryHostError::UnknownElement(id.0))
    }

    //  Inspection

    /// Last box applied to `id`, relative to its container.
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.elements.get(id.0).and_then(|e| e.rect)
    }

    /// Where `id` is drawn `clock` time after its last move, taking its
    /// transition into account.
    pub fn rendered_rect(&self, id: ElementId) -> Option<Rect> {
        let el = self.elements.get(id.0)?;
        match el.tween {
            Some((tween, start)) => Some(tween.at(self.clock.saturating_sub(start))),
            None => el.rect,
        }
    }

    pub fn z_index(&self, id: ElementId) -> Option<i32> {
        self.elements.get(id.0).and_then(|e| e.z_index)
    }

    pub fn transition(&self, id: ElementId) -> Option<Transition> {
        self.elements.get(id.0).and_then(|e| e.transition)
    }

    pub fn classes(&self, id: ElementId) -> &[String] {
        self.elements
            .get(id.0)
            .map(|e| e.classes.as_slice())
            .unwrap_or(&[])
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.parent == Some(id.0))
            .map(|(i, _)| ElementId(i))
            .collect()
    }

    pub fn is_interactive(&self, id: ElementId) -> bool {
        self.elements.get(id.0).is_some_and(|e| e.interactive)
    }

    /// Whether `id` was prepared as a positioning container or tile.
    pub fn is_positioned(&self, id: ElementId) -> bool {
        self.elements.get(id.0).is_some_and(|e| e.positioned)
    }

    /// Whether text inside `id` can be selected.
    pub fn is_selectable(&self, id: ElementId) -> bool {
        self.elements.get(id.0).is_some_and(|e| e.selectable)
    }

    pub fn is_transparent(&self, id: ElementId) -> bool {
        self.elements.get(id.0).is_some_and(|e| e.transparent)
    }

    pub fn is_listening(&self, kind: PointerKind) -> bool {
        self.listeners.contains(&kind)
    }

    //  Clock

    /// Advance the simulated clock that drives transitions.
    pub fn advance(&mut self, dt: Duration) {
        self.clock += dt;
    }

    //  Geometry

    /// Client origin that `id`'s own box is relative to.
    fn parent_origin(&self, id: usize) -> Point {
        let Some(parent) = self.elements[id].parent else {
            return Point::default();
        };
        if let Some(origin) = self.elements[parent].origin {
            return origin;
        }
        self.client_rect(parent)
            .map(|r| Point::new(r.x, r.y))
            .unwrap_or_default()
    }

    fn client_rect(&self, id: usize) -> Option<Rect> {
        let el = &self.elements[id];
        match el.rect {
            Some(r) => {
                let o = self.parent_origin(id);
                Some(Rect::new(o.x + r.x, o.y + r.y, r.width, r.height))
            }
            None => el.parent.and_then(|p| self.client_rect(p)),
        }
    }

    fn effective_z(&self, id: usize) -> i32 {
        let el = &self.elements[id];
        match (el.z_index, el.parent) {
            (Some(z), _) => z,
            (None, Some(p)) => self.effective_z(p),
            (None, None) => 0,
        }
    }

    fn effectively_interactive(&self, id: usize) -> bool {
        let el = &self.elements[id];
        el.interactive && el.parent.map_or(true, |p| self.effectively_interactive(p))
    }
}

impl Host for MemoryHost {
    type Handle = ElementId;
    type Error = MemoryHostError;

    fn query(&self, class: &str) -> Result<Option<ElementId>, MemoryHostError> {
        Ok(self
            .elements
            .iter()
            .position(|e| e.classes.iter().any(|c| c == class))
            .map(ElementId))
    }

    fn query_all(&self, class: &str) -> Result<Vec<ElementId>, MemoryHostError> {
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.classes.iter().any(|c| c == class))
            .map(|(i, _)| ElementId(i))
            .collect())
    }

    fn element_at(&self, point: Point) -> Result<Option<ElementId>, MemoryHostError> {
        let mut best: Option<(i32, usize)> = None;
        for id in 0..self.elements.len() {
            if !self.effectively_interactive(id) {
                continue;
            }
            let Some(rect) = self.client_rect(id) else {
                continue;
            };
            if !rect.contains(point.x, point.y) {
                continue;
            }
            let z = self.effective_z(id);
            // Later elements paint over earlier ones at equal z.
            if best.map_or(true, |(bz, _)| z >= bz) {
                best = Some((z, id));
            }
        }
        Ok(best.map(|(_, id)| ElementId(id)))
    }

    fn closest(&self, element: &ElementId, class: &str) -> Result<Option<ElementId>, MemoryHostError> {
        let mut current = Some(element.0);
        while let Some(id) = current {
            let el = self.get(&ElementId(id))?;
            if el.classes.iter().any(|c| c == class) {
                return Ok(Some(ElementId(id)));
            }
            current = el.parent;
        }
        Ok(None)
    }

    fn prepare_container(&mut self, container: &ElementId) -> Result<(), MemoryHostError> {
        let el = self.get_mut(container)?;
        el.positioned = true;
        if el.origin.is_none() {
            el.origin = Some(Point::default());
        }
        Ok(())
    }

    fn prepare_tile(&mut self, tile: &ElementId, size: Size) -> Result<(), MemoryHostError> {
        let el = self.get_mut(tile)?;
        el.positioned = true;
        el.selectable = false;
        let (x, y) = el.rect.map_or((0.0, 0.0), |r| (r.x, r.y));
        el.rect = Some(Rect::new(x, y, size.width, size.height));
        Ok(())
    }

    fn create_placeholder(
        &mut self,
        container: &ElementId,
        template: &ElementId,
    ) -> Result<ElementId, MemoryHostError> {
        self.get(container)?;
        let source = self.get(template)?.clone();
        let mut classes = source.classes;
        classes.push("placeholder".into());
        Ok(self.push(Element {
            classes,
            parent: Some(container.0),
            rect: source.rect,
            positioned: true,
            selectable: false,
            interactive: false,
            transparent: true,
            ..Default::default()
        }))
    }

    fn apply_box(&mut self, element: &ElementId, rect: Rect) -> Result<(), MemoryHostError> {
        let clock = self.clock;
        let current = self.rendered_rect(*element);
        let el = self.get_mut(element)?;
        el.tween = match (el.transition, current) {
            (Some(transition), Some(from)) if from != rect => Some((
                Tween {
                    from,
                    to: rect,
                    transition,
                },
                clock,
            )),
            _ => None,
        };
        el.rect = Some(rect);
        Ok(())
    }

    fn set_z_index(&mut self, element: &ElementId, z: i32) -> Result<(), MemoryHostError> {
        self.get_mut(element)?.z_index = Some(z);
        Ok(())
    }

    fn set_transition(
        &mut self,
        element: &ElementId,
        transition: Option<Transition>,
    ) -> Result<(), MemoryHostError> {
        self.get_mut(element)?.transition = transition;
        Ok(())
    }

    fn set_listener(&mut self, kind: PointerKind, enabled: bool) -> Result<(), MemoryHostError> {
        if enabled {
            self.listeners.insert(kind);
        } else {
            self.listeners.remove(&kind);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> (MemoryHost, ElementId, ElementId, ElementId) {
        let mut host = MemoryHost::new();
        let container = host.add_container(&["grid"], Point::new(100.0, 50.0));
        let tile = host.add_element(Some(container), &["item"]).unwrap();
        let label = host.add_element(Some(tile), &["label"]).unwrap();
        (host, container, tile, label)
    }

    #[test]
    fn query_by_class() {
        let (host, container, tile, _) = host();
        assert_eq!(host.query("grid").unwrap(), Some(container));
        assert_eq!(host.query_all("item").unwrap(), vec![tile]);
        assert_eq!(host.query("missing").unwrap(), None);
    }

    #[test]
    fn hit_test_finds_inner_element_and_closest_tile() {
        let (mut host, _, tile, label) = host();
        host.apply_box(&tile, Rect::new(10.0, 10.0, 100.0, 100.0)).unwrap();
        // Client coordinates include the container origin.
        let hit = host.element_at(Point::new(150.0, 100.0)).unwrap();
        assert_eq!(hit, Some(label));
        assert_eq!(host.closest(&label, "item").unwrap(), Some(tile));
        assert_eq!(host.closest(&tile, "item").unwrap(), Some(tile));
        assert_eq!(host.closest(&label, "nope").unwrap(), None);
        assert_eq!(host.element_at(Point::new(105.0, 55.0)).unwrap(), None);
    }

    #[test]
    fn higher_z_index_wins_hit_test() {
        let mut host = MemoryHost::new();
        let c = host.add_container(&["grid"], Point::default());
        let a = host.add_element(Some(c), &["item"]).unwrap();
        let b = host.add_element(Some(c), &["item"]).unwrap();
        host.apply_box(&a, Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        host.apply_box(&b, Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(host.element_at(Point::new(10.0, 10.0)).unwrap(), Some(b));
        host.set_z_index(&a, 999).unwrap();
        assert_eq!(host.element_at(Point::new(10.0, 10.0)).unwrap(), Some(a));
    }

    #[test]
    fn placeholder_is_an_empty_inert_clone() {
        let (mut host, container, tile, _) = host();
        host.prepare_tile(&tile, Size::new(80.0, 80.0)).unwrap();
        let ph = host.create_placeholder(&container, &tile).unwrap();
        assert!(host.children(ph).is_empty());
        assert!(!host.is_interactive(ph));
        assert!(host.is_transparent(ph));
        assert!(host.classes(ph).iter().any(|c| c == "item"));
        assert_eq!(host.rect(ph).map(|r| r.width), Some(80.0));
        host.apply_box(&ph, Rect::new(0.0, 0.0, 80.0, 80.0)).unwrap();
        host.apply_box(&tile, Rect::new(0.0, 0.0, 80.0, 80.0)).unwrap();
        // Under the tile and inert anyway.
        assert_ne!(host.element_at(Point::new(110.0, 60.0)).unwrap(), Some(ph));
    }

    #[test]
    fn transitions_animate_on_the_simulated_clock() {
        let (mut host, _, tile, _) = host();
        host.apply_box(&tile, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        host.set_transition(
            &tile,
            Some(Transition {
                duration: Duration::from_millis(100),
                easing: crate::easing::Easing::Linear,
            }),
        )
        .unwrap();
        host.apply_box(&tile, Rect::new(100.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(host.rendered_rect(tile).unwrap().x, 0.0);
        host.advance(Duration::from_millis(50));
        assert_eq!(host.rendered_rect(tile).unwrap().x, 50.0);
        host.advance(Duration::from_millis(500));
        assert_eq!(host.rendered_rect(tile).unwrap().x, 100.0);
        assert_eq!(host.rect(tile).unwrap().x, 100.0);
    }

    #[test]
    fn moves_without_transition_are_immediate() {
        let (mut host, _, tile, _) = host();
        host.apply_box(&tile, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        host.apply_box(&tile, Rect::new(30.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(host.rendered_rect(tile).unwrap().x, 30.0);
    }

    #[test]
    fn listeners_toggle() {
        let mut host = MemoryHost::new();
        host.set_listener(PointerKind::Move, true).unwrap();
        assert!(host.is_listening(PointerKind::Move));
        host.set_listener(PointerKind::Move, false).unwrap();
        assert!(!host.is_listening(PointerKind::Move));
    }

    #[test]
    fn unknown_handles_error() {
        let mut host = MemoryHost::new();
        assert!(host.set_z_index(&ElementId(3), 1).is_err());
    }

    #[test]
    fn add_element_rejects_foreign_parent() {
        let mut host = MemoryHost::with_grid("grid", "item", 2, Point::default());
        let before = host.elements.len();
        let stray = ElementId(42);
        assert!(matches!(
            host.add_element(Some(stray), &["item"]),
            Err(MemoryHostError::UnknownElement(42))
        ));
        assert_eq!(host.elements.len(), before);
        assert_eq!(host.element_at(Point::new(10.0, 10.0)).unwrap(), None);
    }
}
