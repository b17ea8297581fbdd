//! GTK4 [`Host`] and the interactive demo window.
//!
//! # Widget tree
//!
//! ```text
//! window
//! └ .dragrid-page                (padding box)
//!     └ .drag-container          (GtkFixed, positioning parent)
//!         ├ .drag-item           (GtkBox)
//!         │   └ .label           (GtkLabel)
//!         ├ …
//!         └ .drag-item.placeholder
//! ```
//!
//! `GtkFixed` has no z-index, so stacking is emulated by reordering the
//! container's children: later siblings paint over (and are picked before)
//! earlier ones.  Transitions are driven from the demo's 16 ms tick, the
//! same way the engine's [`Tween`]s are evaluated in the in-memory host.
//!
//! # CSS selectors
//!
//! | Selector                | Targets                                 |
//! |-------------------------|-----------------------------------------|
//! | `.drag-container`       | The grid                                |
//! | `.drag-container.shaking` | The grid while the mouse is shaking   |
//! | `.drag-item`            | Every tile                              |
//! | `.drag-item.placeholder`| The drop target outline                 |

use crate::config::Config;
use crate::controller::{DragController, EngineEvent};
use crate::easing::{Transition, Tween};
use crate::event::{Point, PointerEvent, PointerKind};
use crate::layout::{Rect, Size};
use crate::shake::ShakeDetector;
use crate::traits::Host;
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

//  Default CSS

const DEFAULT_CSS: &str = r#"
.dragrid-page {
    padding: 24px;
}

.drag-item {
    background-color: rgba(255, 255, 255, 0.10);
    border-radius: 12px;
}

.drag-item .label {
    font-weight: bold;
}

.drag-item.placeholder {
    background-color: transparent;
    border: 2px dashed rgba(255, 255, 255, 0.35);
}

.drag-container.shaking .drag-item {
    background-color: rgba(255, 120, 120, 0.25);
}
"#;

/// Handle to a widget registered with a [`GtkHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetHandle(usize);

/// Errors produced by the GTK host.
#[derive(Debug, thiserror::Error)]
pub enum GtkHostError {
    #[error("failed to initialise GTK: {0}")]
    Init(String),
    #[error("unknown widget {0}")]
    UnknownWidget(usize),
    #[error("widget {0} is not inside a container")]
    NotInContainer(usize),
}

struct Node {
    widget: gtk4::Widget,
    parent: Option<usize>,
    rect: Option<Rect>,
    /// Box currently on screen; differs from `rect` mid-transition.
    drawn: Rect,
    z_index: i32,
    transition: Option<Transition>,
    tween: Option<(Tween, Instant)>,
}

/// A [`Host`] backed by real GTK widgets.
pub struct GtkHost {
    /// Widget whose coordinate space pointer events arrive in.
    root: gtk4::Widget,
    nodes: Vec<Node>,
    listening: Rc<RefCell<HashSet<PointerKind>>>,
}

impl GtkHost {
    pub fn new(root: &impl IsA<gtk4::Widget>) -> Self {
        Self {
            root: root.clone().upcast(),
            nodes: Vec::new(),
            listening: Rc::default(),
        }
    }

    /// Register `fixed` as a container.
    pub fn add_container(&mut self, fixed: &gtk4::Fixed) -> WidgetHandle {
        self.push(fixed.clone().upcast(), None)
    }

    /// Create a tile showing `label` inside `container`.
    pub fn add_tile(
        &mut self,
        container: WidgetHandle,
        item_class: &str,
        label: &str,
    ) -> Result<WidgetHandle, GtkHostError> {
        let fixed = self.fixed(container.0)?;
        let tile = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        tile.add_css_class(item_class);
        let text = gtk4::Label::new(Some(label));
        text.add_css_class("label");
        text.set_vexpand(true);
        tile.append(&text);
        fixed.put(&tile, 0.0, 0.0);
        Ok(self.push(tile.upcast(), Some(container.0)))
    }

    /// Shared set of attached listener kinds.  Input controllers check it
    /// before forwarding events.
    pub fn listening(&self) -> Rc<RefCell<HashSet<PointerKind>>> {
        Rc::clone(&self.listening)
    }

    pub fn widget(&self, handle: WidgetHandle) -> Option<&gtk4::Widget> {
        self.nodes.get(handle.0).map(|n| &n.widget)
    }

    /// Advance running transitions.  Returns `true` while any is running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut running = false;
        for i in 0..self.nodes.len() {
            let Some((tween, start)) = self.nodes[i].tween else {
                continue;
            };
            let elapsed = now.saturating_duration_since(start);
            let rect = tween.at(elapsed);
            if tween.is_done(elapsed) {
                self.nodes[i].tween = None;
            } else {
                running = true;
            }
            self.draw(i, rect);
        }
        running
    }

    fn push(&mut self, widget: gtk4::Widget, parent: Option<usize>) -> WidgetHandle {
        self.nodes.push(Node {
            widget,
            parent,
            rect: None,
            drawn: Rect::default(),
            z_index: 0,
            transition: None,
            tween: None,
        });
        WidgetHandle(self.nodes.len() - 1)
    }

    fn node(&self, index: usize) -> Result<&Node, GtkHostError> {
        self.nodes.get(index).ok_or(GtkHostError::UnknownWidget(index))
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut Node, GtkHostError> {
        self.nodes
            .get_mut(index)
            .ok_or(GtkHostError::UnknownWidget(index))
    }

    fn fixed(&self, index: usize) -> Result<gtk4::Fixed, GtkHostError> {
        self.node(index)?
            .widget
            .clone()
            .downcast::<gtk4::Fixed>()
            .map_err(|_| GtkHostError::NotInContainer(index))
    }

    fn index_of(&self, widget: &gtk4::Widget) -> Option<usize> {
        self.nodes.iter().position(|n| &n.widget == widget)
    }

    /// Put node `index` at `rect` on screen.
    fn draw(&mut self, index: usize, rect: Rect) {
        let node = &mut self.nodes[index];
        node.drawn = rect;
        node.widget
            .set_size_request(rect.width.round() as i32, rect.height.round() as i32);
        let Some(parent) = node.parent else {
            return;
        };
        if let Some(fixed) = self.nodes[parent].widget.downcast_ref::<gtk4::Fixed>() {
            fixed.move_(&self.nodes[index].widget, rect.x, rect.y);
        }
    }

    /// Reorder the children of `parent` by z-index, keeping insertion order
    /// among equals.
    fn restack(&self, parent: usize) {
        let mut children: Vec<(i32, usize)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent == Some(parent))
            .map(|(i, n)| (n.z_index, i))
            .collect();
        children.sort();
        let parent_widget = &self.nodes[parent].widget;
        for (_, i) in children {
            self.nodes[i]
                .widget
                .insert_before(parent_widget, None::<&gtk4::Widget>);
        }
    }
}

impl Host for GtkHost {
    type Handle = WidgetHandle;
    type Error = GtkHostError;

    fn query(&self, class: &str) -> Result<Option<WidgetHandle>, GtkHostError> {
        Ok(self
            .nodes
            .iter()
            .position(|n| n.widget.has_css_class(class))
            .map(WidgetHandle))
    }

    fn query_all(&self, class: &str) -> Result<Vec<WidgetHandle>, GtkHostError> {
        Ok(self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.widget.has_css_class(class))
            .map(|(i, _)| WidgetHandle(i))
            .collect())
    }

    fn element_at(&self, point: Point) -> Result<Option<WidgetHandle>, GtkHostError> {
        let mut current = self.root.pick(point.x, point.y, gtk4::PickFlags::DEFAULT);
        while let Some(widget) = current {
            if let Some(i) = self.index_of(&widget) {
                return Ok(Some(WidgetHandle(i)));
            }
            current = widget.parent();
        }
        Ok(None)
    }

    fn closest(
        &self,
        element: &WidgetHandle,
        class: &str,
    ) -> Result<Option<WidgetHandle>, GtkHostError> {
        let mut current = Some(element.0);
        while let Some(i) = current {
            let node = self.node(i)?;
            if node.widget.has_css_class(class) {
                return Ok(Some(WidgetHandle(i)));
            }
            current = node.parent;
        }
        Ok(None)
    }

    fn prepare_container(&mut self, container: &WidgetHandle) -> Result<(), GtkHostError> {
        self.fixed(container.0)?.set_overflow(gtk4::Overflow::Visible);
        Ok(())
    }

    fn prepare_tile(&mut self, tile: &WidgetHandle, size: Size) -> Result<(), GtkHostError> {
        let node = self.node_mut(tile.0)?;
        if node.parent.is_none() {
            return Err(GtkHostError::NotInContainer(tile.0));
        }
        let (x, y) = node.rect.map_or((0.0, 0.0), |r| (r.x, r.y));
        let rect = Rect::new(x, y, size.width, size.height);
        node.rect = Some(rect);
        node.tween = None;
        self.draw(tile.0, rect);
        Ok(())
    }

    fn create_placeholder(
        &mut self,
        container: &WidgetHandle,
        template: &WidgetHandle,
    ) -> Result<WidgetHandle, GtkHostError> {
        let fixed = self.fixed(container.0)?;
        let source = self.node(template.0)?;
        let rect = source.rect;
        let placeholder = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
        for class in source.widget.css_classes() {
            placeholder.add_css_class(class.as_str());
        }
        placeholder.add_css_class("placeholder");
        placeholder.set_can_target(false);
        fixed.put(&placeholder, 0.0, 0.0);

        let handle = self.push(placeholder.upcast(), Some(container.0));
        if let Some(rect) = rect {
            self.nodes[handle.0].rect = Some(rect);
            self.draw(handle.0, rect);
        }
        Ok(handle)
    }

    fn apply_box(&mut self, element: &WidgetHandle, rect: Rect) -> Result<(), GtkHostError> {
        let node = self.node_mut(element.0)?;
        node.rect = Some(rect);
        match node.transition {
            Some(transition) if node.drawn != rect => {
                node.tween = Some((
                    Tween {
                        from: node.drawn,
                        to: rect,
                        transition,
                    },
                    Instant::now(),
                ));
            }
            _ => {
                node.tween = None;
                self.draw(element.0, rect);
            }
        }
        Ok(())
    }

    fn set_z_index(&mut self, element: &WidgetHandle, z: i32) -> Result<(), GtkHostError> {
        let node = self.node_mut(element.0)?;
        if node.z_index == z {
            return Ok(());
        }
        node.z_index = z;
        if let Some(parent) = node.parent {
            self.restack(parent);
        }
        Ok(())
    }

    fn set_transition(
        &mut self,
        element: &WidgetHandle,
        transition: Option<Transition>,
    ) -> Result<(), GtkHostError> {
        let node = self.node_mut(element.0)?;
        node.transition = transition;
        if let Some(t) = transition {
            debug!("widget {} transition: {}", element.0, t.to_css());
        }
        Ok(())
    }

    fn set_listener(&mut self, kind: PointerKind, enabled: bool) -> Result<(), GtkHostError> {
        let mut listening = self.listening.borrow_mut();
        if enabled {
            listening.insert(kind);
        } else {
            listening.remove(&kind);
        }
        Ok(())
    }
}

//  Pointer input

/// Forward pointer input on `window` into `tx`, gated by `listening`.
fn attach_pointer_input(
    window: &gtk4::Window,
    listening: Rc<RefCell<HashSet<PointerKind>>>,
    tx: mpsc::Sender<PointerEvent>,
) {
    let forward = move |event: PointerEvent| {
        if listening.borrow().contains(&event.kind()) {
            let _ = tx.send(event);
        }
    };
    let forward = Rc::new(forward);

    let click = gtk4::GestureClick::new();
    click.set_button(gdk::BUTTON_PRIMARY);
    {
        let forward = Rc::clone(&forward);
        click.connect_pressed(move |_, _, x, y| forward(PointerEvent::Down(Point::new(x, y))));
    }
    {
        let forward = Rc::clone(&forward);
        click.connect_released(move |_, _, x, y| forward(PointerEvent::Up(Point::new(x, y))));
    }
    {
        let forward = Rc::clone(&forward);
        click.connect_cancel(move |_, _| forward(PointerEvent::Cancel));
    }
    window.add_controller(click);

    let motion = gtk4::EventControllerMotion::new();
    motion.connect_motion(move |_, x, y| forward(PointerEvent::Move(Point::new(x, y))));
    window.add_controller(motion);
}

//  Public API

/// Open the demo window and run the GLib main loop on the current thread
/// until the window is closed.
pub fn run_demo(config: Config, css_path: Option<PathBuf>) -> Result<(), GtkHostError> {
    gtk4::init().map_err(|e| GtkHostError::Init(e.to_string()))?;
    info!("GTK4 initialised on main thread");

    load_css(&css_path);

    let window = gtk4::Window::new();
    window.set_title(Some("dragrid"));
    let opts = &config.grid;
    let cols = opts.columns_per_row.max(1).min(config.demo.tiles.len().max(1));
    let rows = config.demo.tiles.len().div_ceil(opts.columns_per_row.max(1)).max(1);
    window.set_default_size(
        (cols as f64 * (opts.tile_size.width + opts.gap) + 48.0) as i32,
        (rows as f64 * (opts.tile_size.height + opts.gap) + 48.0) as i32,
    );

    let page = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    page.add_css_class("dragrid-page");
    let fixed = gtk4::Fixed::new();
    fixed.add_css_class(&opts.container_selector);
    fixed.set_vexpand(true);
    page.append(&fixed);
    window.set_child(Some(&page));

    let mut host = GtkHost::new(&window);
    let container = host.add_container(&fixed);
    for label in &config.demo.tiles {
        host.add_tile(container, &opts.item_selector, label)?;
    }

    let (ptr_tx, ptr_rx) = mpsc::channel::<PointerEvent>();
    attach_pointer_input(&window, host.listening(), ptr_tx);

    let mut engine = DragController::new(host, config.grid.clone());
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
    engine.set_event_sink(event_tx);
    engine
        .initialize()
        .map_err(|e| GtkHostError::Init(e.to_string()))?;

    let mut shake = ShakeDetector::new(config.shake.clone());
    let main_loop = glib::MainLoop::new(None, false);
    {
        let main_loop = main_loop.clone();
        window.connect_close_request(move |_| {
            main_loop.quit();
            glib::Propagation::Proceed
        });
    }
    window.present();

    //  Main event loop (~60 fps)
    glib::timeout_add_local(Duration::from_millis(16), move || {
        let now = Instant::now();

        // 1. Drain pointer input.
        while let Ok(event) = ptr_rx.try_recv() {
            let was_shaking = shake.is_shaking();
            let shaking = shake.handle(&event, now);
            if shaking != was_shaking {
                if shaking {
                    fixed.add_css_class("shaking");
                } else {
                    fixed.remove_css_class("shaking");
                }
            }
            if let Err(e) = engine.handle(event) {
                error!("pointer event error: {}", e);
            }
        }

        // 2. Drain engine notifications.
        while let Ok(event) = event_rx.try_recv() {
            if let EngineEvent::Reordered { order } = &event {
                debug!("order: {:?}", order);
            }
        }

        // 3. Advance transitions.
        engine.host_mut().tick(now);

        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");
    Ok(())
}

//  CSS loading

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}, using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => DEFAULT_CSS.to_string(),
    };

    #[allow(deprecated)]
    provider.load_from_data(&css);

    match gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => warn!("no GDK display, CSS will not be applied"),
    }
}
