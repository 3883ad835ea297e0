//! The interaction engine.
//!
//! [`Engine`] owns the canvas, the undo history and the single live
//! interaction. UI chrome drives it through the narrow command API below (or
//! through [`Engine::handle_event`]) and reads state back; nothing else
//! mutates the canvas.
//!
//! Commands never fail. Input that does not fit the current state is
//! dropped with a debug log, since out-of-order pointer events are a normal
//! part of a UI event stream.

use crate::canvas::Canvas;
use crate::config::EngineConfig;
use crate::history::{History, Snapshot};
use crate::import::{ImportError, decode_image};
use crate::input::InputEvent;
use crate::selection::{HandleKind, Manipulation, Selection, apply_manipulation, hit_test_handles};
use crate::shapes::{SerializableColor, Shape, ShapeStyle, Text};
use crate::storage::StorageResult;
use crate::sync::{Notice, SyncOutcome};
use crate::tools::{ToolKind, create_draft};
use kurbo::{Point, Vec2};

/// What the engine is doing right now. Exactly one interaction is live.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// Waiting for input, possibly with a shape selected.
    Idle { selected: Option<Selection> },
    /// A shape is being dragged out. The draft is not on the canvas yet.
    Drawing { draft: Shape, last: Point },
    /// A text shape on the canvas is being edited.
    TextEditing { target: Selection, buffer: String },
    /// A selected shape is being moved or resized.
    Transforming {
        manipulation: Manipulation,
        /// Canvas state when the drag began.
        before: Snapshot,
    },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle { selected: None }
    }
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle { .. } => "idle",
            Interaction::Drawing { .. } => "drawing",
            Interaction::TextEditing { .. } => "text-editing",
            Interaction::Transforming { .. } => "transforming",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle { .. })
    }
}

/// The shape-editing engine.
#[derive(Debug, Clone)]
pub struct Engine {
    canvas: Canvas,
    history: History,
    interaction: Interaction,
    tool: ToolKind,
    style: ShapeStyle,
    config: EngineConfig,
    /// Canvas state last known to match the store.
    saved: Snapshot,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let canvas = Canvas::new();
        let saved = canvas.snapshot();
        Self {
            canvas,
            history: History::new(),
            interaction: Interaction::default(),
            tool: ToolKind::default(),
            style: config.default_style(),
            config,
            saved,
        }
    }

    // --- Read access ---

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Committed shapes, back to front.
    pub fn shapes(&self) -> &[Shape] {
        self.canvas.shapes()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Style applied to the next shape.
    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared read-only view of the canvas for renderers and exporters.
    pub fn snapshot(&self) -> Snapshot {
        self.canvas.snapshot()
    }

    /// The shape under construction, if any.
    pub fn draft(&self) -> Option<&Shape> {
        match &self.interaction {
            Interaction::Drawing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Everything to paint: committed shapes, then the draft on top.
    pub fn visible_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.canvas.shapes().iter().chain(self.draft())
    }

    /// The selected shape, if the selection still points at it.
    pub fn selection(&self) -> Option<Selection> {
        let selection = match &self.interaction {
            Interaction::Idle { selected } => *selected,
            Interaction::Transforming { manipulation, .. } => Some(manipulation.selection),
            _ => None,
        }?;
        selection
            .is_valid_for(self.canvas.shapes())
            .then_some(selection)
    }

    /// Index and current buffer of the text being edited.
    pub fn editing_text(&self) -> Option<(usize, &str)> {
        match &self.interaction {
            Interaction::TextEditing { target, buffer } => Some((target.index, buffer.as_str())),
            _ => None,
        }
    }

    /// Whether the canvas changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        !self.canvas.is_same(&self.saved)
    }

    /// Record `snapshot` as what the store holds.
    pub fn mark_saved(&mut self, snapshot: Snapshot) {
        self.saved = snapshot;
    }

    // --- Tool and style ---

    /// Switch tools, finishing whatever is in progress first.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.finish_interaction();
        if !tool.selects_shapes() {
            self.interaction = Interaction::Idle { selected: None };
        }
        if tool != self.tool {
            log::debug!("Tool {} -> {}", self.tool, tool);
        }
        self.tool = tool;
    }

    /// Set the color for new shapes. A selected shape is recolored too.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.style.color = color;
        self.restyle_selected(|style| ShapeStyle { color, ..style.clone() });
    }

    /// Set the stroke width for new shapes. A selected shape is restyled too.
    ///
    /// Widths that are not positive are ignored.
    pub fn set_stroke_width(&mut self, width: f64) {
        if width.is_nan() || width <= 0.0 {
            log::debug!("Ignoring stroke width {}", width);
            return;
        }
        self.style.stroke_width = width;
        self.restyle_selected(|style| ShapeStyle {
            stroke_width: width,
            ..style.clone()
        });
    }

    /// Restyle the selected shape and commit, unless the style is unchanged.
    ///
    /// The canvas is only touched once a change is known: a mutable borrow
    /// detaches it from the saved snapshot and would mark it dirty.
    fn restyle_selected(&mut self, restyle: impl FnOnce(&ShapeStyle) -> ShapeStyle) {
        if !self.interaction.is_idle() {
            return;
        }
        let Some(selection) = self.selection() else {
            return;
        };
        let Some(current) = self.canvas.get(selection.index).map(Shape::style) else {
            return;
        };
        let next = restyle(current);
        if next == *current {
            return;
        }
        if let Some(shape) = self.canvas.get_mut(selection.index) {
            *shape.style_mut() = next;
            self.commit();
        }
    }

    // --- Pointer strokes ---

    /// Pointer pressed.
    ///
    /// Drawing tools start a draft. Move and select pick a handle of the
    /// selected shape or the topmost shape under the pointer. A press while
    /// editing text closes the editor.
    pub fn begin_stroke(&mut self, position: Point) {
        let selected = match &self.interaction {
            Interaction::Idle { selected } => *selected,
            Interaction::TextEditing { .. } => {
                self.commit_text();
                return;
            }
            other => {
                log::debug!("Ignoring pointer down while {}", other.name());
                return;
            }
        };

        if self.tool.draws_shapes() {
            if let Some(draft) = create_draft(self.tool, position, &self.style) {
                log::debug!("Started {} draft at {:?}", draft.kind_name(), position);
                self.interaction = Interaction::Drawing {
                    draft,
                    last: position,
                };
            }
        } else if self.tool.selects_shapes() {
            self.start_manipulation(position, selected);
        }
    }

    fn start_manipulation(&mut self, position: Point, selected: Option<Selection>) {
        let shapes = self.canvas.shapes();

        let on_handle = selected
            .filter(|selection| selection.is_valid_for(shapes))
            .and_then(|selection| {
                let shape = &shapes[selection.index];
                hit_test_handles(shape, position, self.config.handle_tolerance)
                    .map(|handle| (selection, Some(handle)))
            });

        let target = on_handle.or_else(|| {
            self.canvas
                .shape_at(position, self.config.hit_tolerance)
                .map(|index| (Selection::new(index, shapes[index].id()), None))
        });

        match target {
            Some((selection, handle)) => {
                let original = shapes[selection.index].clone();
                self.interaction = Interaction::Transforming {
                    manipulation: Manipulation::new(selection, handle, position, original),
                    before: self.canvas.snapshot(),
                };
            }
            None => {
                self.interaction = Interaction::Idle { selected: None };
            }
        }
    }

    /// Pointer moved with the button held.
    pub fn extend_stroke(&mut self, position: Point) {
        let mut stale = false;
        match &mut self.interaction {
            Interaction::Drawing { draft, last } => {
                draft.update_draft(position);
                *last = position;
            }
            Interaction::Transforming { manipulation, .. } => {
                manipulation.current_point = position;
                if manipulation.selection.is_valid_for(self.canvas.shapes()) {
                    self.canvas
                        .replace(manipulation.selection.index, manipulation.preview());
                } else {
                    stale = true;
                }
            }
            other => log::debug!("Ignoring pointer move while {}", other.name()),
        }
        if stale {
            log::debug!("Transform target disappeared, dropping drag");
            self.abort_interaction();
        }
    }

    /// Pointer released. Finishes a draft or a transform.
    pub fn end_stroke(&mut self, position: Point) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Drawing { mut draft, last } => {
                if position != last {
                    draft.update_draft(position);
                }
                if draft.is_degenerate() {
                    log::debug!("Discarded degenerate {}", draft.kind_name());
                    return;
                }
                log::debug!("Finished {} draft", draft.kind_name());
                self.canvas.push(draft);
                self.commit();
                self.tool = ToolKind::Move;
            }
            Interaction::Transforming {
                mut manipulation,
                before,
            } => {
                manipulation.current_point = position;
                let selection = manipulation.selection;
                if !selection.is_valid_for(self.canvas.shapes()) {
                    self.canvas.restore(before);
                    return;
                }
                if manipulation.delta() == Vec2::ZERO {
                    self.canvas.restore(before);
                } else {
                    self.canvas.replace(selection.index, manipulation.preview());
                    self.commit();
                }
                self.interaction = Interaction::Idle {
                    selected: Some(selection),
                };
            }
            other => {
                log::debug!("Ignoring pointer up while {}", other.name());
                self.interaction = other;
            }
        }
    }

    // --- Text ---

    /// Double click. With the text tool this places a new text shape;
    /// on an existing text shape it reopens it for editing.
    pub fn double_click(&mut self, position: Point) {
        if !self.interaction.is_idle() {
            log::debug!("Ignoring double click while {}", self.interaction.name());
            return;
        }

        let existing = self
            .canvas
            .shape_at(position, self.config.hit_tolerance)
            .and_then(|index| match &self.canvas.shapes()[index] {
                Shape::Text(text) if self.tool == ToolKind::Text || self.tool.selects_shapes() => {
                    Some((Selection::new(index, text.id), text.content.clone()))
                }
                _ => None,
            });

        if let Some((target, buffer)) = existing {
            log::debug!("Editing text at index {}", target.index);
            self.interaction = Interaction::TextEditing { target, buffer };
            return;
        }

        if self.tool != ToolKind::Text {
            return;
        }

        let mut text = Text::new(position, self.config.text_placeholder.clone());
        text.style = self.style.clone();
        let id = text.id;
        let index = self.canvas.push(Shape::Text(text));
        log::debug!("Created text at {:?}", position);
        self.interaction = Interaction::TextEditing {
            target: Selection::new(index, id),
            buffer: self.config.text_placeholder.clone(),
        };
    }

    /// Replace the edited text with `content`. Nothing is committed yet.
    pub fn input_text(&mut self, content: &str) {
        let mut stale = false;
        match &mut self.interaction {
            Interaction::TextEditing { target, buffer } => {
                match self.canvas.get_mut(target.index) {
                    Some(Shape::Text(text)) if text.id == target.id => {
                        text.content = content.to_string();
                        *buffer = content.to_string();
                    }
                    _ => stale = true,
                }
            }
            other => log::debug!("Ignoring text input while {}", other.name()),
        }
        if stale {
            log::debug!("Edited text disappeared, leaving editor");
            self.interaction = Interaction::Idle { selected: None };
        }
    }

    /// Close the text editor.
    ///
    /// Text left empty or at the placeholder is removed. A history entry is
    /// recorded either way and the tool returns to move.
    pub fn commit_text(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::TextEditing { target, buffer } => self.finish_text(target, &buffer),
            other => {
                log::debug!("No text edit to commit while {}", other.name());
                self.interaction = other;
            }
        }
    }

    fn finish_text(&mut self, target: Selection, buffer: &str) {
        let blank = buffer.is_empty() || buffer == self.config.text_placeholder;
        if blank && target.is_valid_for(self.canvas.shapes()) {
            self.canvas.remove(target.index);
            log::debug!("Removed empty text");
        }
        self.commit();
        self.tool = ToolKind::Move;
        self.interaction = Interaction::Idle { selected: None };
    }

    // --- Selection ---

    /// Select the topmost shape at `position`. Returns its index.
    pub fn select_at(&mut self, position: Point) -> Option<usize> {
        self.finish_interaction();
        let selected = self
            .canvas
            .shape_at(position, self.config.hit_tolerance)
            .map(|index| Selection::new(index, self.canvas.shapes()[index].id()));
        self.interaction = Interaction::Idle { selected };
        selected.map(|selection| selection.index)
    }

    /// Select the shape at `index`. Returns false if there is none.
    pub fn select_index(&mut self, index: usize) -> bool {
        self.finish_interaction();
        let selected = self
            .canvas
            .get(index)
            .map(|shape| Selection::new(index, shape.id()));
        self.interaction = Interaction::Idle { selected };
        selected.is_some()
    }

    pub fn clear_selection(&mut self) {
        if let Interaction::Idle { selected } = &mut self.interaction {
            *selected = None;
        }
    }

    /// Move (`handle == None`) or resize the selected shape in one step.
    ///
    /// Returns true if a change was committed.
    pub fn transform_selected(&mut self, handle: Option<HandleKind>, delta: Vec2) -> bool {
        self.finish_interaction();
        let Some(selection) = self.selection() else {
            return false;
        };
        if delta == Vec2::ZERO {
            return false;
        }
        let updated = apply_manipulation(&self.canvas.shapes()[selection.index], handle, delta);
        self.canvas.replace(selection.index, updated);
        self.commit();
        true
    }

    /// Remove the selected shape.
    pub fn delete_selected(&mut self) -> Option<Shape> {
        self.finish_interaction();
        let selection = self.selection()?;
        let removed = self.canvas.remove(selection.index)?;
        self.interaction = Interaction::Idle { selected: None };
        self.commit();
        Some(removed)
    }

    // --- History ---

    /// Undo the last commit. Anything in progress is abandoned first.
    pub fn undo(&mut self) {
        self.abort_interaction();
        let snapshot = self.history.undo();
        log::debug!("Undo: {} entries left", self.history.len());
        self.canvas.restore(snapshot);
        self.interaction = Interaction::Idle { selected: None };
    }

    /// Escape. Drops a draft, reverts a drag, or closes the text editor.
    pub fn cancel(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Drawing { draft, .. } => {
                log::debug!("Cancelled {} draft", draft.kind_name());
            }
            Interaction::Transforming {
                manipulation,
                before,
            } => {
                self.canvas.restore(before);
                self.interaction = Interaction::Idle {
                    selected: Some(manipulation.selection),
                };
            }
            Interaction::TextEditing { target, buffer } => self.finish_text(target, &buffer),
            Interaction::Idle { .. } => {}
        }
    }

    fn commit(&mut self) {
        self.history.commit(self.canvas.snapshot());
        log::info!(
            "Committed history entry {} ({} shapes)",
            self.history.len(),
            self.canvas.len()
        );
    }

    /// Bring the engine to idle the way a user would expect: text is kept,
    /// drafts are dropped and drags are reverted.
    fn finish_interaction(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::TextEditing { target, buffer } => {
                let tool = self.tool;
                self.finish_text(target, &buffer);
                self.tool = tool;
            }
            Interaction::Idle { selected } => {
                self.interaction = Interaction::Idle { selected };
            }
            other => {
                self.interaction = other;
                self.cancel();
            }
        }
    }

    /// Drop whatever is in progress and return the canvas to the last commit.
    fn abort_interaction(&mut self) {
        if !self.interaction.is_idle() {
            log::debug!("Aborting {}", self.interaction.name());
            self.canvas.restore(self.history.latest());
            self.interaction = Interaction::Idle { selected: None };
        }
    }

    // --- Import and persistence ---

    /// Decode an image file and place it at the configured origin.
    ///
    /// Returns the index of the new shape. On error the canvas is unchanged.
    pub fn insert_image(&mut self, bytes: &[u8]) -> Result<usize, ImportError> {
        let image = decode_image(bytes, self.config.image_origin)?;
        self.finish_interaction();
        let index = self.canvas.push(Shape::Image(image));
        self.commit();
        Ok(index)
    }

    /// Replace the whole canvas with loaded shapes and start a fresh history
    /// whose floor is the loaded state.
    pub fn replace_all(&mut self, shapes: Vec<Shape>) {
        self.interaction = Interaction::Idle { selected: None };
        self.canvas = Canvas::from_shapes(shapes);
        self.history.reset(self.canvas.snapshot());
        self.saved = self.canvas.snapshot();
        log::info!("Loaded {} shapes", self.canvas.len());
    }

    /// Apply a raw load result.
    pub fn apply_load(&mut self, project_id: &str, result: StorageResult<Vec<Shape>>) -> Option<Notice> {
        self.apply_sync(SyncOutcome::from_load(project_id, result))
    }

    /// Apply the outcome of a load or save. Failures leave the canvas alone.
    pub fn apply_sync(&mut self, outcome: SyncOutcome) -> Option<Notice> {
        match outcome {
            SyncOutcome::Loaded(shapes) => {
                self.replace_all(shapes);
                None
            }
            SyncOutcome::Saved(snapshot) => {
                self.mark_saved(snapshot);
                None
            }
            SyncOutcome::Failed(notice) => Some(notice),
        }
    }

    // --- Events ---

    /// Route one input event to its command.
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { position } => self.begin_stroke(position),
            InputEvent::PointerMove { position } => self.extend_stroke(position),
            InputEvent::PointerUp { position } => self.end_stroke(position),
            InputEvent::DoubleClick { position } => self.double_click(position),
            InputEvent::TextInput { content } => self.input_text(&content),
            InputEvent::TextBlur => self.commit_text(),
            InputEvent::Cancel => self.cancel(),
            InputEvent::Undo => self.undo(),
        }
    }
}
