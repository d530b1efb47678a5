//! The creation tool: drag out a new figure from a template.

use super::{Tool, ToolContext, ToolKind, ToolOutcome, ToolState};
use crate::handle::discard_provisional;
use crate::input::InputEvent;
use hd_core::{AttributeKey, AttributeValue, Figure, FigureId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Size of a figure created by a click without a drag.
pub const DEFAULT_SIZE: Vec2 = Vec2::new(40.0, 40.0);

/// The kinds of figure the creation tool can make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FigureTemplate {
    Rectangle,
    Ellipse,
    Line,
    Text { text: String },
}

impl FigureTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            FigureTemplate::Rectangle => "Rectangle",
            FigureTemplate::Ellipse => "Ellipse",
            FigureTemplate::Line => "Line",
            FigureTemplate::Text { .. } => "Text",
        }
    }

    /// A fresh figure spanning `anchor` to `lead`. Text is placed at
    /// `anchor` and sized by its content.
    pub fn instantiate(&self, anchor: Point, lead: Point) -> Figure {
        match self {
            FigureTemplate::Rectangle => Figure::rectangle(Rect::from_points(anchor, lead)),
            FigureTemplate::Ellipse => Figure::ellipse(Rect::from_points(anchor, lead)),
            FigureTemplate::Line => Figure::line(anchor, lead),
            FigureTemplate::Text { text } => Figure::text(anchor, text.clone()),
        }
    }
}

/// The figure being dragged out.
struct Creation {
    provisional: FigureId,
    anchor: Point,
}

pub struct CreationTool {
    template: FigureTemplate,
    /// Applied to every created figure as part of the creation step.
    attributes: Vec<(AttributeKey, AttributeValue)>,
    /// Stay active after creating instead of handing back to selection.
    sticky: bool,
    state: ToolState,
    creation: Option<Creation>,
}

impl CreationTool {
    pub fn new(template: FigureTemplate) -> Self {
        Self {
            template,
            attributes: Vec::new(),
            sticky: false,
            state: ToolState::Inactive,
            creation: None,
        }
    }

    pub fn with_attribute(mut self, key: AttributeKey, value: AttributeValue) -> Self {
        self.attributes.push((key, value));
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    pub fn template(&self) -> &FigureTemplate {
        &self.template
    }

    fn update(&self, ctx: &mut ToolContext<'_>, creation: &Creation, lead: Point) {
        let next = self.template.instantiate(creation.anchor, lead);
        ctx.drawing.update_figure(creation.provisional, &mut |f| {
            f.restore_geometry(&next.geometry());
        });
    }

    /// Swap the provisional figure for the real one inside one composite.
    fn commit(
        &self,
        ctx: &mut ToolContext<'_>,
        creation: Creation,
        lead: Point,
    ) -> Option<FigureId> {
        discard_provisional(ctx.drawing, creation.provisional)?;
        let mut lead = lead;
        if (lead - creation.anchor).hypot() < ctx.view.tolerance() {
            lead = creation.anchor + DEFAULT_SIZE;
        }
        let figure = self.template.instantiate(creation.anchor, lead);
        let label = format!("Create {}", self.template.name());
        let attributes = &self.attributes;
        let id = ctx.undo.scoped(ctx.drawing, label, |d| {
            let id = d.add(figure);
            for (key, value) in attributes {
                d.set_attribute(id, *key, Some(value.clone()));
            }
            id
        });
        log::debug!("created {} {id}", self.template.name());
        Some(id)
    }
}

impl Tool for CreationTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Create {
            template: self.template.clone(),
            attributes: self.attributes.clone(),
            sticky: self.sticky,
        }
    }

    fn state(&self) -> ToolState {
        self.state
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.view.clear_selection();
        self.state = ToolState::Active;
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.cancel(ctx);
        self.state = ToolState::Inactive;
    }

    fn handle(&mut self, event: &InputEvent, ctx: &mut ToolContext<'_>) -> ToolOutcome {
        match event {
            InputEvent::PointerDown { point, .. } => {
                self.cancel(ctx);
                let anchor = ctx.to_drawing_constrained(*point);
                let figure = self.template.instantiate(anchor, anchor);
                let provisional = ctx.drawing.basic_add(figure);
                ctx.drawing.update_figure(provisional, &mut |_| {});
                self.creation = Some(Creation {
                    provisional,
                    anchor,
                });
                self.state = ToolState::Tracking;
                ToolOutcome::Handled
            }
            InputEvent::PointerMove { point, .. } => {
                let Some(creation) = &self.creation else {
                    return ToolOutcome::Ignored;
                };
                let lead = ctx.to_drawing_constrained(*point);
                self.update(ctx, creation, lead);
                ToolOutcome::Handled
            }
            InputEvent::PointerUp { point, .. } => {
                let Some(creation) = self.creation.take() else {
                    return ToolOutcome::Ignored;
                };
                let lead = ctx.to_drawing_constrained(*point);
                self.state = ToolState::Active;
                match self.commit(ctx, creation, lead) {
                    Some(id) => {
                        ctx.view.select(id);
                        if self.sticky {
                            ToolOutcome::Handled
                        } else {
                            ToolOutcome::Done
                        }
                    }
                    None => ToolOutcome::Handled,
                }
            }
            InputEvent::Key { .. } => ToolOutcome::Ignored,
        }
    }

    fn cancel(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(creation) = self.creation.take() {
            discard_provisional(ctx.drawing, creation.provisional);
            self.state = ToolState::Active;
        }
    }
}
