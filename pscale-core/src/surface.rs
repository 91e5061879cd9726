/// Drawable size in pixels as reported by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Grab,
    Grabbing,
}

/// Visual changes requested from the rendering surface.
///
/// All coordinates are local to the drawable, origin top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceCommand {
    PlaceDot { x: f64, y: f64 },
    MoveCriterion { y: f64 },
    ShowResponseBox { x: f64, y: f64 },
    HideResponseBox,
    SetCursor(Cursor),
}
