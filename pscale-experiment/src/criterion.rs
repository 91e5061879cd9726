use pscale_core::Transducer;

/// Position of the draggable criterion line, in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriterionTracker {
    y_px: f64,
}

impl CriterionTracker {
    pub fn new(initial_y_px: f64) -> Self {
        Self { y_px: initial_y_px }
    }

    pub fn position(&self) -> f64 {
        self.y_px
    }

    pub fn move_to(&mut self, y_px: f64) {
        self.y_px = y_px;
    }

    /// Whether a pointer at `y_px` is on the line.
    pub fn hit(&self, y_px: f64, tolerance_px: f64) -> bool {
        (y_px - self.y_px).abs() <= tolerance_px
    }

    /// The line position mapped onto the stimulus scale. The position is
    /// already local and is read back as a whole pixel.
    pub fn value(&self, transducer: &Transducer, height_px: f64) -> f64 {
        transducer.intensity(self.y_px.trunc(), height_px)
    }
}
