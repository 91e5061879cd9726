use anyhow::{Result, anyhow};
use pscale_core::{Cursor, Response, SessionPhase, SurfaceCommand};
use tiny_skia::{
    Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

const DOT_RADIUS: f32 = 5.0;
const CRITERION_WIDTH: f32 = 5.0;

/// Everything the participant currently sees, in window pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub dots: Vec<(f32, f32)>,
    pub criterion_y: f32,
    pub response_box: Option<(f32, f32)>,
    pub hover: Option<Response>,
    pub cursor: Cursor,
    /// Half under the press that can still complete an answer.
    pressed: Option<Response>,
}

impl Scene {
    pub fn new(width: f32, height: f32, criterion_y: f32) -> Self {
        Self {
            width,
            height,
            dots: Vec::new(),
            criterion_y,
            response_box: None,
            hover: None,
            cursor: Cursor::Default,
            pressed: None,
        }
    }

    /// Clears the trial marks for a fresh task.
    pub fn reset(&mut self, criterion_y: f32) {
        self.dots.clear();
        self.criterion_y = criterion_y;
        self.response_box = None;
        self.hover = None;
        self.pressed = None;
        self.cursor = Cursor::Default;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn apply(&mut self, command: SurfaceCommand) {
        match command {
            SurfaceCommand::PlaceDot { x, y } => self.dots.push((x as f32, y as f32)),
            SurfaceCommand::MoveCriterion { y } => self.criterion_y = y as f32,
            SurfaceCommand::ShowResponseBox { x, y } => {
                self.response_box = Some((x as f32, y as f32));
                self.pressed = None;
            }
            SurfaceCommand::HideResponseBox => {
                self.response_box = None;
                self.hover = None;
                self.pressed = None;
            }
            SurfaceCommand::SetCursor(cursor) => self.cursor = cursor,
        }
    }

    /// Response box bounds: a tenth of the window each way, centred on the
    /// click that opened it.
    pub fn response_rect(&self) -> Option<Rect> {
        let (cx, cy) = self.response_box?;
        let (w, h) = (self.width / 10.0, self.height / 10.0);
        Rect::from_xywh(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    /// Left half answers No, right half answers Yes.
    pub fn response_at(&self, x: f32, y: f32) -> Option<Response> {
        let rect = self.response_rect()?;
        let inside =
            x >= rect.left() && x <= rect.right() && y >= rect.top() && y <= rect.bottom();
        if !inside {
            return None;
        }
        let mid = rect.left() + rect.width() / 2.0;
        Some(if x < mid { Response::No } else { Response::Yes })
    }

    /// Updates the highlighted answer. Returns `true` when it changed.
    pub fn hover_at(&mut self, x: f32, y: f32) -> bool {
        let hover = self.response_at(x, y);
        let changed = hover != self.hover;
        self.hover = hover;
        changed
    }

    /// Records a press on the open response box.
    pub fn press_response(&mut self, x: f32, y: f32) {
        self.pressed = self.response_at(x, y);
    }

    /// Completes an answer when the release lands on the half that was
    /// pressed. A release without a matching press on the open box is ignored.
    pub fn release_response(&mut self, x: f32, y: f32) -> Option<Response> {
        let pressed = self.pressed.take()?;
        (self.response_at(x, y) == Some(pressed)).then_some(pressed)
    }
}

/// Draws a [`Scene`] into an offscreen pixmap and copies it to the frame.
pub struct SceneRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        Ok(Self {
            width,
            height,
            canvas,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn render_frame(
        &mut self,
        phase: SessionPhase,
        scene: &Scene,
        progress: Option<(usize, usize)>,
        frame_buffer: &mut [u8],
    ) {
        self.canvas.fill(Color::WHITE);

        match phase {
            SessionPhase::Practice | SessionPhase::Experiment => {
                self.draw_pitch_arrow();
                self.draw_criterion(scene.criterion_y);
                for &(x, y) in &scene.dots {
                    self.draw_dot(x, y);
                }
                if let Some(rect) = scene.response_rect() {
                    self.draw_response_box(rect, scene.hover);
                }
            }
            SessionPhase::Welcome | SessionPhase::Intermission => self.draw_continue_prompt(),
            SessionPhase::Goodbye => {}
        }

        if let Some((current, total)) = progress {
            self.draw_progress(current, total);
        }

        let data = self.canvas.data();
        if frame_buffer.len() == data.len() {
            frame_buffer.copy_from_slice(data);
        } else {
            tracing::warn!(
                frame = frame_buffer.len(),
                canvas = data.len(),
                "frame size mismatch, skipping copy"
            );
        }
    }

    fn paint(r: u8, g: u8, b: u8, a: u8) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(r, g, b, a));
        paint.anti_alias = true;
        paint
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, paint: &Paint) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                ..Stroke::default()
            };
            self.canvas
                .stroke_path(&path, paint, &stroke, Transform::identity(), None);
        }
    }

    /// Faint upward arrow marking the direction of increasing pitch.
    fn draw_pitch_arrow(&mut self) {
        let paint = Self::paint(0, 0, 0, 50);
        let x = self.width as f32 / 2.0;
        let bottom = self.height as f32 * 0.87;
        let top = self.height as f32 * 0.13;
        let head = (self.width.min(self.height) as f32 / 20.0).max(8.0);

        self.stroke_line((x, bottom), (x, top + head), head / 3.0, &paint);

        let mut pb = PathBuilder::new();
        pb.move_to(x, top);
        pb.line_to(x - head, top + head * 1.5);
        pb.line_to(x + head, top + head * 1.5);
        pb.close();
        if let Some(path) = pb.finish() {
            self.canvas.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn draw_criterion(&mut self, y: f32) {
        let paint = Self::paint(220, 20, 60, 255);
        if let Some(rect) = Rect::from_xywh(
            0.0,
            y - CRITERION_WIDTH / 2.0,
            self.width as f32,
            CRITERION_WIDTH,
        ) {
            self.canvas
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn draw_dot(&mut self, x: f32, y: f32) {
        let paint = Self::paint(0, 0, 0, 255);
        let mut pb = PathBuilder::new();
        pb.push_circle(x, y, DOT_RADIUS);
        if let Some(path) = pb.finish() {
            self.canvas.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    /// White box with a cross on the left (No) and a tick on the right (Yes).
    fn draw_response_box(&mut self, rect: Rect, hover: Option<Response>) {
        let fill = Self::paint(255, 255, 255, 255);
        self.canvas
            .fill_rect(rect, &fill, Transform::identity(), None);

        let border = Self::paint(0, 0, 0, 255);
        let path = PathBuilder::from_rect(rect);
        self.canvas.stroke_path(
            &path,
            &border,
            &Stroke::default(),
            Transform::identity(),
            None,
        );

        let mark = (rect.width() / 4.0).min(rect.height() / 2.0) * 0.6;
        let cy = rect.top() + rect.height() / 2.0;
        let width = (mark / 4.0).max(2.0);
        let colour = |r: Response| {
            if hover == Some(r) {
                Self::paint(255, 0, 0, 255)
            } else {
                Self::paint(0, 0, 0, 255)
            }
        };

        let no_x = rect.left() + rect.width() / 4.0;
        let no = colour(Response::No);
        self.stroke_line((no_x - mark, cy - mark), (no_x + mark, cy + mark), width, &no);
        self.stroke_line((no_x - mark, cy + mark), (no_x + mark, cy - mark), width, &no);

        let yes_x = rect.left() + rect.width() * 3.0 / 4.0;
        let yes = colour(Response::Yes);
        self.stroke_line(
            (yes_x - mark, cy),
            (yes_x - mark / 3.0, cy + mark * 0.7),
            width,
            &yes,
        );
        self.stroke_line(
            (yes_x - mark / 3.0, cy + mark * 0.7),
            (yes_x + mark, cy - mark),
            width,
            &yes,
        );
    }

    /// Play symbol shown on screens that wait for the space bar.
    fn draw_continue_prompt(&mut self) {
        let paint = Self::paint(90, 90, 90, 255);
        let size = self.width.min(self.height) as f32 / 12.0;
        let (cx, cy) = (self.width as f32 / 2.0, self.height as f32 / 2.0);
        let mut pb = PathBuilder::new();
        pb.move_to(cx + size, cy);
        pb.line_to(cx - size * 0.6, cy - size);
        pb.line_to(cx - size * 0.6, cy + size);
        pb.close();
        if let Some(path) = pb.finish() {
            self.canvas.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    /// One square per task in the top-right corner, filled up to `current`.
    fn draw_progress(&mut self, current: usize, total: usize) {
        let size = 12.0;
        let gap = 6.0;
        let right = self.width as f32 - 20.0;
        let done = Self::paint(60, 60, 60, 255);
        let todo = Self::paint(200, 200, 200, 255);
        for i in 0..total {
            let x = right - (total - i) as f32 * (size + gap);
            let paint = if i < current { &done } else { &todo };
            if let Some(rect) = Rect::from_xywh(x, 20.0, size, size) {
                self.canvas
                    .fill_rect(rect, paint, Transform::identity(), None);
            }
        }
    }
}
