/// A drawing operation as issued by the interpreter's graphics natives.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear {
        color: String,
    },
    FillColor {
        color: String,
    },
    StrokeColor {
        color: String,
    },
    LineWidth {
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: bool,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        fill: bool,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    },
    Font {
        font: String,
    },
    SaveState,
    RestoreState,
    Translate {
        x: f64,
        y: f64,
    },
    Rotate {
        angle: f64,
    },
    Scale {
        x: f64,
        y: f64,
    },
}

/// Abstract drawing surface. The interpreter issues primitives and never
/// reads pixel state back, so implementations are free to rasterize,
/// record, or discard.
pub trait DrawingSurface {
    fn clear(&mut self, color: &str);
    fn set_fill_color(&mut self, color: &str);
    fn set_stroke_color(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: bool);
    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, fill: bool);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    fn draw_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>);
    fn set_font(&mut self, font: &str);
    fn save_state(&mut self);
    fn restore_state(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, x: f64, y: f64);
}

/// Surface that records every operation in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl DrawingSurface for RecordingSurface {
    fn clear(&mut self, color: &str) {
        self.ops.push(DrawOp::Clear {
            color: color.to_string(),
        });
    }

    fn set_fill_color(&mut self, color: &str) {
        self.ops.push(DrawOp::FillColor {
            color: color.to_string(),
        });
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.ops.push(DrawOp::StrokeColor {
            color: color.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth { width });
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: bool) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    fn draw_circle(&mut self, x: f64, y: f64, radius: f64, fill: bool) {
        self.ops.push(DrawOp::Circle { x, y, radius, fill });
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            max_width,
        });
    }

    fn set_font(&mut self, font: &str) {
        self.ops.push(DrawOp::Font {
            font: font.to_string(),
        });
    }

    fn save_state(&mut self) {
        self.ops.push(DrawOp::SaveState);
    }

    fn restore_state(&mut self) {
        self.ops.push(DrawOp::RestoreState);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Translate { x, y });
    }

    fn rotate(&mut self, angle: f64) {
        self.ops.push(DrawOp::Rotate { angle });
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::Scale { x, y });
    }
}
