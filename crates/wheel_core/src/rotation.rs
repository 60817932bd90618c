pub const DEFAULT_SPAN_DEG: f64 = 180.0;

/// Folds a raw angle into `(-180.0, 180.0]`; non-finite readings collapse to 0.
pub fn normalize_degrees(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let mut value = raw % 360.0;
    if value > 180.0 {
        value -= 360.0;
    } else if value <= -180.0 {
        value += 360.0;
    }
    value
}

pub fn format_readout(deg: f64) -> String {
    let rounded = (deg * 10.0).round() / 10.0;
    // Keep the IEEE negative zero from rendering as "-0.0°".
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.1}°")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    pub fn from_span(span_deg: f64) -> Self {
        let half = span_deg.max(0.0) / 2.0;
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[derive(Debug)]
pub struct RotationTracker {
    reference: Option<f64>,
    rotation: f64,
    bounds: Bounds,
    span_deg: f64,
}

impl RotationTracker {
    pub fn new(span_deg: f64) -> Self {
        let span_deg = if span_deg.is_finite() {
            span_deg.max(0.0)
        } else {
            DEFAULT_SPAN_DEG
        };
        Self {
            reference: None,
            rotation: 0.0,
            bounds: Bounds::from_span(span_deg),
            span_deg,
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn span_deg(&self) -> f64 {
        self.span_deg
    }

    pub fn observe(&mut self, raw_deg: f64) -> f64 {
        let angle = normalize_degrees(raw_deg);
        let reference = *self.reference.get_or_insert(angle);
        let delta = normalize_degrees(angle - reference);
        // Sign inverted: the displayed rotation opposes the physical turn.
        self.rotation = self.bounds.clamp(-delta);
        self.rotation
    }

    pub fn clear_reference(&mut self) {
        self.reference = None;
    }

    pub fn recenter(&mut self) {
        self.reference = None;
        self.rotation = 0.0;
    }

    pub fn set_span(&mut self, span_deg: f64) -> bool {
        if !span_deg.is_finite() {
            return false;
        }
        self.span_deg = span_deg.max(0.0);
        self.bounds = Bounds::from_span(self.span_deg);
        self.rotation = self.bounds.clamp(self.rotation);
        true
    }
}
