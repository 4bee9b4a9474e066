//! Scale engine: per-dimension mapping from values to view positions
//!
//! Scales are pure and carry no selection state. Every view builds its own
//! scales from the shared dimension domains, so "value X is brushed" means the
//! same thing in every view.

use ahash::AHashMap;

use lv_data::{Dimension, Domain, Record, RecordSet, Value};

/// Number of ticks linear domains are rounded for
const NICE_TICK_COUNT: usize = 10;

/// Padding of categorical point scales, in steps
const POINT_PADDING: f32 = 0.5;

/// Output interval of a scale in view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub start: f32,
    pub end: f32,
}

impl ScaleRange {
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Left to right
    pub fn horizontal(length: f32) -> Self {
        Self::new(0.0, length)
    }

    /// Bottom to top: low values land at `length`
    pub fn vertical(length: f32) -> Self {
        Self::new(length, 0.0)
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }
}

/// Continuous scale over a niced domain
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: ScaleRange,
}

impl LinearScale {
    /// Build from raw `[min, max]`. Zero-width domains are padded before
    /// rounding so the mapping never divides by zero.
    pub fn new(min: f64, max: f64, range: ScaleRange) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let (lo, hi) = if lo == hi {
            if lo == 0.0 {
                (-1.0, 1.0)
            } else {
                let pad = lo.abs() / 10.0;
                (lo - pad, hi + pad)
            }
        } else {
            (lo, hi)
        };
        Self {
            domain: nice(lo, hi, NICE_TICK_COUNT),
            range,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> ScaleRange {
        self.range
    }

    pub fn map(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let t = (value - d0) / (d1 - d0);
        self.range.start + (t as f32) * self.range.span()
    }

    /// Value at a view position
    pub fn invert(&self, position: f32) -> f64 {
        let (d0, d1) = self.domain;
        let span = self.range.span();
        if span == 0.0 {
            return d0;
        }
        let t = ((position - self.range.start) / span) as f64;
        d0 + t * (d1 - d0)
    }

    /// Round tick values inside the domain
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        if count == 0 {
            return Vec::new();
        }
        let (d0, d1) = self.domain;
        let inc = tick_increment(d0, d1, count as f64);
        if !inc.is_finite() || inc == 0.0 {
            return Vec::new();
        }
        if inc > 0.0 {
            let i0 = (d0 / inc).ceil() as i64;
            let i1 = (d1 / inc).floor() as i64;
            (i0..=i1).map(|i| i as f64 * inc).collect()
        } else {
            let inv = -inc;
            let i0 = (d0 * inv).ceil() as i64;
            let i1 = (d1 * inv).floor() as i64;
            (i0..=i1).map(|i| i as f64 / inv).collect()
        }
    }
}

/// Evenly spaced points for an ordered set of labels
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale {
    domain: Vec<String>,
    range: ScaleRange,
    step: f32,
    offset: f32,
}

impl PointScale {
    /// `padding` is the outer gap at each end, in steps
    pub fn new(domain: Vec<String>, range: ScaleRange, padding: f32) -> Self {
        let n = domain.len() as f32;
        let span = range.span();
        let step = span / (n - 1.0 + 2.0 * padding).max(1.0);
        let offset = (span - step * (n - 1.0).max(0.0)) * 0.5;
        Self {
            domain,
            range,
            step,
            offset,
        }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn position_at(&self, index: usize) -> f32 {
        self.range.start + self.offset + self.step * index as f32
    }

    pub fn map(&self, label: &str) -> Option<f32> {
        self.domain
            .iter()
            .position(|d| d == label)
            .map(|idx| self.position_at(idx))
    }
}

/// Scale for one dimension in one view
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Linear(LinearScale),
    Point(PointScale),
}

impl Scale {
    /// Position of a value, `None` when the value kind does not match the
    /// scale or the category is not in the domain
    pub fn map_value(&self, value: &Value) -> Option<f32> {
        match (self, value) {
            (Scale::Linear(s), Value::Numeric(v)) => Some(s.map(*v)),
            (Scale::Point(s), Value::Category(c)) => s.map(c),
            _ => None,
        }
    }

    pub fn range(&self) -> ScaleRange {
        match self {
            Scale::Linear(s) => s.range,
            Scale::Point(s) => s.range,
        }
    }
}

/// Build the scale of `dimension` over `range`
pub fn build_scale(dimension: &Dimension, range: ScaleRange) -> Scale {
    match &dimension.domain {
        Domain::Continuous { min, max } => Scale::Linear(LinearScale::new(*min, *max, range)),
        Domain::Categorical(values) => Scale::Point(PointScale::new(values.clone(), range, POINT_PADDING)),
    }
}

/// A view's scales, keyed by dimension name
#[derive(Debug, Clone, Default)]
pub struct ScaleSet {
    scales: AHashMap<String, (usize, Scale)>,
}

impl ScaleSet {
    /// Build one scale per `(dimension, range)`. Unknown names are skipped.
    pub fn build<'a>(records: &RecordSet, axes: impl IntoIterator<Item = (&'a str, ScaleRange)>) -> Self {
        let mut scales = AHashMap::new();
        for (name, range) in axes {
            match records.dimension(name) {
                Some(dimension) => {
                    scales.insert(name.to_string(), (dimension.index, build_scale(dimension, range)));
                }
                None => tracing::warn!("No dimension '{}' to build a scale for", name),
            }
        }
        Self { scales }
    }

    pub fn get(&self, dimension: &str) -> Option<&Scale> {
        self.scales.get(dimension).map(|(_, scale)| scale)
    }

    /// Position of a record on one dimension
    pub fn position(&self, dimension: &str, record: &Record) -> Option<f32> {
        let (index, scale) = self.scales.get(dimension)?;
        record.value(*index).and_then(|v| scale.map_value(v))
    }
}

/// Signed tick step: positive values are the step itself, negative values
/// are the reciprocal of the step (keeps fractional steps exact)
fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// Extend `[start, stop]` to round tick boundaries
fn nice(mut start: f64, mut stop: f64, count: usize) -> (f64, f64) {
    if !(stop > start) {
        return (start, stop);
    }
    let mut prestep = None;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count as f64);
        if prestep == Some(step) {
            break;
        }
        if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else if step < 0.0 {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        } else {
            break;
        }
        prestep = Some(step);
    }
    (start, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_data::DimensionKind;

    fn continuous(min: f64, max: f64) -> Dimension {
        Dimension {
            index: 0,
            name: "price".to_string(),
            kind: DimensionKind::Continuous,
            domain: Domain::Continuous { min, max },
        }
    }

    #[test]
    fn test_nice_rounds_outward() {
        assert_eq!(nice(100.0, 300.0, 10), (100.0, 300.0));
        assert_eq!(nice(1750000.0, 13300000.0, 10), (1000000.0, 14000000.0));
        assert_eq!(nice(1650.0, 16200.0, 10), (0.0, 18000.0));
        let (lo, hi) = nice(0.23, 0.87, 10);
        assert!((lo - 0.2).abs() < 1e-12 && (hi - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_scale_puts_low_values_at_bottom() {
        let scale = LinearScale::new(100.0, 300.0, ScaleRange::vertical(100.0));
        assert_eq!(scale.map(100.0), 100.0);
        assert_eq!(scale.map(300.0), 0.0);
        assert_eq!(scale.map(150.0), 75.0);
        assert!((scale.invert(25.0) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_domain_is_padded() {
        let scale = LinearScale::new(100.0, 100.0, ScaleRange::horizontal(200.0));
        assert_eq!(scale.domain(), (90.0, 110.0));
        assert_eq!(scale.map(100.0), 100.0);

        let zero = LinearScale::new(0.0, 0.0, ScaleRange::horizontal(10.0));
        assert_eq!(zero.domain(), (-1.0, 1.0));
        assert!(zero.map(0.0).is_finite());
    }

    #[test]
    fn test_point_scale_spacing() {
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scale = PointScale::new(labels, ScaleRange::horizontal(100.0), 0.5);
        let a = scale.map("a").unwrap();
        let c = scale.map("c").unwrap();
        assert!((a - 100.0 / 6.0).abs() < 1e-4);
        assert!((c - 500.0 / 6.0).abs() < 1e-4);
        assert_eq!(scale.map("b"), Some(50.0));
        assert_eq!(scale.map("d"), None);

        let single = PointScale::new(vec!["only".to_string()], ScaleRange::vertical(80.0), 0.5);
        assert_eq!(single.map("only"), Some(40.0));
    }

    #[test]
    fn test_build_scale_by_kind() {
        let scale = build_scale(&continuous(100.0, 300.0), ScaleRange::horizontal(100.0));
        assert_eq!(scale.map_value(&Value::Numeric(200.0)), Some(50.0));
        assert_eq!(scale.map_value(&Value::Category("x".to_string())), None);

        let dim = Dimension {
            index: 1,
            name: "furnishingstatus".to_string(),
            kind: DimensionKind::Categorical,
            domain: Domain::Categorical(vec!["furnished".to_string(), "unfurnished".to_string()]),
        };
        let scale = build_scale(&dim, ScaleRange::vertical(100.0));
        assert_eq!(scale.map_value(&Value::Category("furnished".to_string())), Some(75.0));
    }

    #[test]
    fn test_ticks_inside_domain() {
        let scale = LinearScale::new(0.0, 1.0, ScaleRange::horizontal(100.0));
        let ticks = scale.ticks(5);
        assert_eq!(ticks.len(), 6);
        assert!((ticks[1] - 0.2).abs() < 1e-12);
        assert!(scale.ticks(0).is_empty());
    }
}
