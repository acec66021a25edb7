use crate::summary::NeighbourhoodSummary;

/// Sequential ramp from low to high average rating.
const RAMP: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// Background of the hatch pattern used for regions without a rating.
pub const NO_DATA_FILL: &str = "#d9d9d9";

/// Id of the SVG pattern referenced by [`Fill::NoData`].
pub(crate) const NO_DATA_PATTERN_ID: &str = "no-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    Scaled(String),
    NoData,
}

impl Fill {
    pub fn css(&self) -> String {
        match self {
            Fill::Scaled(color) => color.clone(),
            Fill::NoData => format!("url(#{NO_DATA_PATTERN_ID})"),
        }
    }
}

/// Maps an average rating onto the ramp, scaled to the observed range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Full 0–5 rating range, used when no neighbourhood has a rating.
    pub const FULL_RANGE: ColorScale = ColorScale { min: 0.0, max: 5.0 };

    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_summaries(summaries: &[NeighbourhoodSummary]) -> Self {
        let mut ratings = summaries
            .iter()
            .filter_map(|summary| summary.average_rating)
            .filter(|rating| rating.is_finite());

        let Some(first) = ratings.next() else {
            return Self::FULL_RANGE;
        };
        let (min, max) = ratings.fold((first, first), |(min, max), rating| {
            (min.min(rating), max.max(rating))
        });
        Self::new(min, max)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn color_for(&self, value: f64) -> String {
        let span = self.max - self.min;
        let position = if span > f64::EPSILON {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.5
        };

        let segments = (RAMP.len() - 1) as f64;
        let scaled = position * segments;
        let index = (scaled.floor() as usize).min(RAMP.len() - 2);
        let fraction = scaled - index as f64;

        let (from, to) = (RAMP[index], RAMP[index + 1]);
        let channel = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * fraction).round() as u8
        };

        format!(
            "#{:02x}{:02x}{:02x}",
            channel(from.0, to.0),
            channel(from.1, to.1),
            channel(from.2, to.2)
        )
    }

    /// A missing rating never lands on the scale; it gets the no-data fill.
    pub fn fill_for(&self, rating: Option<f64>) -> Fill {
        match rating.filter(|rating| rating.is_finite()) {
            Some(rating) => Fill::Scaled(self.color_for(rating)),
            None => Fill::NoData,
        }
    }

    /// Evenly spaced `(value, colour)` pairs for a legend.
    pub fn legend_stops(&self, count: usize) -> Vec<(f64, String)> {
        let count = count.max(2);
        (0..count)
            .map(|step| {
                let value = self.min + (self.max - self.min) * step as f64 / (count - 1) as f64;
                (value, self.color_for(value))
            })
            .collect()
    }
}
