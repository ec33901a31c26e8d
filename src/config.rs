use std::fmt;
use std::str::FromStr;

use crate::error::TraceError;

/// All tracing parameters in one struct.
///
/// The progress callback is passed separately, see
/// [`crate::trace_with_progress`].
#[derive(Debug, Clone, PartialEq)]
pub struct TraceParams {
    // -- Contour stage --
    /// Paths enclosing an area of at most this many pixels are dropped.
    pub turd_size: u32,
    /// How ambiguous diagonal pixel configurations are resolved.
    pub turn_policy: TurnPolicy,

    // -- Smoothing --
    /// Corner threshold. Vertices whose alpha reaches this value become
    /// sharp corners; 0 makes every vertex a corner, values above 4/3
    /// make every vertex smooth.
    pub alpha_max: f64,

    // -- Curve optimization --
    /// Merge runs of smooth segments into longer Bezier segments.
    pub opti_curve: bool,
    /// Maximum deviation (in pixels) a merged segment may introduce.
    pub opt_tolerance: f64,

    // -- Output --
    /// When set, control point coordinates are floored to multiples of
    /// `1 / quantize_unit`.
    pub quantize_unit: Option<u32>,
    /// Minimum progress increase between two callback invocations.
    pub progress_epsilon: f64,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            turd_size: 2,
            turn_policy: TurnPolicy::Minority,
            alpha_max: 1.0,
            opti_curve: true,
            opt_tolerance: 0.2,
            quantize_unit: None,
            progress_epsilon: 0.0,
        }
    }
}

impl TraceParams {
    /// Check that every numeric parameter is usable.
    pub fn validate(&self) -> Result<(), TraceError> {
        check_non_negative("alpha_max", self.alpha_max)?;
        check_non_negative("opt_tolerance", self.opt_tolerance)?;
        check_non_negative("progress_epsilon", self.progress_epsilon)?;
        if self.quantize_unit == Some(0) {
            return Err(TraceError::InvalidParameter(
                "quantize_unit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), TraceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TraceError::InvalidParameter(format!(
            "{} must be a finite non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// How a grayscale image is split into black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMethod {
    /// Luma strictly below this value is black.
    Fixed(u8),
    /// Otsu's method picks the level; luma at or below it is black.
    #[default]
    Otsu,
}

/// Resolution rule for ambiguous turns during contour tracing.
///
/// An ambiguous configuration is a pixel corner where two diagonally
/// opposite pixels are black and the other two are white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnPolicy {
    /// Prefer to connect black components.
    Black,
    /// Prefer to connect white components.
    White,
    /// Always take a left turn.
    Left,
    /// Always take a right turn.
    Right,
    /// Prefer to connect the color that is locally less common.
    #[default]
    Minority,
    /// Prefer to connect the color that is locally more common.
    Majority,
    /// Choose pseudo-randomly, deterministically per coordinate.
    Random,
}

impl TurnPolicy {
    pub const ALL: [TurnPolicy; 7] = [
        TurnPolicy::Black,
        TurnPolicy::White,
        TurnPolicy::Left,
        TurnPolicy::Right,
        TurnPolicy::Minority,
        TurnPolicy::Majority,
        TurnPolicy::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TurnPolicy::Black => "black",
            TurnPolicy::White => "white",
            TurnPolicy::Left => "left",
            TurnPolicy::Right => "right",
            TurnPolicy::Minority => "minority",
            TurnPolicy::Majority => "majority",
            TurnPolicy::Random => "random",
        }
    }
}

impl fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TurnPolicy {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TurnPolicy::ALL
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| TraceError::UnknownTurnPolicy(s.to_string()))
    }
}
