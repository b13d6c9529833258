//! Parameters for seam-aware decimation.

/// Seam-handling policy, from loosest to strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Strictness {
    /// Ignore UV structure entirely; collapse on 3D quadric error alone.
    IgnoreUv = 0,

    /// Allow seam-adjacent collapses but score UV distortion into the cost,
    /// so seam edges collapse last.
    PenalizeSeams = 1,

    /// Forbid any collapse that would merge distinct UV-chart instances or
    /// disturb the existing seam structure. Maximally conservative.
    #[default]
    PreserveSeams = 2,
}

impl Strictness {
    /// Map the conventional numeric level `0 | 1 | 2` to a policy.
    #[must_use]
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::IgnoreUv),
            1 => Some(Self::PenalizeSeams),
            2 => Some(Self::PreserveSeams),
            _ => None,
        }
    }
}

/// Parameters for mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateParams {
    /// Percent of the original vertex count to retain, in `1.0..=100.0`.
    /// Ignored when `target_vertices` is set. Default: 50.
    pub target_percent: f64,

    /// Absolute vertex-count target; takes precedence over
    /// `target_percent` when set.
    pub target_vertices: Option<usize>,

    /// Seam policy. Default: [`Strictness::PreserveSeams`].
    pub strictness: Strictness,

    /// Hard floor on the surviving vertex count. Never below 4 (a
    /// tetrahedron, the smallest closed manifold). Default: 4.
    pub min_vertices: usize,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_percent: 50.0,
            target_vertices: None,
            strictness: Strictness::default(),
            min_vertices: 4,
        }
    }
}

impl DecimateParams {
    /// Params targeting a percentage of the original vertex count.
    /// Values outside `1..=100` are clamped.
    #[must_use]
    pub fn with_target_percent(percent: f64) -> Self {
        Self {
            target_percent: percent.clamp(1.0, 100.0),
            ..Default::default()
        }
    }

    /// Params targeting an absolute vertex count.
    #[must_use]
    pub fn with_target_vertices(count: usize) -> Self {
        Self {
            target_vertices: Some(count),
            ..Default::default()
        }
    }

    /// Set the seam policy.
    #[must_use]
    pub const fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Set the hard vertex floor (raised to 4 when lower).
    #[must_use]
    pub fn with_min_vertices(mut self, min_vertices: usize) -> Self {
        self.min_vertices = min_vertices.max(4);
        self
    }

    /// Aggressive preset: keep 25%, no seam constraints.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            target_percent: 25.0,
            strictness: Strictness::IgnoreUv,
            ..Default::default()
        }
    }

    /// Conservative preset: keep 75%, full seam preservation.
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            target_percent: 75.0,
            strictness: Strictness::PreserveSeams,
            ..Default::default()
        }
    }

    /// The vertex count the driver should stop at for a mesh of
    /// `original` vertices.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn target_vertex_count(&self, original: usize) -> usize {
        let requested = self.target_vertices.unwrap_or_else(|| {
            let percent = self.target_percent.clamp(1.0, 100.0);
            ((original as f64) * percent / 100.0).ceil() as usize
        });
        requested.max(self.min_vertices).max(4)
    }
}
