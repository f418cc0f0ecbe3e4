/// Configuration knobs for a [`Worker`](crate::worker::Worker).
///
/// Every field is read per frame, so a worker built from a tweaked config
/// behaves consistently for its whole lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    /// Number of features compiled between two yield points.
    pub batch_size: usize,
    /// Font used by features that do not name one with `params.fontUrl`.
    pub default_font_url: String,
    /// Band height as a multiple of the font size when flowing text in polygons.
    pub line_height_factor: f64,
    /// Font size used for text on lines when `params.fontsize` is missing or zero.
    pub line_font_size: f64,
    /// Lines and polygons whose screen extent is below this are not drawn.
    pub min_screen_extent: f64,
    pub texture: TextureConfig,
    pub fit: FitConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            default_font_url: "fonts/default".to_string(),
            line_height_factor: 1.2,
            line_font_size: 100.0,
            min_screen_extent: 1.0,
            texture: TextureConfig::default(),
            fit: FitConfig::default(),
        }
    }
}

/// Defaults used when a hatched feature leaves a parameter unset.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureConfig {
    /// Number of hatch lines across the feature height (`params.hn`).
    pub hatch_count: f64,
    /// Margin added around the squared viewport, as a share of its width.
    pub buffer_ratio: f64,
    pub default_stroke: String,
    pub default_line_width: f64,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            hatch_count: 24.0,
            buffer_ratio: 0.7,
            default_stroke: "#000".to_string(),
            default_line_width: 1.0,
        }
    }
}

/// Search bounds of the auto-fit solver.
#[derive(Clone, Debug, PartialEq)]
pub struct FitConfig {
    pub min_size: i64,
    pub max_size: i64,
    /// Larger values weaken the bias toward bigger font sizes.
    pub log_discount: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 1_000_000,
            log_discount: 100.0,
        }
    }
}
