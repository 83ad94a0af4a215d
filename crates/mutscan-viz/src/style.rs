use bon::Builder;

/// Layout and colours for every plot. Passed to the renderer explicitly.
#[derive(Debug, Clone, Builder)]
pub struct PlotStyle {
    /// Side of one heatmap cell, and height of one boxplot row.
    #[builder(default = 24.0)]
    pub cell_size: f64,
    #[builder(default = 12.0)]
    pub font_size: f64,
    #[builder(default = 60.0)]
    pub margin: f64,
    /// Plot-area width of the boxplot and of the score density graph.
    #[builder(default = 640.0)]
    pub plot_width: f64,
    /// Plot-area height of the score density graph.
    #[builder(default = 320.0)]
    pub plot_height: f64,
    /// Histogram bins of the score density graph.
    #[builder(default = 40)]
    pub bins: usize,
    #[builder(default = String::from("sans-serif"))]
    pub font_family: String,
    #[builder(default = String::from("steelblue"))]
    pub bar_colour: String,
    #[builder(default = String::from("red"))]
    pub marker_colour: String,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Blue-white-red colour for `t` in `[0, 1]`.
pub fn bwr(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let (r, g, b) = if t < 0.5 {
        let s = t * 2.0;
        (s, s, 1.0)
    } else {
        let s = (1.0 - t) * 2.0;
        (1.0, s, s)
    };
    let byte = |c: f64| (c * 255.0).round() as u8;
    format!("rgb({},{},{})", byte(r), byte(g), byte(b))
}
