use crate::config::LevelMode;
use crate::error::RenderError;
use crate::matrix::Matrix;

/// Receives every completed matrix.
pub trait Renderer {
    /// Draws `matrix`. Called once per completed matrix and for the placeholder on clear.
    fn render(&mut self, matrix: &Matrix) -> Result<(), RenderError>;
}

impl<F> Renderer for F
where
    F: FnMut(&Matrix) -> Result<(), RenderError>,
{
    fn render(&mut self, matrix: &Matrix) -> Result<(), RenderError> {
        self(matrix)
    }
}

/// Shades from coldest to hottest.
const SHADES: &[u8] = b" .:-=+*#%@";

/// Renders a matrix as a block of shade characters.
///
/// The matrix is transposed first so that each received row becomes a column, x running down
/// the output.
#[derive(Debug, Clone, Default)]
pub struct TextHeatmap {
    levels: LevelMode,
    frame: String,
}

impl TextHeatmap {
    /// Heatmap scaling values according to `levels`.
    pub fn new(levels: LevelMode) -> Self {
        TextHeatmap {
            levels,
            frame: String::new(),
        }
    }

    /// The most recently rendered frame. Empty until the first successful render.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// How values are mapped onto shades.
    pub fn levels(&self) -> LevelMode {
        self.levels
    }

    /// Changes how values are mapped onto shades from the next render on.
    pub fn set_levels(&mut self, levels: LevelMode) {
        self.levels = levels;
    }

    fn shade(&self, value: i64, lo: f64, hi: f64) -> char {
        let top = SHADES.len() - 1;
        let scaled = if hi > lo {
            ((value as f64 - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        SHADES[(scaled * top as f64).round() as usize] as char
    }
}

impl Renderer for TextHeatmap {
    fn render(&mut self, matrix: &Matrix) -> Result<(), RenderError> {
        check_shape(matrix)?;

        let (lo, hi) = match self.levels {
            LevelMode::Static { min, max } => (min, max),
            LevelMode::Dynamic => match matrix.min_max() {
                Some((lo, hi)) => (lo as f64, hi as f64),
                None => return Err(RenderError::Empty),
            },
        };

        let mut frame = String::new();
        for column in matrix.transposed().rows() {
            for &value in column {
                let c = self.shade(value, lo, hi);
                frame.push(c);
                frame.push(c);
            }
            frame.push('\n');
        }
        self.frame = frame;
        Ok(())
    }
}

/// Accepts only non-empty matrices whose rows all have the same length.
fn check_shape(matrix: &Matrix) -> Result<(), RenderError> {
    let expected = matrix.width();
    if expected == 0 {
        return Err(RenderError::Empty);
    }
    match matrix
        .rows()
        .iter()
        .position(|r| r.len() != expected)
    {
        Some(row) => Err(RenderError::Ragged {
            row,
            expected,
            found: matrix.rows()[row].len(),
        }),
        None => Ok(()),
    }
}
