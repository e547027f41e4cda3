//! Result output
//!
//! The solver logs per-step surface data through the [`SurfaceWriter`]
//! capability; the crate ships a JSON implementation.

pub mod json;

pub use json::JsonSurfaceWriter;

use ndarray::Array1;
use std::io;
use std::path::Path;

use crate::core::geometry::Surface;

/// Writer for per-step surface dumps.
pub trait SurfaceWriter {
    /// File extension produced by this writer, including the leading dot.
    fn file_extension(&self) -> &str;

    /// Write a surface with named per-panel data views.
    ///
    /// `node_offset` and `panel_offset` are the cumulative counts of nodes
    /// and panels written before this surface in the same step, so that
    /// post-processing tools can reassemble a global numbering.
    fn write(
        &self,
        surface: &Surface,
        path: &Path,
        node_offset: usize,
        panel_offset: usize,
        view_names: &[String],
        view_data: &[Array1<f64>],
    ) -> io::Result<()>;
}
