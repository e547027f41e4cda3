//! JSON surface writer
//!
//! Serializes a surface and its per-panel data views into a single JSON
//! document per step, suitable for scripted post-processing.

use ndarray::Array1;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::core::geometry::Surface;
use crate::core::io::SurfaceWriter;

/// JSON implementation of [`SurfaceWriter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSurfaceWriter;

#[derive(Serialize)]
struct SurfaceRecord<'a> {
    node_offset: usize,
    panel_offset: usize,
    nodes: Vec<[f64; 3]>,
    panels: Vec<Vec<usize>>,
    views: Vec<ViewRecord<'a>>,
}

#[derive(Serialize)]
struct ViewRecord<'a> {
    name: &'a str,
    data: Vec<f64>,
}

impl SurfaceWriter for JsonSurfaceWriter {
    fn file_extension(&self) -> &str {
        ".json"
    }

    fn write(
        &self,
        surface: &Surface,
        path: &Path,
        node_offset: usize,
        panel_offset: usize,
        view_names: &[String],
        view_data: &[Array1<f64>],
    ) -> io::Result<()> {
        let record = SurfaceRecord {
            node_offset,
            panel_offset,
            nodes: surface.nodes.iter().map(|n| [n.x, n.y, n.z]).collect(),
            panels: surface
                .panels
                .iter()
                .map(|p| p.vertices[..p.n_corners()].to_vec())
                .collect(),
            views: view_names
                .iter()
                .zip(view_data)
                .map(|(name, data)| ViewRecord {
                    name,
                    data: data.to_vec(),
                })
                .collect(),
        };

        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(file, &record).map_err(io::Error::other)
    }
}
