// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL reading and writing through `stl_io`
//!
//! STL stores single precision coordinates; positions are widened to `f64`
//! on import and narrowed on export.

use crate::geometry::{Mesh, Triangle, Vertex};
use anyhow::{Context, Result};
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

/// Read an ASCII or binary STL stream
///
/// `stl_io` already merges vertices with identical coordinates, so closed
/// surfaces come back connected.
pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<Mesh> {
    let stl = stl_io::read_stl(reader).context("Failed to read STL contents")?;

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.add_vertex(Vertex::at(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64)));
    }
    for face in &stl.faces {
        mesh.add_triangle(Triangle::new(face.vertices));
    }
    mesh.recompute_normals();
    Ok(mesh)
}

/// Write `mesh` as binary STL with per-face normals from the triangle geometry
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    let narrow = |p: &Point3<f64>| StlVertex::new([p.x as f32, p.y as f32, p.z as f32]);
    let triangles: Vec<StlTriangle> = (0..mesh.triangle_count())
        .map(|i| {
            let tri = mesh.triangle_geometry(i);
            let n = tri.normal();
            StlTriangle {
                normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [narrow(&tri.a), narrow(&tri.b), narrow(&tri.c)],
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter()).context("Failed to write STL contents")?;
    Ok(())
}

/// Load an STL file from disk
pub fn import_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open STL file: {}", path.display()))?;
    read_stl(&mut file).with_context(|| format!("Failed to import {}", path.display()))
}

/// Save `mesh` to disk as binary STL
pub fn export_stl(mesh: &Mesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))
}
