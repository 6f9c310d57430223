// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL round trips through the topology store

use anyhow::Result;
use approx::assert_relative_eq;
use dynmesh::{analyze, csg_difference, io, CsgConfig, DynamicMesh, Primitive};
use nalgebra::{Point3, Vector3};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_stl_roundtrip_welds_into_a_volume() -> Result<()> {
    let sphere = Primitive::sphere(5.0, 24).to_mesh();
    let file = NamedTempFile::with_suffix(".stl")?;
    io::export_stl(&sphere, file.path())?;

    let metadata = std::fs::metadata(file.path())?;
    assert_eq!(metadata.len(), 84 + 50 * sphere.triangle_count() as u64);

    let loaded = io::import_stl(file.path())?;
    assert_eq!(loaded.triangle_count(), sphere.triangle_count());

    let dynamic = DynamicMesh::from_mesh_welded(&loaded, CsgConfig::default().weld_tolerance)?;
    assert_eq!(dynamic.vertex_count(), sphere.vertex_count());
    assert!(dynamic.represents_volume());
    assert_relative_eq!(analyze(&loaded).volume, analyze(&sphere).volume, epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_difference_result_survives_export() -> Result<()> {
    let a = Primitive::cube(Vector3::new(4.0, 4.0, 4.0), false).to_mesh();
    let b = Primitive::cuboid(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0)).to_mesh();
    let result = csg_difference(DynamicMesh::from_mesh(&a)?, DynamicMesh::from_mesh(&b)?)?;

    let dir = tempdir()?;
    let path = dir.path().join("hollow.stl");
    io::export_stl(&result.to_mesh(), &path)?;

    let stats = analyze(&io::import_stl(&path)?);
    assert_eq!(stats.triangle_count, 24);
    assert!(stats.is_watertight);
    assert_relative_eq!(stats.volume, 64.0 - 8.0, epsilon = 1e-4);
    Ok(())
}

#[test]
fn test_config_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dynmesh.toml");
    let config = CsgConfig::default().with_tolerance(1e-4).with_parallel(false);
    config.save(&path)?;

    assert_eq!(CsgConfig::from_file(&path)?, config);
    Ok(())
}
