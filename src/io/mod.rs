// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - STL import and export of plain meshes

mod stl;

pub use stl::{export_stl, import_stl, read_stl, write_stl};
