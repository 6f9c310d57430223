// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::csg::{CsgReport, FaceTypeCounts};
use crate::geometry::GeometryStats;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the outcome of a difference run
    pub fn report_difference(
        output: &str,
        report: &CsgReport,
        stats: &GeometryStats,
        duration: Duration,
    ) {
        Self::header("Difference:", output);

        println!("\n{}", "Pipeline:".bold());
        Self::print_field("Curve edges", report.intersection_edges.to_string());
        Self::print_field(
            "Cut faces",
            format!("{} / {}", report.retriangulated_a, report.retriangulated_b),
        );
        Self::print_field("Classified A", Self::format_counts(&report.classified_a));
        Self::print_field("Classified B", Self::format_counts(&report.classified_b));
        if report.fallback_components > 0 {
            Self::print_field(
                "Winding tests",
                report.fallback_components.to_string(),
            );
        }
        if report.conflicts > 0 {
            println!(
                "  {} {}",
                "Conflicts:".bright_black(),
                report.conflicts.to_string().yellow()
            );
        }

        Self::print_stats(stats);

        println!("\n{}", "Performance:".bold());
        Self::print_field("Time", Self::format_duration(duration));
        Self::rule();
    }

    /// Report statistics of a mesh file
    pub fn report_stats(file: &str, stats: &GeometryStats, surfaces: usize) {
        Self::header("Mesh:", file);
        Self::print_stats(stats);
        Self::print_field("Surfaces", surfaces.to_string());
        Self::rule();
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn header(label: &str, name: &str) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", label.bold(), name.cyan());
        Self::rule();
    }

    fn rule() {
        println!("{}", "━".repeat(80).bright_black());
    }

    fn print_stats(stats: &GeometryStats) {
        println!("\n{}", "Geometry:".bold());
        Self::print_field("Vertices", stats.vertex_count.to_string());
        Self::print_field("Triangles", stats.triangle_count.to_string());
        Self::print_field("Volume", format!("{:.6}", stats.volume));
        Self::print_field("Area", format!("{:.6}", stats.surface_area));
        Self::print_field("Euler", stats.euler_characteristic.to_string());

        let closed = if stats.is_watertight {
            "yes".green()
        } else {
            "no".red()
        };
        println!("  {} {}", "Watertight:".bright_black(), closed);
    }

    fn print_field(name: &str, value: String) {
        println!("  {} {}", format!("{}:", name).bright_black(), value.cyan());
    }

    fn format_counts(counts: &FaceTypeCounts) -> String {
        let mut parts = vec![
            format!("{} outside", counts.outside),
            format!("{} inside", counts.inside),
        ];
        if counts.shared > 0 {
            parts.push(format!("{} shared", counts.shared));
        }
        if counts.shared_opposite > 0 {
            parts.push(format!("{} opposite", counts.shared_opposite));
        }
        if counts.unclassified > 0 {
            parts.push(format!("{} unclassified", counts.unclassified));
        }
        parts.join(", ")
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
