// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Outlines agree with the cuts the evaluator makes

use approx::assert_relative_eq;
use cutwork::ops::HoleSpec;
use cutwork::wireframe::Rim;
use cutwork::{Axis, BuildStatus, Direction, ElementGeometry, Kernel, PipelineConfig, Shape};
use nalgebra::{Point3, Vector3};

const ALL_DIRECTIONS: [Direction; 6] = [
    Direction::Down,
    Direction::Up,
    Direction::Right,
    Direction::Left,
    Direction::Forward,
    Direction::Backward,
];

/// Distance from `point` to the line through `origin` along `axis`, and the axial coordinate
fn cylindrical(point: &Point3<f64>, origin: &Vector3<f64>, axis: Axis) -> (f64, f64) {
    let offset = point.coords - origin;
    let along = offset[axis.index()];
    let radial = (offset - axis.unit() * along).norm();
    (radial, along)
}

#[test]
fn outline_axis_matches_cut_axis_for_every_direction() {
    let config = PipelineConfig::default();
    let cube = Shape::cuboid(6.0, 6.0, 6.0);
    let radius = 1.0;

    for direction in ALL_DIRECTIONS {
        let mut kernel = Kernel::new(config.clone());
        let axis = direction.axis();
        // Off-centre across the hole, centred along it so the cut goes through
        let mut position = Vector3::new(0.5, -0.25, 0.75);
        position[axis.index()] = 0.0;
        let op = kernel
            .hole_builder()
            .single_hole(
                &HoleSpec::new(radius, axis).direction(direction).segments(16),
                position,
                cube.extent(axis),
            )
            .unwrap();
        let element = ElementGeometry::with_operations(cube, vec![op]);

        let loops = kernel.outlines("cube", &element, None, None);
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.axis == axis && l.direction == direction));

        // Rims sit at +-depth/2 along the axis, entry rim first
        let half = (6.0 + config.depth_extension) / 2.0;
        let top = &loops[0];
        let bottom = &loops[1];
        assert_eq!(top.rim, Rim::Top);
        assert_relative_eq!(top.position, position - direction.vector() * half, epsilon = 1e-9);
        assert_relative_eq!(bottom.position, position + direction.vector() * half, epsilon = 1e-9);

        // The evaluator's hole wall lies on the outline's axis, between the rims
        let outcome = kernel.build(&element);
        assert_eq!(outcome.status, BuildStatus::Built);
        let wall: Vec<f64> = outcome
            .mesh
            .vertices
            .iter()
            .map(|v| cylindrical(&v.position, &position, top.axis))
            .filter(|(radial, _)| (radial - radius).abs() < 1e-6)
            .map(|(_, along)| along)
            .collect();
        assert!(wall.len() >= 16, "{}: only {} wall vertices", direction, wall.len());
        assert!(wall.iter().all(|along| along.abs() <= half + 1e-9));
        assert!(wall.iter().any(|along| (along.abs() - 3.0).abs() < 1e-6));
    }
}

#[test]
fn left_hole_rims_straddle_position_along_x() {
    let kernel = Kernel::default();
    let op = kernel
        .hole_builder()
        .single_hole(
            &HoleSpec::new(0.5, Axis::X).direction(Direction::Left).depth(4.0),
            Vector3::new(1.0, 2.0, 3.0),
            10.0,
        )
        .unwrap();
    let element = ElementGeometry::with_operations(Shape::cuboid(10.0, 10.0, 10.0), vec![op]);
    let loops = kernel.outlines("block", &element, None, None);

    assert_eq!(loops[0].key, "block_hole_0_top");
    assert_eq!(loops[0].axis, Axis::X);
    // Travelling left, so the entry rim is on the +x side
    assert_relative_eq!(loops[0].position, Vector3::new(3.0, 2.0, 3.0), epsilon = 1e-9);
    assert_relative_eq!(loops[1].position, Vector3::new(-1.0, 2.0, 3.0), epsilon = 1e-9);
}

#[test]
fn counterbore_rims_follow_axial_offsets() {
    let kernel = Kernel::default();
    let ops = kernel
        .hole_builder()
        .counterbore_from_profile(
            kernel.config(),
            "panel",
            Axis::Y,
            None,
            Vector3::new(95.0, 0.0, 0.0),
            1.2,
        )
        .unwrap();
    let element = ElementGeometry::with_operations(Shape::cuboid(250.0, 1.2, 80.0), ops.to_vec());
    let loops = kernel.outlines("panel", &element, None, None);

    let heights: Vec<(String, f64)> = loops.iter().map(|l| (l.key.clone(), l.position.y)).collect();
    assert_eq!(heights.len(), 4);
    assert_eq!(heights[0].0, "panel_hole_0_top");
    assert_relative_eq!(heights[0].1, 0.7, epsilon = 1e-9);
    assert_relative_eq!(heights[1].1, 0.3, epsilon = 1e-9);
    assert_eq!(heights[2].0, "panel_hole_1_top");
    assert_relative_eq!(heights[2].1, 0.4, epsilon = 1e-9);
    assert_relative_eq!(heights[3].1, -0.7, epsilon = 1e-9);
}
