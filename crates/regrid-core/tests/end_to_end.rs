//! Integration tests driving the public regridding API end-to-end: build a
//! grid on a real projection, push point/profile/swath observations through
//! it, and check the compacted output against hand-computed expectations.

use projection::{Ellipsoid, LambertConformal, Projection};
use regrid_core::cell::AggregationMethod;
use regrid_core::config::RegridConfig;
use regrid_core::grid::Grid;
use regrid_core::point::{PointRegridRequest, BADVAL};
use regrid_core::swath::SwathRegridRequest;
use regrid_core::vertical::{VerticalKind, VerticalModel};

/// A 20x20 Lambert grid over the continental US, the same kind of domain an
/// HRRR/NAM nest would use.
fn hrrr_like_grid() -> Grid {
    let lcc = LambertConformal::new(-97.0, 38.5, 38.5, 38.5, Ellipsoid::SPHERE).unwrap();
    let projection = Projection::Lambert(lcc);
    Grid::new(
        projection,
        20,
        20,
        -1_000_000.0,
        -1_000_000.0,
        100_000.0,
        100_000.0,
        1,
        None,
    )
    .unwrap()
}

#[test]
fn point_regrid_mean_combines_two_nearby_stations() {
    let grid = hrrr_like_grid();
    let lon = [-96.5, -96.49];
    let lat = [38.0, 38.0];
    let data = [20.0, 24.0];
    let request = PointRegridRequest {
        method: AggregationMethod::Mean,
        minimum_valid_value: f64::MIN,
        lon: &lon,
        lat: &lat,
        levels: 1,
        elevations: None,
        data: &data,
        data2: None,
        notes: None,
    };
    let config = RegridConfig::default();
    let out = grid.regrid(&request, &config).unwrap();

    assert_eq!(out.n, 1);
    assert!((out.data[0] - 22.0).abs() < 1e-9);
}

#[test]
fn point_regrid_nearest_prefers_closer_station() {
    let grid = hrrr_like_grid();
    let lon = [-96.42902530054181, -96.200645264711];
    let lat = [38.048965298034155, 38.047626441035916];
    let data = [20.0, 24.0];
    let request = PointRegridRequest {
        method: AggregationMethod::Nearest,
        minimum_valid_value: f64::MIN,
        lon: &lon,
        lat: &lat,
        levels: 1,
        elevations: None,
        data: &data,
        data2: None,
        notes: None,
    };
    let config = RegridConfig::default();
    let out = grid.regrid(&request, &config).unwrap();

    assert_eq!(out.n, 1);
    assert!((out.data[0] - 20.0).abs() < 1e-9);
}

#[test]
fn point_regrid_below_threshold_is_dropped() {
    let grid = hrrr_like_grid();
    let lon = [-97.0];
    let lat = [38.5];
    let data = [BADVAL];
    let request = PointRegridRequest {
        method: AggregationMethod::Mean,
        minimum_valid_value: -9.0e36,
        lon: &lon,
        lat: &lat,
        levels: 1,
        elevations: None,
        data: &data,
        data2: None,
        notes: None,
    };
    let config = RegridConfig::default();
    let out = grid.regrid(&request, &config).unwrap();

    assert_eq!(out.n, 0);
}

#[test]
fn profile_regrid_bins_a_sounding_across_sigma_layers() {
    let lcc = LambertConformal::new(-97.0, 38.5, 38.5, 38.5, Ellipsoid::SPHERE).unwrap();
    let projection = Projection::Lambert(lcc);
    let vertical = VerticalModel::new(
        VerticalKind::HydrostaticSigmaP,
        5000.0,
        vec![1.0, 0.7, 0.4, 0.0],
        9.81,
        287.04,
        50.0,
        290.0,
        100_000.0,
        10_000.0,
    )
    .unwrap();
    let grid = Grid::new(
        projection,
        20,
        20,
        -1_000_000.0,
        -1_000_000.0,
        100_000.0,
        100_000.0,
        3,
        Some(vertical),
    )
    .unwrap();

    let lon = [-97.0];
    let lat = [38.5];
    let elevations = [0.0, 2000.0, 6000.0];
    let data = [15.0, 5.0, -20.0];
    let request = PointRegridRequest {
        method: AggregationMethod::Mean,
        minimum_valid_value: f64::MIN,
        lon: &lon,
        lat: &lat,
        levels: 3,
        elevations: Some(&elevations),
        data: &data,
        data2: None,
        notes: None,
    };
    let config = RegridConfig::default();
    let out = grid.regrid(&request, &config).unwrap();

    assert!(out.n >= 1);
    assert!(out.layer.is_some());
}

#[test]
fn swath_regrid_weights_by_clipped_overlap_area() {
    use projection::Identity;

    let identity = Projection::Identity(Identity::new(Ellipsoid::WGS84));
    let grid = Grid::new(identity, 10, 10, -100.0, 30.0, 1.0, 1.0, 1, None).unwrap();

    let corners = [[
        (-95.0 - 0.5, 35.5 - 0.5),
        (-95.0 + 0.5, 35.5 - 0.5),
        (-95.0 + 0.5, 35.5 + 0.5),
        (-95.0 - 0.5, 35.5 + 0.5),
    ]];
    let data = [50.0];
    let request = SwathRegridRequest {
        method: AggregationMethod::Weighted,
        minimum_valid_value: f64::MIN,
        corners: &corners,
        data: &data,
    };
    let out = grid.regrid_swath(&request).unwrap();

    assert_eq!(out.n, 2);
    for &d in &out.data {
        assert!((d - 50.0).abs() < 1e-6);
    }
}

#[test]
fn grid_subset_preserves_projection_and_vertical_model() {
    let grid = hrrr_like_grid();
    let subset = grid.subset(1, 1, 5, 10, 5, 10).unwrap();
    assert_eq!(subset.rows(), 6);
    assert_eq!(subset.columns(), 6);
    assert_eq!(subset.layers(), 1);
}
