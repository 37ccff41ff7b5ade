//! Tests for multi-band compositing.

use compositor::{inspect_geotiff, Compositor};
use geo_common::{GeoError, ASSABA};
use raster_cache::{GeoTransform, RasterCache, RasterLayer, SampleType};
use test_utils::{create_grid_with_nodata, create_ramp_grid, create_test_grid, datasets};

// ============================================================================
// Fixtures
// ============================================================================

fn layer(dataset: &str, width: usize, height: usize, sample_type: SampleType) -> RasterLayer {
    RasterLayer::new(
        dataset,
        2015,
        width,
        height,
        rounded_ramp(width, height),
        sample_type,
    )
    .unwrap()
}

fn rounded_ramp(width: usize, height: usize) -> Vec<f32> {
    create_ramp_grid(width, height, 0.0, 100.0)
        .into_iter()
        .map(f32::round)
        .collect()
}

fn cache() -> RasterCache {
    RasterCache::builder(ASSABA)
        .insert_layer(layer(datasets::PRECIPITATION, 4, 6, SampleType::U16))
        .insert_layer(layer(datasets::POPULATION, 10, 3, SampleType::U16))
        .insert_layer(layer(datasets::GPP, 5, 5, SampleType::U16))
        .insert_layer(layer(datasets::LAND_COVER, 10, 6, SampleType::U8))
        .build()
}

// ============================================================================
// Shape and ordering
// ============================================================================

#[test]
fn test_compose_uses_max_dimensions() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose(
            "assaba",
            2015,
            &[datasets::PRECIPITATION, datasets::POPULATION, datasets::GPP],
        )
        .unwrap();

    // Max width comes from one layer, max height from another
    assert_eq!((composite.width, composite.height), (10, 6));
    assert_eq!(composite.band_count(), 3);
    for band in &composite.bands {
        assert_eq!(band.data.len(), 60);
        assert!(band.was_resampled(10, 6));
    }
}

#[test]
fn test_compose_preserves_request_order() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("Assaba", 2015, &[datasets::GPP, datasets::PRECIPITATION])
        .unwrap();
    let names: Vec<_> = composite.bands.iter().map(|b| b.dataset.as_str()).collect();
    assert_eq!(names, vec![datasets::GPP, datasets::PRECIPITATION]);
    assert_eq!(composite.summary().bands, names);
}

#[test]
fn test_compose_single_dataset_is_one_band() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::GPP])
        .unwrap();
    assert_eq!(composite.band_count(), 1);
    assert_eq!((composite.width, composite.height), (5, 5));
    assert!(!composite.bands[0].was_resampled(5, 5));
    assert_eq!(composite.bands[0].data, rounded_ramp(5, 5));
}

// ============================================================================
// Sample types
// ============================================================================

#[test]
fn test_compose_keeps_shared_dtype() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::PRECIPITATION, datasets::GPP])
        .unwrap();
    assert_eq!(composite.sample_type, SampleType::U16);
    // Integer output is rounded after resampling
    for band in &composite.bands {
        assert!(band.data.iter().all(|v| v.fract() == 0.0));
    }
}

#[test]
fn test_compose_promotes_mixed_dtype() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::PRECIPITATION, datasets::LAND_COVER])
        .unwrap();
    assert_eq!(composite.sample_type, SampleType::F32);
    assert_eq!(composite.bands[1].source_type, SampleType::U8);
}

// ============================================================================
// No-data
// ============================================================================

#[test]
fn test_resampling_keeps_nodata_out_of_values() {
    let nodata = -9999.0;
    let precip = RasterLayer::new(
        datasets::PRECIPITATION,
        2015,
        4,
        4,
        create_grid_with_nodata(4, 4, 5.0, nodata, &[(3, 3)]),
        SampleType::F32,
    )
    .unwrap()
    .with_nodata(Some(nodata as f64));
    let gpp = RasterLayer::new(
        datasets::GPP,
        2015,
        2,
        2,
        create_grid_with_nodata(2, 2, 10.0, nodata, &[(0, 0)]),
        SampleType::F32,
    )
    .unwrap()
    .with_nodata(Some(nodata as f64));
    let cache = RasterCache::builder(ASSABA)
        .insert_layer(precip)
        .insert_layer(gpp)
        .build();

    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::PRECIPITATION, datasets::GPP])
        .unwrap();
    assert_eq!(composite.nodata, Some(nodata as f64));

    let native = &composite.bands[0];
    assert!(!native.was_resampled(4, 4));
    assert_eq!(native.data[15], nodata);

    let upscaled = &composite.bands[1];
    assert!(upscaled.was_resampled(4, 4));
    assert!(upscaled.data.iter().all(|v| *v == nodata || (*v - 10.0).abs() < 1e-4));
    // The top-left 3x3 block touches the no-data source cell
    assert_eq!(upscaled.data.iter().filter(|v| **v == nodata).count(), 9);
    assert!((upscaled.data[15] - 10.0).abs() < 1e-4);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_compose_missing_year() {
    let cache = cache();
    let err = Compositor::new(&cache)
        .compose("assaba", 2030, &[datasets::PRECIPITATION])
        .unwrap_err();
    match err {
        GeoError::MissingLayer { dataset, year } => {
            assert_eq!(dataset, datasets::PRECIPITATION);
            assert_eq!(year, 2030);
        }
        other => panic!("expected MissingLayer, got {:?}", other),
    }
}

#[test]
fn test_compose_one_missing_fails_whole_request() {
    let cache = RasterCache::builder(ASSABA)
        .insert_layer(layer(datasets::PRECIPITATION, 4, 4, SampleType::U16))
        .insert_layer(
            RasterLayer::new(datasets::GPP, 2016, 2, 2, vec![1.0; 4], SampleType::U16).unwrap(),
        )
        .build();
    let err = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::PRECIPITATION, datasets::GPP])
        .unwrap_err();
    assert!(matches!(err, GeoError::MissingLayer { .. }));
}

#[test]
fn test_compose_unsupported_region() {
    let cache = cache();
    let err = Compositor::new(&cache)
        .compose("Tagant", 2015, &[datasets::GPP])
        .unwrap_err();
    assert!(matches!(err, GeoError::UnsupportedRegion(_)));
}

#[test]
fn test_compose_unsupported_dataset() {
    let cache = cache();
    let err = Compositor::new(&cache)
        .compose("assaba", 2015, &["Soil_Moisture"])
        .unwrap_err();
    assert!(matches!(err, GeoError::UnsupportedDataset(_)));
}

#[test]
fn test_compose_empty_request() {
    let cache = cache();
    let empty: [&str; 0] = [];
    let err = Compositor::new(&cache)
        .compose("assaba", 2015, &empty)
        .unwrap_err();
    assert!(matches!(err, GeoError::InvalidRequest(_)));
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_geotiff_band_count_and_size() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose(
            "assaba",
            2015,
            &[datasets::PRECIPITATION, datasets::POPULATION, datasets::GPP],
        )
        .unwrap();
    let bytes = composite.to_geotiff().unwrap();
    let info = inspect_geotiff(&bytes).unwrap();
    assert_eq!(info.bands, 3);
    assert_eq!((info.width, info.height), (10, 6));
    assert_eq!(info.bits_per_sample, 16);
}

#[test]
fn test_transform_falls_back_to_region_extent() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::LAND_COVER])
        .unwrap();
    let expected = GeoTransform::from_bbox(&ASSABA.bbox, 10, 6);
    assert_eq!(composite.transform, expected);
}

#[test]
fn test_transform_rescaled_from_source() {
    let t = GeoTransform {
        origin_x: -12.0,
        origin_y: 18.0,
        pixel_width: 0.4,
        pixel_height: 0.4,
    };
    let small = RasterLayer::new(datasets::GPP, 2015, 2, 2, create_test_grid(2, 2), SampleType::F32)
        .unwrap()
        .with_transform(Some(t));
    let big = RasterLayer::new(
        datasets::PRECIPITATION,
        2015,
        4,
        4,
        create_test_grid(4, 4),
        SampleType::F32,
    )
    .unwrap();
    let cache = RasterCache::builder(ASSABA)
        .insert_layer(small)
        .insert_layer(big)
        .build();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::GPP, datasets::PRECIPITATION])
        .unwrap();
    assert!((composite.transform.pixel_width - 0.2).abs() < 1e-12);
    assert_eq!(composite.transform.origin_x, -12.0);
}

#[test]
fn test_write_geotiff_to_file() {
    let cache = cache();
    let composite = Compositor::new(&cache)
        .compose("assaba", 2015, &[datasets::GPP])
        .unwrap();
    let dir = test_utils::temp_test_dir();
    let path = dir.path().join("composite.tif");
    composite.write_geotiff(&path).unwrap();
    let layer = raster_cache::read_layer(&path, datasets::GPP, 2015).unwrap();
    assert_eq!(layer.dimensions(), (5, 5));
    assert_eq!(layer.sample_type(), SampleType::U16);
}
