//! Tests for tile archive and polygon conversion using stand-in tools.
#![cfg(unix)]

use std::fs;
use std::path::Path;

use converter::{ConverterConfig, FormatConverter, ToolCommand};
use geo_common::GeoError;
use test_utils::{entry_count, gray16_tiff_bytes, temp_test_dir, write_gray16_tiff};

fn gray_tiff() -> Vec<u8> {
    gray16_tiff_bytes(2, 2, &[1, 2, 3, 4])
}

fn sh(script: &str, placeholders: &[&str]) -> ToolCommand {
    let mut args = vec!["-c".to_string(), script.to_string()];
    args.extend(placeholders.iter().map(|p| p.to_string()));
    ToolCommand {
        program: "sh".to_string(),
        args,
    }
}

fn copy_tool() -> ToolCommand {
    sh(r#"cp "$0" "$1""#, &["{input}", "{output}"])
}

fn failing_tool(message: &str) -> ToolCommand {
    sh(&format!("echo '{}' >&2; exit 1", message), &["{input}", "{output}"])
}

fn converter(scratch: &Path) -> FormatConverter {
    let config = ConverterConfig {
        scratch_dir: Some(scratch.to_path_buf()),
        tiles_command: copy_tool(),
        polygonize_command: sh(r#"printf '{"type":"FeatureCollection","features":[]}' > "$1""#, &["{input}", "{output}"]),
        simplify_command: copy_tool(),
        ..Default::default()
    };
    FormatConverter::new(config).unwrap()
}

// ============================================================================
// Tile archives
// ============================================================================

#[test]
fn test_tile_archive_reads_tool_output() {
    let scratch = temp_test_dir();
    let converter = converter(scratch.path());
    let input = gray_tiff();

    let archive = converter.to_tile_archive(&input).unwrap();
    assert_eq!(archive, input);
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_tile_archive_failure_reports_stderr_and_cleans_up() {
    let scratch = temp_test_dir();
    let mut config = converter(scratch.path()).config().clone();
    config.tiles_command = failing_tool("unsupported driver");
    let converter = FormatConverter::new(config).unwrap();

    let (bytes, error) = converter.tile_archive_or_error(&gray_tiff());
    assert!(bytes.is_empty());
    let error = error.unwrap();
    assert!(error.starts_with("Error in sh:"));
    assert!(error.contains("unsupported driver"));
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_tile_archive_missing_output_cleans_up() {
    let scratch = temp_test_dir();
    let mut config = converter(scratch.path()).config().clone();
    config.tiles_command = sh("true", &["{input}", "{output}"]);
    let converter = FormatConverter::new(config).unwrap();

    let err = converter.to_tile_archive(&gray_tiff()).unwrap_err();
    assert!(matches!(err, GeoError::MissingOutput { .. }));
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_concurrent_conversions_do_not_collide() {
    let scratch = temp_test_dir();
    let converter = converter(scratch.path());

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4u16)
            .map(|i| {
                let converter = &converter;
                s.spawn(move || {
                    let input = gray16_tiff_bytes(1, 1, &[i]);
                    let archive = converter.to_tile_archive(&input).unwrap();
                    assert_eq!(archive, input);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
    assert_eq!(entry_count(scratch.path()), 0);
}

// ============================================================================
// Vector polygons
// ============================================================================

#[test]
fn test_vector_polygons_leaves_only_result() {
    let scratch = temp_test_dir();
    let work = temp_test_dir();
    let raster = work.path().join("2015R.tif");
    write_gray16_tiff(&raster, 2, 2, &[1, 2, 3, 4]);
    let out_dir = work.path().join("out");

    let converter = converter(scratch.path());
    let path = converter.to_vector_polygons(&raster, &out_dir).unwrap();

    assert_eq!(path, out_dir.join("2015R.geojson"));
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(entry_count(&out_dir), 1);
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_vector_polygons_replaces_existing_output() {
    let scratch = temp_test_dir();
    let work = temp_test_dir();
    let raster = work.path().join("2015R.tif");
    write_gray16_tiff(&raster, 2, 2, &[1, 2, 3, 4]);
    let out_dir = work.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(out_dir.join("2015R.geojson"), "stale").unwrap();

    let path = converter(scratch.path())
        .to_vector_polygons(&raster, &out_dir)
        .unwrap();
    assert_ne!(fs::read_to_string(path).unwrap(), "stale");
    assert_eq!(entry_count(&out_dir), 1);
}

#[test]
fn test_same_stem_conversions_do_not_share_intermediates() {
    let scratch = temp_test_dir();
    let work = temp_test_dir();
    let out_dir = work.path().join("out");

    // Same file name in different folders, converted into one directory.
    let rasters: Vec<_> = (0..6u16)
        .map(|i| {
            let dir = work.path().join(format!("src{}", i));
            fs::create_dir_all(&dir).unwrap();
            let raster = dir.join("2015R.tif");
            write_gray16_tiff(&raster, 1, 1, &[i]);
            raster
        })
        .collect();

    // Polygonize records which raster it read; simplify copies it through.
    let mut config = converter(scratch.path()).config().clone();
    config.polygonize_command = sh(
        r#"sleep 0.05; printf '{"type":"FeatureCollection","source":"%s","features":[]}' "$0" > "$1""#,
        &["{input}", "{output}"],
    );
    config.simplify_command = sh(r#"sleep 0.05; cp "$0" "$1""#, &["{input}", "{output}"]);
    let converter = FormatConverter::new(config).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = rasters
            .iter()
            .map(|raster| {
                let converter = &converter;
                let out_dir = &out_dir;
                s.spawn(move || converter.to_vector_polygons(raster, out_dir))
            })
            .collect();
        for handle in handles {
            let path = handle.join().unwrap().unwrap();
            assert_eq!(path, out_dir.join("2015R.geojson"));
        }
    });

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("2015R.geojson")).unwrap()).unwrap();
    let source = json["source"].as_str().unwrap();
    assert!(rasters.iter().any(|r| r.to_string_lossy() == source));
    assert_eq!(entry_count(&out_dir), 1);
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_vector_polygons_polygonize_failure() {
    let scratch = temp_test_dir();
    let work = temp_test_dir();
    let raster = work.path().join("2015R.tif");
    write_gray16_tiff(&raster, 2, 2, &[1, 2, 3, 4]);

    let mut config = converter(scratch.path()).config().clone();
    config.polygonize_command = failing_tool("cannot open mask");
    let converter = FormatConverter::new(config).unwrap();

    let err = converter
        .to_vector_polygons(&raster, work.path())
        .unwrap_err();
    match err {
        GeoError::ExternalToolFailure { stderr, .. } => assert_eq!(stderr, "cannot open mask"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!work.path().join("2015R.geojson").exists());
}

#[test]
fn test_vector_polygons_simplify_failure() {
    let scratch = temp_test_dir();
    let work = temp_test_dir();
    let raster = work.path().join("2016R.tif");
    write_gray16_tiff(&raster, 2, 2, &[1, 2, 3, 4]);

    let mut config = converter(scratch.path()).config().clone();
    config.simplify_command = failing_tool("invalid tolerance");
    let converter = FormatConverter::new(config).unwrap();

    let err = converter
        .to_vector_polygons(&raster, work.path())
        .unwrap_err();
    assert_eq!(err.code(), "ExternalToolFailure");
    assert!(!work.path().join("2016R.geojson").exists());
    let kept = work.path().join("2016R.unsimplified.geojson");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(kept).unwrap()).unwrap();
    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(entry_count(scratch.path()), 0);
}

#[test]
fn test_vector_polygons_missing_raster() {
    let scratch = temp_test_dir();
    let converter = converter(scratch.path());
    let err = converter
        .to_vector_polygons(Path::new("/nonexistent/2015R.tif"), scratch.path())
        .unwrap_err();
    assert!(matches!(err, GeoError::InvalidRequest(_)));
}

#[test]
fn test_invalid_config_rejected() {
    let config = ConverterConfig {
        zoom_levels: "9..1".to_string(),
        ..Default::default()
    };
    assert!(matches!(FormatConverter::new(config), Err(GeoError::Config(_))));
}
