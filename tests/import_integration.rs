//! Integration tests for mzscan
//!
//! These tests build ANDI-MS files with the NetCDF writer and run them through
//! the public import API with every store backend.

use mzscan::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

/// Write an ANDI-MS file with `scans` profile spectra of `points` points each.
///
/// Every scan holds one Gaussian peak centred in its m/z window, padded with
/// zero-intensity points on both sides.
fn write_profile_run(path: &Path, scans: usize, points: usize) {
    let mut scan_index = Vec::with_capacity(scans);
    let mut times = Vec::with_capacity(scans);
    let mut masses = Vec::new();
    let mut intensities = Vec::new();

    for s in 0..scans {
        scan_index.push(masses.len() as i32);
        times.push(s as f64 * 0.5);
        let centre = points as f64 / 2.0;
        for k in 0..points {
            let d = (k as f64 - centre) / 3.0;
            let intensity = 1e4 * (-(d * d)).exp();
            masses.push(200.0 + k as f64 * 0.01);
            intensities.push(if intensity < 1.0 { 0.0 } else { intensity as f32 });
        }
    }

    let mut builder = NetCdfBuilder::new();
    let scan_dim = builder.add_dimension("scan_number", scans);
    let point_dim = builder.add_unlimited_dimension("point_number").unwrap();
    builder
        .add_variable("scan_index", &[scan_dim], mzscan::netcdf::NcArray::Int(scan_index))
        .unwrap();
    builder
        .add_variable(
            "scan_acquisition_time",
            &[scan_dim],
            mzscan::netcdf::NcArray::Double(times),
        )
        .unwrap();
    builder
        .add_variable("mass_values", &[point_dim], mzscan::netcdf::NcArray::Double(masses))
        .unwrap();
    builder
        .add_variable(
            "intensity_values",
            &[point_dim],
            mzscan::netcdf::NcArray::Float(intensities),
        )
        .unwrap();
    builder.write_to_path(path).unwrap();
}

/// Import the same file into every backend and compare the results
#[test]
fn test_backends_agree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profile.cdf");
    write_profile_run(&path, 20, 60);

    let factory = DataPointStoreFactory::new();
    let mut reference: Option<Vec<DataPointContainer>> = None;
    for kind in [StoreKind::Memory, StoreKind::TempFile, StoreKind::EmbeddedDb] {
        let store = factory.create(kind, Some(dir.path())).unwrap();
        let raw_file = NetCdfImportMethod::new(&path, Arc::clone(&store))
            .execute()
            .unwrap()
            .unwrap();
        assert_eq!(raw_file.scans().len(), 20, "{}", kind);

        let spectra: Vec<DataPointContainer> = raw_file
            .scans()
            .iter()
            .map(|scan| {
                let mut buf = DataPointContainer::new();
                raw_file.read_data_points(scan, &mut buf).unwrap();
                buf
            })
            .collect();
        assert!(spectra.iter().all(|s| s.len() == 60));

        match &reference {
            None => reference = Some(spectra),
            Some(expected) => assert_eq!(expected, &spectra, "{}", kind),
        }
        store.dispose().unwrap();
    }
}

/// Profile-shaped spectra are recognised through the default classifier
#[test]
fn test_profile_spectra_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profile.cdf");
    write_profile_run(&path, 3, 80);

    let store = DataPointStoreFactory::new().memory_store();
    let raw_file = import_raw_file(&path, store).unwrap().unwrap();
    for scan in raw_file.scans() {
        assert_eq!(scan.spectrum_type, Some(MsSpectrumType::Profile));
        assert_eq!(scan.ms_function.ms_level, 1);
    }
    assert_eq!(raw_file.scan(3).unwrap().retention_time(), Some(1.0));
}

/// A temp-file store's scratch file disappears once the last owner is gone
#[test]
fn test_scratch_file_removed_after_drop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.cdf");
    write_profile_run(&path, 5, 20);
    let scratch = dir.path().join("scratch");
    std::fs::create_dir(&scratch).unwrap();

    let store = DataPointStoreFactory::new()
        .temp_file_store_in(&scratch)
        .unwrap();
    let raw_file = NetCdfImportMethod::new(&path, store)
        .execute()
        .unwrap()
        .unwrap();
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 1);

    drop(raw_file);
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

/// Cancelling from another thread stops the import between scans
#[test]
fn test_cancel_from_another_thread() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.cdf");
    let scans = 2000;
    write_profile_run(&path, scans, 10);

    let slow = |data: &DataPointContainer| {
        thread::sleep(Duration::from_millis(1));
        SpectrumTypeDetector::default().classify(data)
    };
    let store = DataPointStoreFactory::new().memory_store();
    let mut importer = NetCdfImportMethod::new(&path, Arc::clone(&store)).with_classifier(slow);
    let status = importer.status();
    let token = importer.cancellation_token();

    let worker = thread::spawn(move || {
        let outcome = importer.execute().unwrap();
        (outcome.is_none(), importer.take_partial_result())
    });

    while status.parsed_scans() < 10 {
        thread::sleep(Duration::from_millis(1));
    }
    token.cancel();
    let (canceled, partial) = worker.join().unwrap();

    assert!(canceled);
    assert_eq!(status.state(), ImportState::Canceled);
    let partial = partial.unwrap();
    let kept = partial.scans().len();
    assert!(kept >= 10 && kept < scans);
    assert_eq!(kept, status.parsed_scans());
    assert_eq!(store.len(), kept);
    let percentage = status.finished_percentage().unwrap();
    assert!(percentage > 0.0 && percentage < 1.0);
}

/// Two files imported into one shared memory store keep separate data
#[test]
fn test_shared_memory_store() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.cdf");
    let second = dir.path().join("second.cdf");
    write_profile_run(&first, 4, 10);
    write_profile_run(&second, 6, 10);

    let factory = DataPointStoreFactory::new();
    let mut a = import_raw_file(&first, factory.memory_store()).unwrap().unwrap();
    let b = import_raw_file(&second, factory.memory_store()).unwrap().unwrap();
    assert_eq!(factory.memory_store().len(), 10);

    a.dispose().unwrap();
    assert_eq!(factory.memory_store().len(), 6);
    let mut buf = DataPointContainer::new();
    b.read_data_points(&b.scans()[5], &mut buf).unwrap();
    assert_eq!(buf.len(), 10);
}
