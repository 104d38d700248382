use std::io::Cursor;

use super::*;

fn open_bytes(bytes: Vec<u8>) -> NetCdfFile<Cursor<Vec<u8>>> {
    NetCdfFile::from_reader(Cursor::new(bytes)).unwrap()
}

fn build(builder: &NetCdfBuilder) -> Vec<u8> {
    let mut bytes = Vec::new();
    builder.write(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_fixed_variables() {
    let mut builder = NetCdfBuilder::new();
    let scans = builder.add_dimension("scan_number", 3);
    let points = builder.add_dimension("point_number", 5);
    builder.add_global_attribute("dataset_origin", NcArray::text("unit test"));
    builder
        .add_variable("scan_index", &[scans], NcArray::Int(vec![0, 2, 4]))
        .unwrap();
    let masses = builder
        .add_variable(
            "mass_values",
            &[points],
            NcArray::Double(vec![100.0, 101.0, 200.0, 201.0, 300.0]),
        )
        .unwrap();
    builder
        .add_variable_attribute(masses, "scale_factor", NcArray::Float(vec![0.5]))
        .unwrap();
    builder
        .add_variable("flags", &[scans], NcArray::Short(vec![1, -2, 3]))
        .unwrap();

    let mut file = open_bytes(build(&builder));
    let header = file.header();
    assert_eq!(header.version, 1);
    assert_eq!(header.dimensions.len(), 2);
    assert_eq!(
        header.attribute("dataset_origin").and_then(|a| a.as_text()),
        Some("unit test".to_string())
    );

    let masses = file.find_variable("mass_values").cloned().unwrap();
    assert_eq!(masses.rank(), 1);
    assert_eq!(masses.len(), 5);
    assert_eq!(masses.attribute("scale_factor").and_then(|a| a.as_f64()), Some(0.5));

    let mut buf = Vec::new();
    file.read_f64_into(&masses, 2, 2, &mut buf).unwrap();
    assert_eq!(buf, vec![200.0, 201.0]);

    let index = file.find_variable("scan_index").cloned().unwrap();
    assert_eq!(file.read_i64_all(&index).unwrap(), vec![0, 2, 4]);

    let flags = file.find_variable("flags").cloned().unwrap();
    assert_eq!(file.read_all(&flags).unwrap(), NcArray::Short(vec![1, -2, 3]));
}

#[test]
fn test_record_variables_are_interleaved() {
    let mut builder = NetCdfBuilder::new();
    let points = builder.add_unlimited_dimension("point_number").unwrap();
    builder
        .add_variable(
            "mass_values",
            &[points],
            NcArray::Double((0..10).map(|i| 100.0 + i as f64).collect()),
        )
        .unwrap();
    builder
        .add_variable(
            "intensity_values",
            &[points],
            NcArray::Short((0..10).map(|i| i * 10).collect()),
        )
        .unwrap();

    let mut file = open_bytes(build(&builder));
    assert_eq!(file.header().num_records, 10);
    // double slab (8) + short slab padded to 4
    assert_eq!(file.header().record_size(), 12);

    let masses = file.find_variable("mass_values").cloned().unwrap();
    let intensities = file.find_variable("intensity_values").cloned().unwrap();
    assert!(masses.is_record);
    assert_eq!(masses.len(), 10);

    let mut buf = Vec::new();
    file.read_f64_into(&masses, 3, 4, &mut buf).unwrap();
    assert_eq!(buf, vec![103.0, 104.0, 105.0, 106.0]);
    file.read_f64_into(&intensities, 8, 2, &mut buf).unwrap();
    assert_eq!(buf, vec![80.0, 90.0]);
}

#[test]
fn test_single_short_record_variable_is_unpadded() {
    let mut builder = NetCdfBuilder::new();
    let points = builder.add_unlimited_dimension("point_number").unwrap();
    builder
        .add_variable("counts", &[points], NcArray::Short(vec![1, 2, 3, 4, 5]))
        .unwrap();

    let bytes = build(&builder);
    let mut file = open_bytes(bytes);
    assert_eq!(file.header().record_size(), 2);

    let counts = file.find_variable("counts").cloned().unwrap();
    let mut buf = Vec::new();
    file.read_f64_into(&counts, 1, 3, &mut buf).unwrap();
    assert_eq!(buf, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_streaming_record_count() {
    let mut builder = NetCdfBuilder::new();
    let points = builder.add_unlimited_dimension("point_number").unwrap();
    builder
        .add_variable("values", &[points], NcArray::Float(vec![1.0, 2.0, 3.0]))
        .unwrap();
    let mut bytes = build(&builder);
    // numrecs follows the 4 magic bytes
    bytes[4..8].copy_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);

    let mut file = open_bytes(bytes);
    assert_eq!(file.header().num_records, 3);
    let values = file.find_variable("values").cloned().unwrap();
    assert_eq!(file.read_f32_all(&values).unwrap(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_dimension_longer_than_file() {
    let mut builder = NetCdfBuilder::new();
    let scans = builder.add_dimension("scan", 3);
    builder
        .add_variable("scan_index", &[scans], NcArray::Int(vec![0, 2, 5]))
        .unwrap();
    let mut bytes = build(&builder);
    // magic, numrecs, dimension tag and count, name length, "scan", then the length
    assert_eq!(&bytes[20..24], b"scan");
    bytes[24..28].copy_from_slice(&0x7FFF_FFF0u32.to_be_bytes());
    let file_len = bytes.len() as u64;

    let mut file = open_bytes(bytes);
    let index = file.find_variable("scan_index").cloned().unwrap();
    assert_eq!(index.len(), 0x7FFF_FFF0);
    let err = file.read_i64_all(&index).unwrap_err();
    assert!(matches!(err, NetCdfError::Truncated { file_len: n, .. } if n == file_len));
}

#[test]
fn test_truncated_data_section() {
    let mut builder = NetCdfBuilder::new();
    let n = builder.add_dimension("n", 4);
    builder
        .add_variable("v", &[n], NcArray::Double(vec![1.0, 2.0, 3.0, 4.0]))
        .unwrap();
    let mut bytes = build(&builder);
    bytes.truncate(bytes.len() - 8);

    let mut file = open_bytes(bytes);
    let v = file.find_variable("v").cloned().unwrap();
    let mut buf = Vec::new();
    file.read_f64_into(&v, 0, 3, &mut buf).unwrap();
    assert_eq!(buf, vec![1.0, 2.0, 3.0]);
    assert!(matches!(
        file.read_f64_into(&v, 2, 2, &mut buf),
        Err(NetCdfError::Truncated { .. })
    ));
}

#[test]
fn test_record_count_past_end_of_file() {
    let mut builder = NetCdfBuilder::new();
    let points = builder.add_unlimited_dimension("point_number").unwrap();
    builder
        .add_variable("values", &[points], NcArray::Float(vec![1.0, 2.0, 3.0]))
        .unwrap();
    let mut bytes = build(&builder);
    bytes[4..8].copy_from_slice(&1_000_000u32.to_be_bytes());

    let mut file = open_bytes(bytes);
    let values = file.find_variable("values").cloned().unwrap();
    assert!(matches!(
        file.read_f32_all(&values),
        Err(NetCdfError::Truncated { .. })
    ));
}

#[test]
fn test_two_dimensional_record_variable() {
    let mut builder = NetCdfBuilder::new();
    let scans = builder.add_unlimited_dimension("scan").unwrap();
    let width = builder.add_dimension("width", 3);
    builder
        .add_variable("grid", &[scans, width], NcArray::Int((0..12).collect()))
        .unwrap();
    builder
        .add_variable("time", &[scans], NcArray::Double(vec![0.5, 1.0, 1.5, 2.0]))
        .unwrap();

    let mut file = open_bytes(build(&builder));
    let grid = file.find_variable("grid").cloned().unwrap();
    assert_eq!(grid.shape, vec![4, 3]);

    let mut buf = Vec::new();
    file.read_f64_into(&grid, 2, 6, &mut buf).unwrap();
    assert_eq!(buf, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
}

#[test]
fn test_out_of_bounds_read() {
    let mut builder = NetCdfBuilder::new();
    let n = builder.add_dimension("n", 2);
    builder
        .add_variable("v", &[n], NcArray::Float(vec![1.0, 2.0]))
        .unwrap();
    let mut file = open_bytes(build(&builder));
    let v = file.find_variable("v").cloned().unwrap();

    let mut buf = Vec::new();
    let err = file.read_f64_into(&v, 1, 2, &mut buf).unwrap_err();
    assert!(matches!(err, NetCdfError::OutOfBounds { start: 1, end: 3, len: 2, .. }));
    file.read_f64_into(&v, 2, 0, &mut buf).unwrap();
    assert!(buf.is_empty());
}

#[test]
fn test_type_checks() {
    let mut builder = NetCdfBuilder::new();
    let n = builder.add_dimension("n", 2);
    builder.add_variable("f", &[n], NcArray::Float(vec![1.0, 2.0])).unwrap();
    builder.add_variable("c", &[n], NcArray::text("ab")).unwrap();
    let mut file = open_bytes(build(&builder));

    let f = file.find_variable("f").cloned().unwrap();
    assert!(matches!(
        file.read_i64_all(&f),
        Err(NetCdfError::TypeMismatch { .. })
    ));
    let c = file.find_variable("c").cloned().unwrap();
    assert!(matches!(
        file.read_f32_all(&c),
        Err(NetCdfError::TypeMismatch { .. })
    ));
}

#[test]
fn test_bad_magic_and_version() {
    let err = NetCdfFile::from_reader(Cursor::new(b"\x89HDF\r\n\x1a\n".to_vec())).unwrap_err();
    assert!(matches!(err, NetCdfError::BadMagic(_)));

    let err = NetCdfFile::from_reader(Cursor::new(b"CDF\x05\0\0\0\0".to_vec())).unwrap_err();
    assert!(matches!(err, NetCdfError::UnsupportedVersion(5)));
}

#[test]
fn test_truncated_header() {
    let mut builder = NetCdfBuilder::new();
    let n = builder.add_dimension("a_rather_long_dimension_name", 2);
    builder.add_variable("v", &[n], NcArray::Float(vec![1.0, 2.0])).unwrap();
    let bytes = build(&builder);

    let err = NetCdfFile::from_reader(Cursor::new(bytes[..20].to_vec())).unwrap_err();
    assert!(matches!(
        err,
        NetCdfError::InvalidHeader(_) | NetCdfError::IoError(_)
    ));
}

#[test]
fn test_builder_rejects_inconsistent_definitions() {
    let mut builder = NetCdfBuilder::new();
    let n = builder.add_dimension("n", 3);
    let rec = builder.add_unlimited_dimension("rec").unwrap();
    assert!(builder.add_unlimited_dimension("again").is_err());
    assert!(builder.add_variable("short", &[n], NcArray::Int(vec![1])).is_err());
    assert!(builder.add_variable("bad_axis", &[n, rec], NcArray::Int(vec![1, 2, 3])).is_err());
    assert!(builder.add_variable("unknown", &[7], NcArray::Int(vec![])).is_err());

    builder.add_variable("a", &[rec], NcArray::Int(vec![1, 2])).unwrap();
    builder.add_variable("b", &[rec], NcArray::Int(vec![1, 2, 3])).unwrap();
    let mut sink = Vec::new();
    assert!(matches!(
        builder.write(&mut sink),
        Err(NetCdfError::InvalidDefinition(_))
    ));
}
