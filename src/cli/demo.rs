use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzscan::import::{
    INTENSITY_VALUES, MASS_VALUES, SCALE_FACTOR, SCAN_ACQUISITION_TIME, SCAN_INDEX,
};
use mzscan::netcdf::{NcArray, NetCdfBuilder};

/// Seconds between scans
const SCAN_INTERVAL: f64 = 0.2;
/// m/z step between profile points
const MZ_STEP: f64 = 0.02;
/// First m/z of every scan
const MZ_START: f64 = 100.0;
/// Intensities below this are written as zero
const NOISE_FLOOR: f64 = 1.0;

/// A compound eluting from the column
struct Compound {
    mz: f64,
    apex_rt: f64,
    height: f64,
}

/// Generate a synthetic ANDI-MS file
pub fn run(output: PathBuf, scans: usize, points: usize, missing_every: usize) -> Result<()> {
    if scans == 0 {
        anyhow::bail!("--scans must be at least 1");
    }

    info!("mzscan Demo - synthetic GC-MS run");
    info!("==================================");
    info!("Output: {}", output.display());

    let run_time = scans as f64 * SCAN_INTERVAL;
    let mz_end = MZ_START + points as f64 * MZ_STEP;
    let compounds = mock_compounds(run_time, mz_end);

    let mut scan_index = Vec::with_capacity(scans);
    let mut times = Vec::with_capacity(scans);
    let mut tic = Vec::with_capacity(scans);
    let mut masses = Vec::new();
    let mut intensities = Vec::new();
    let mut missing = 0usize;

    for i in 0..scans {
        let rt = i as f64 * SCAN_INTERVAL;
        times.push(rt);
        if missing_every > 0 && (i + 1) % missing_every == 0 {
            scan_index.push(-1);
            tic.push(0.0);
            missing += 1;
            continue;
        }

        let start = i32::try_from(masses.len()).context("Too many data points for ANDI-MS")?;
        scan_index.push(start);
        let mut total = 0.0;
        for k in 0..points {
            let mz = MZ_START + k as f64 * MZ_STEP;
            let intensity = profile_intensity(&compounds, mz, rt);
            masses.push(mz);
            intensities.push(intensity as f32);
            total += intensity;
        }
        tic.push(total);

        if (i + 1) % 100 == 0 {
            info!("  Generated {} scans...", i + 1);
        }
    }

    info!(
        "Writing {} scans ({} missing, {} data points)...",
        scans,
        missing,
        masses.len()
    );

    let mut builder = NetCdfBuilder::new();
    let scan_dim = builder.add_dimension("scan_number", scans);
    let point_dim = builder.add_unlimited_dimension("point_number")?;
    builder.add_global_attribute("dataset_completeness", NcArray::text("C1+C2"));
    builder.add_global_attribute("ms_template_revision", NcArray::text("1.0.1"));
    builder.add_global_attribute("experiment_title", NcArray::text("mzscan demo run"));
    builder.add_global_attribute(
        "netcdf_file_date_time_stamp",
        NcArray::text(&chrono::Utc::now().format("%Y%m%d%H%M%S%z").to_string()),
    );

    builder.add_variable(SCAN_INDEX, &[scan_dim], NcArray::Int(scan_index))?;
    let time_var =
        builder.add_variable(SCAN_ACQUISITION_TIME, &[scan_dim], NcArray::Double(times))?;
    builder.add_variable_attribute(time_var, "units", NcArray::text("Seconds"))?;
    builder.add_variable("total_intensity", &[scan_dim], NcArray::Double(tic))?;

    let mass_var = builder.add_variable(MASS_VALUES, &[point_dim], NcArray::Double(masses))?;
    builder.add_variable_attribute(mass_var, "units", NcArray::text("M/Z"))?;
    builder.add_variable_attribute(mass_var, SCALE_FACTOR, NcArray::Double(vec![1.0]))?;
    let intensity_var =
        builder.add_variable(INTENSITY_VALUES, &[point_dim], NcArray::Float(intensities))?;
    builder.add_variable_attribute(
        intensity_var,
        "units",
        NcArray::text("Arbitrary Intensity Units"),
    )?;
    builder.add_variable_attribute(intensity_var, SCALE_FACTOR, NcArray::Double(vec![1.0]))?;

    builder
        .write_to_path(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let file_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    info!("Demo file written!");
    info!(
        "  File size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );
    println!("{}", output.display());
    Ok(())
}

/// Compounds spread evenly over the run and the m/z window
fn mock_compounds(run_time: f64, mz_end: f64) -> Vec<Compound> {
    let count = 8;
    (0..count)
        .map(|c| {
            let fraction = (c as f64 + 1.0) / (count as f64 + 1.0);
            Compound {
                mz: MZ_START + (mz_end - MZ_START) * ((c as f64 * 0.37 + fraction) % 1.0),
                apex_rt: run_time * fraction,
                height: 1e5 * (0.3 + (c as f64 * 0.7).sin().abs()),
            }
        })
        .collect()
}

/// Gaussian peaks in m/z and retention time; values under the noise floor become zero
fn profile_intensity(compounds: &[Compound], mz: f64, rt: f64) -> f64 {
    let intensity: f64 = compounds
        .iter()
        .map(|c| {
            let dm = (mz - c.mz) / 0.05;
            let dt = (rt - c.apex_rt) / 3.0;
            c.height * (-(dm * dm) - dt * dt).exp()
        })
        .sum();
    if intensity < NOISE_FLOOR {
        0.0
    } else {
        intensity
    }
}
