use cascade_detector::cascade::{Cascade, CascadeSnapshot};
use cascade_detector::classifier::BuiltinDecoder;
use cascade_detector::config::scan;
use cascade_detector::diagnostics::{PyramidStage, ScanReport, TimingBreakdown};
use cascade_detector::features::GridFeatureExtractor;
use cascade_detector::image::io::{load_grayscale_image, read_json_file, write_json_file};
use cascade_detector::scanner::MultiScaleScanner;
use cascade_detector::workers::WorkerPool;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = scan::load_config(Path::new(&config_path))?;
    let total_start = Instant::now();
    let mut timings = TimingBreakdown::default();

    let frame = timings.measure("load_image", || {
        load_grayscale_image(&config.input).map(|gray| gray.to_f32())
    })?;
    let snapshot: CascadeSnapshot = read_json_file(&config.cascade)?;

    let mut scanner = MultiScaleScanner::new(GridFeatureExtractor::new(config.features));
    let pyramid = scanner
        .configure(frame.w, frame.h, config.scan.stage_count)
        .map(PyramidStage::from_pyramid)
        .map_err(|e| e.to_string())?;

    let threads = config.scan.threads.max(1);
    let scan = if threads > 1 {
        let pool = WorkerPool::spawn(&snapshot, threads, Arc::new(BuiltinDecoder))
            .map_err(|e| e.to_string())?;
        let mut scan = timings
            .measure("scan", || scanner.scan(&frame))
            .map_err(|e| e.to_string())?;
        let inputs: Vec<Vec<f32>> = scan.levels.iter().map(|o| o.features.clone()).collect();
        let verdicts = timings
            .measure("classify", || pool.classify_batch(&inputs))
            .map_err(|e| e.to_string())?;
        for (observation, verdict) in scan.levels.iter_mut().zip(verdicts) {
            observation.verdict = Some(verdict);
        }
        scan
    } else {
        let mut cascade =
            Cascade::from_snapshot(&snapshot, &BuiltinDecoder).map_err(|e| e.to_string())?;
        timings
            .measure("detect", || scanner.detect(&frame, &mut cascade))
            .map_err(|e| e.to_string())?
    };

    let detections: Vec<usize> = scan.detections().map(|o| o.level_index).collect();
    println!(
        "Scanned {}x{} at {} scales with {} stages: {} detection(s), {:.3}ms total, {:.3}ms per scale",
        frame.w,
        frame.h,
        scan.levels.len(),
        snapshot.len(),
        detections.len(),
        scan.total_ms,
        scan.average_ms
    );
    for observation in scan.detections() {
        println!(
            "  level {} ({}x{}, scale {:.3})",
            observation.level_index, observation.dims.w, observation.dims.h, observation.scale
        );
    }

    timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    if let Some(path) = &config.output.report_json {
        let report = ScanToolReport {
            input: config.input.display().to_string(),
            stages: snapshot.len(),
            threads,
            pyramid,
            scan,
            timings,
        };
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: scan_image <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanToolReport {
    input: String,
    stages: usize,
    threads: usize,
    pyramid: PyramidStage,
    scan: ScanReport,
    timings: TimingBreakdown,
}
