use cascade_detector::cascade::{Cascade, CascadeSnapshot};
use cascade_detector::classifier::BuiltinDecoder;
use cascade_detector::config::train::{self, TrainToolConfig};
use cascade_detector::dataset::{load_image_dataset, EvaluationDataset};
use cascade_detector::diagnostics::{ScoreSummary, TrainingReport, TrainingRoundReport};
use cascade_detector::features::{FeatureExtractor, GridFeatureExtractor};
use cascade_detector::image::io::{read_json_file, write_json_file};
use cascade_detector::promotion::StagePromoter;
use cascade_detector::scoring::AccuracyScorer;
use log::debug;
use std::env;
use std::path::Path;
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
    let config = train::load_config(Path::new(&config_path))?;
    let total_start = Instant::now();
    let mut report = TrainingReport::default();

    let mut extractor = GridFeatureExtractor::new(config.features);
    report.feature_len = extractor.feature_len();
    let (training, evaluation) = report
        .timings
        .measure("load_datasets", || load_datasets(&config, &mut extractor))?;
    report.training_examples = training.len();
    report.evaluation_examples = evaluation.len();

    let mut cascade = match &config.initial_cascade {
        Some(path) => {
            let snapshot: CascadeSnapshot = read_json_file(path)?;
            Cascade::from_snapshot(&snapshot, &BuiltinDecoder).map_err(|e| e.to_string())?
        }
        None => Cascade::new(),
    };

    let scorer = AccuracyScorer::new(config.score);
    let (mut promoter, baseline) = StagePromoter::with_baseline(scorer, &mut cascade, &evaluation)
        .map_err(|e| e.to_string())?;
    println!(
        "Baseline: {} stages, score {:.3}, success {:.2}%",
        cascade.len(),
        baseline.score,
        baseline.success_rate
    );
    report.baseline = Some(ScoreSummary::from(&baseline));

    for round in 0..config.stages.rounds {
        let round_start = Instant::now();
        let kind = config.stages.kind_for_round(round);
        cascade
            .begin_candidate(kind.build(report.feature_len))
            .map_err(|e| e.to_string())?;
        let summary = cascade
            .train(&training, &config.stages.train, &mut |progress| {
                debug!(
                    "round {round}: iterations={} error={:.5}",
                    progress.iterations, progress.error
                )
            })
            .map_err(|e| e.to_string())?;
        let (decision, result) = promoter
            .review(&mut cascade, &evaluation)
            .map_err(|e| e.to_string())?;
        let elapsed_ms = round_start.elapsed().as_secs_f64() * 1000.0;

        println!(
            "Round {round} ({kind:?}): relevant {} (skipped {}), score {:.3}, success {:.2}% -> {}",
            summary.relevant(),
            summary.skipped,
            result.score,
            result.success_rate,
            if decision.promoted() { "promoted" } else { "discarded" }
        );
        report.timings.push(format!("round_{round}"), elapsed_ms);
        report.rounds.push(TrainingRoundReport {
            round,
            stage_kind: kind,
            train: summary,
            evaluation: ScoreSummary::from(&result),
            decision,
            elapsed_ms,
        });
    }

    let snapshot = cascade.export().map_err(|e| e.to_string())?;
    write_json_file(&config.output.cascade_json, &snapshot)?;
    println!(
        "Saved cascade with {} stages to {}",
        snapshot.len(),
        config.output.cascade_json.display()
    );

    report.final_stages = cascade.len();
    report.best_score = promoter.best_score();
    report.timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!(
            "Training report ({} of {} rounds promoted) written to {}",
            report.promoted_rounds(),
            report.rounds.len(),
            path.display()
        );
    }
    Ok(())
}

fn load_datasets(
    config: &TrainToolConfig,
    extractor: &mut GridFeatureExtractor,
) -> Result<(EvaluationDataset, EvaluationDataset), String> {
    let training = load_image_dataset(
        &config.training.positive_dir,
        &config.training.negative_dir,
        config.window,
        extractor,
    )?;
    let evaluation = match &config.evaluation {
        Some(dirs) => {
            load_image_dataset(&dirs.positive_dir, &dirs.negative_dir, config.window, extractor)?
        }
        None => training.clone(),
    };
    evaluation.require_both_classes().map_err(|e| e.to_string())?;
    Ok((training, evaluation))
}

fn usage() -> String {
    "Usage: train_cascade <config.json>".to_string()
}
