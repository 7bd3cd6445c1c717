//! Multi-scale scan driver.
//!
//! Walks the configured [`ScalePyramid`] from the full frame size down,
//! asking the [`FeatureExtractor`] for one vector per level and, in
//! [`MultiScaleScanner::detect`], classifying it with the cascade.
use crate::cascade::Cascade;
use crate::diagnostics::{ScaleObservation, ScanReport};
use crate::error::CascadeError;
use crate::features::FeatureExtractor;
use crate::image::ImageF32;
use crate::pyramid::{Dims, ScalePyramid};
use log::{debug, info};
use std::time::Instant;

pub struct MultiScaleScanner<E: FeatureExtractor> {
    extractor: E,
    pyramid: Option<ScalePyramid>,
}

impl<E: FeatureExtractor> MultiScaleScanner<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            pyramid: None,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn pyramid(&self) -> Option<&ScalePyramid> {
        self.pyramid.as_ref()
    }

    /// Build the pyramid for `width × height` frames. A pyramid with the same
    /// parameters is reused as is; otherwise the extractor is reset and
    /// configured for the new levels only.
    pub fn configure(
        &mut self,
        width: usize,
        height: usize,
        stage_count: usize,
    ) -> Result<&ScalePyramid, CascadeError> {
        let cached = self
            .pyramid
            .as_ref()
            .is_some_and(|p| p.matches(width, height, stage_count));
        if !cached {
            let pyramid = ScalePyramid::configure(width, height, stage_count)?;
            self.extractor.reset();
            for level in pyramid.levels() {
                self.extractor.configure(level.dims);
            }
            debug!(
                "MultiScaleScanner::configure {}x{} stage_count={} levels={}",
                width,
                height,
                stage_count,
                pyramid.len()
            );
            self.pyramid = Some(pyramid);
        }
        self.pyramid.as_ref().ok_or(CascadeError::ScanNotConfigured)
    }

    /// Extract features at every pyramid level.
    pub fn scan(&mut self, image: &ImageF32) -> Result<ScanReport, CascadeError> {
        self.walk(image, None)
    }

    /// [`MultiScaleScanner::scan`] plus a cascade verdict per level.
    pub fn detect(
        &mut self,
        image: &ImageF32,
        cascade: &mut Cascade,
    ) -> Result<ScanReport, CascadeError> {
        self.walk(image, Some(cascade))
    }

    fn walk(
        &mut self,
        image: &ImageF32,
        mut cascade: Option<&mut Cascade>,
    ) -> Result<ScanReport, CascadeError> {
        let pyramid = self.pyramid.as_ref().ok_or(CascadeError::ScanNotConfigured)?;
        let source = image.dims();
        let total_start = Instant::now();
        let mut observations = Vec::with_capacity(pyramid.len());
        let mut prev: Dims = source;
        for level in pyramid.levels() {
            let start = Instant::now();
            let dims = level.dims;
            let scale = prev.w as f32 / dims.w as f32;
            let features = self.extractor.extract(image, dims, scale);
            let verdict = cascade.as_deref_mut().map(|c| c.run(&features));
            observations.push(ScaleObservation {
                level_index: level.index,
                dims,
                scale,
                features,
                verdict,
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            });
            prev = dims;
        }
        let report = ScanReport::new(
            source,
            observations,
            total_start.elapsed().as_secs_f64() * 1000.0,
        );
        info!(
            "Execution time: {:.3}ms, average {:.3}ms per scale ({} scales)",
            report.total_ms,
            report.average_ms,
            report.levels.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::StumpStage;
    use crate::features::GridFeatureExtractor;

    /// Records the calls it receives.
    #[derive(Default)]
    struct Probe {
        resets: usize,
        configured: Vec<Dims>,
        extracted: Vec<(Dims, f32)>,
    }

    impl FeatureExtractor for Probe {
        fn feature_len(&self) -> usize {
            1
        }
        fn reset(&mut self) {
            self.resets += 1;
        }
        fn configure(&mut self, dims: Dims) {
            self.configured.push(dims);
        }
        fn extract(&mut self, _image: &ImageF32, dims: Dims, scale: f32) -> Vec<f32> {
            self.extracted.push((dims, scale));
            vec![dims.w as f32]
        }
    }

    #[test]
    fn scan_before_configure_fails() {
        let mut scanner = MultiScaleScanner::new(Probe::default());
        let err = scanner.scan(&ImageF32::new(8, 8)).unwrap_err();
        assert_eq!(err, CascadeError::ScanNotConfigured);
    }

    #[test]
    fn configure_is_cached_per_parameters() {
        let mut scanner = MultiScaleScanner::new(Probe::default());
        let levels = scanner.configure(640, 480, 10).unwrap().len();
        assert_eq!(scanner.extractor().configured.len(), levels);
        scanner.configure(640, 480, 10).unwrap();
        assert_eq!(scanner.extractor().configured.len(), levels);
        assert_eq!(scanner.extractor().resets, 1);
        scanner.configure(320, 240, 10).unwrap();
        assert_eq!(scanner.extractor().configured.len(), 2 * levels);
        assert_eq!(scanner.extractor().resets, 2);
    }

    #[test]
    fn reconfiguring_bounds_the_layout_cache() {
        let mut scanner = MultiScaleScanner::new(GridFeatureExtractor::default());
        for (w, h) in [(640, 480), (800, 600), (1024, 768), (640, 480)] {
            let levels = scanner.configure(w, h, 10).unwrap().len();
            assert_eq!(scanner.extractor().cached_layouts(), levels);
        }
    }

    #[test]
    fn invalid_configuration_keeps_previous_pyramid() {
        let mut scanner = MultiScaleScanner::new(Probe::default());
        scanner.configure(64, 48, 4).unwrap();
        assert!(scanner.configure(64, 48, 0).is_err());
        assert_eq!(scanner.extractor().resets, 1);
        assert!(scanner.pyramid().is_some_and(|p| p.matches(64, 48, 4)));
    }

    #[test]
    fn scan_visits_levels_with_relative_scales() {
        let mut scanner = MultiScaleScanner::new(Probe::default());
        scanner.configure(640, 480, 10).unwrap();
        let report = scanner.scan(&ImageF32::new(640, 480)).unwrap();
        assert_eq!(report.levels.len(), 10);
        assert_eq!(report.source, Dims::new(640, 480));
        assert_eq!(report.levels[0].scale, 1.0);
        assert!((report.levels[1].scale - 640.0 / 576.0).abs() < 1e-6);
        assert!(report.levels.iter().all(|o| o.verdict.is_none()));
        assert!(report.total_ms >= 0.0);
        assert!((report.average_ms * 10.0 - report.total_ms).abs() < 1e-9);

        let extracted = &scanner.extractor().extracted;
        assert_eq!(extracted.len(), 10);
        assert_eq!(extracted[9].0, Dims::new(64, 48));
    }

    #[test]
    fn detect_attaches_verdicts() {
        let mut scanner = MultiScaleScanner::new(Probe::default());
        scanner.configure(640, 480, 10).unwrap();
        // Fires on levels at least 300 pixels wide.
        let mut cascade = Cascade::with_stages(vec![Box::new(StumpStage::new(0, 300.0, true))]);
        let report = scanner
            .detect(&ImageF32::new(640, 480), &mut cascade)
            .unwrap();
        let hits: Vec<usize> = report.detections().map(|o| o.dims.w).collect();
        assert_eq!(hits, vec![640, 576, 512, 448, 384, 320]);
        assert!(report.any_detection());
    }

    #[test]
    fn grid_extractor_vectors_have_constant_length() {
        let extractor = GridFeatureExtractor::default();
        let len = extractor.feature_len();
        let mut scanner = MultiScaleScanner::new(extractor);
        scanner.configure(40, 30, 5).unwrap();
        let report = scanner.scan(&ImageF32::new(40, 30)).unwrap();
        assert!(!report.levels.is_empty());
        assert!(report.levels.iter().all(|o| o.features.len() == len));
    }
}
