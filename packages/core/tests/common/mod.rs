#![allow(dead_code)]

use sightline::sightline_types::image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sightline::sightline_types::{Result, anyhow, async_trait, bail};
use sightline::{ClassificationResult, DeviceMode, ImageClassifierLogic, ModelLoader, ScoreDistribution};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Shared view into every classifier a [`ScriptedLoader`] hands out.
#[derive(Clone)]
pub struct ClassifierProbe {
    pub calls: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    pub delay: Duration,
    pub distribution: ScoreDistribution,
}

impl ClassifierProbe {
    pub fn new(distribution: ScoreDistribution) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            distribution,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

pub struct ScriptedClassifier {
    probe: ClassifierProbe,
}

#[async_trait]
impl ImageClassifierLogic for ScriptedClassifier {
    async fn classify(&mut self, _image: &DynamicImage) -> Result<ScoreDistribution> {
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.probe.delay.is_zero() {
            tokio::time::sleep(self.probe.delay).await;
        }
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.probe.fail.load(Ordering::SeqCst) {
            bail!("inference backend crashed");
        }
        Ok(self.probe.distribution.clone())
    }

    fn model_id(&self) -> &str {
        "scripted/mobilenet"
    }
}

/// Loader whose per-device outcome can be flipped between calls.
pub struct ScriptedLoader {
    pub accelerated_ok: AtomicBool,
    pub fallback_ok: AtomicBool,
    pub accelerated_attempts: AtomicUsize,
    pub fallback_attempts: AtomicUsize,
    pub delay: Duration,
    pub probe: ClassifierProbe,
}

impl ScriptedLoader {
    pub fn new(accelerated_ok: bool, fallback_ok: bool, probe: ClassifierProbe) -> Self {
        Self {
            accelerated_ok: AtomicBool::new(accelerated_ok),
            fallback_ok: AtomicBool::new(fallback_ok),
            accelerated_attempts: AtomicUsize::new(0),
            fallback_attempts: AtomicUsize::new(0),
            delay: Duration::ZERO,
            probe,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self) -> (usize, usize) {
        (
            self.accelerated_attempts.load(Ordering::SeqCst),
            self.fallback_attempts.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl ModelLoader for ScriptedLoader {
    async fn load(&self, device: DeviceMode) -> Result<Box<dyn ImageClassifierLogic>> {
        let ok = match device {
            DeviceMode::Accelerated => {
                self.accelerated_attempts.fetch_add(1, Ordering::SeqCst);
                self.accelerated_ok.load(Ordering::SeqCst)
            }
            DeviceMode::Fallback => {
                self.fallback_attempts.fetch_add(1, Ordering::SeqCst);
                self.fallback_ok.load(Ordering::SeqCst)
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if ok {
            Ok(Box::new(ScriptedClassifier {
                probe: self.probe.clone(),
            }))
        } else {
            Err(anyhow!("no {} device", device))
        }
    }
}

pub fn sample_distribution() -> ScoreDistribution {
    ScoreDistribution::new(vec![
        ClassificationResult::new("Tabby Cat", 0.9),
        ClassificationResult::new("Tiger Cat", 0.3),
        ClassificationResult::new("Egyptian Cat", 0.1),
    ])
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
