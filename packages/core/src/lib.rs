//! Sightline core.
//!
//! Lazily acquires an image classification model (accelerated device first,
//! CPU as the one sanctioned fallback), runs uploads through it with latency
//! measurement and derives evaluation statistics from the resulting score
//! distribution.
//!
//! ```no_run
//! # async fn run(loader: std::sync::Arc<dyn sightline::ModelLoader>, bytes: Vec<u8>) {
//! use sightline::{Orchestrator, SightlineConfig, notice_channel};
//!
//! let config = SightlineConfig::from_env();
//! sightline::logging::init(&config.log_filter);
//!
//! let (notices, _stream) = notice_channel();
//! let orchestrator = Orchestrator::from_config(&config, loader, notices);
//! let report = orchestrator.upload_image(&bytes).await;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod notice;
pub mod orchestrator;

pub use config::SightlineConfig;
pub use error::{ErrorKind, SightlineError, SightlineResult};
pub use executor::{Classification, ClassificationExecutor};
pub use lifecycle::{LifecycleState, LifecycleStatus, ModelHandle, ModelLifecycleManager};
pub use metrics::{MetricsEngine, MetricsSummary, TOP_K, summarize};
pub use notice::{Notice, NoticeKind, NoticeSender, NoticeStream, notice_channel};
pub use orchestrator::{ClassificationReport, Orchestrator};

pub use sightline_model_provider::{
    ClassifierOptions, ImageClassifierLogic, ModelLoader, decode_image,
};
pub use sightline_types::{
    ClassificationResult, ConfidenceLevel, DeviceMode, RankedScore, ScoreDistribution,
};

pub use sightline_model_provider;
pub use sightline_types;
