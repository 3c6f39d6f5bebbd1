//! K-means clustering engine
//!
//! The engine moves once from `Untrained` to `Trained`. Training happens at
//! most once per engine, under a mutex, and publishes an immutable model that
//! concurrent readers share without locking. Retraining means building a new
//! engine.

use crate::config::{ClusteringConfig, FeatureConfig};
use crate::features::{FeatureInput, Standardizer, FEATURE_DIMENSIONS};
use crate::seed::{seed_dataset, TrainingSample};
use crate::validation;
use chrono::Utc;
use mindscreen_core::{
    ClusterAssignment, ClusterData, Error, Result, RiskLevel, ValidationMetrics,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Lifecycle state of a clustering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Untrained,
    Trained,
}

/// Everything a fit produces; immutable once published
#[derive(Debug, Clone)]
pub struct KMeansModel {
    pub clusters: Vec<ClusterData>,
    pub standardizer: Standardizer,
    pub training_assignments: Vec<ClusterAssignment>,
    pub validation: ValidationMetrics,
}

pub struct ClusteringEngine {
    config: ClusteringConfig,
    features: FeatureConfig,
    model: OnceLock<Arc<KMeansModel>>,
    training: Mutex<()>,
}

impl ClusteringEngine {
    /// Untrained engine; rejects settings k-means cannot run with
    pub fn new(config: ClusteringConfig, features: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::unchecked(config, features))
    }

    fn unchecked(config: ClusteringConfig, features: FeatureConfig) -> Self {
        Self {
            config,
            features,
            model: OnceLock::new(),
            training: Mutex::new(()),
        }
    }

    pub fn state(&self) -> ModelState {
        if self.model.get().is_some() {
            ModelState::Trained
        } else {
            ModelState::Untrained
        }
    }

    pub fn is_trained(&self) -> bool {
        self.state() == ModelState::Trained
    }

    /// Train on the built-in seed dataset unless already trained
    pub fn ensure_trained(&self) -> Result<Arc<KMeansModel>> {
        self.train(&seed_dataset())
    }

    /// Fit the model; later calls return the first model unchanged
    pub fn train(&self, samples: &[TrainingSample]) -> Result<Arc<KMeansModel>> {
        if let Some(model) = self.model.get() {
            debug!("clustering model already trained, skipping");
            return Ok(Arc::clone(model));
        }

        let _guard = self.training.lock();
        if let Some(model) = self.model.get() {
            debug!("clustering model trained by a concurrent caller, skipping");
            return Ok(Arc::clone(model));
        }

        let k = self.config.k;
        if samples.len() < k {
            return Err(Error::config(format!(
                "clustering needs at least {k} training samples, got {}",
                samples.len()
            )));
        }

        info!(k, samples = samples.len(), "training clustering model");
        let model = Arc::new(self.fit(samples));
        info!(
            clusters = model.clusters.len(),
            accuracy = model.validation.accuracy,
            "clustering model trained"
        );

        Ok(Arc::clone(self.model.get_or_init(|| model)))
    }

    fn fit(&self, samples: &[TrainingSample]) -> KMeansModel {
        let raw: Vec<[f64; FEATURE_DIMENSIONS]> = samples
            .iter()
            .map(|s| s.features.to_vector(&self.features))
            .collect();
        let standardizer = Standardizer::fit(&raw);
        let points: Vec<Vec<f64>> = raw.iter().map(|p| standardizer.transform(p)).collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let centroids = kmeans(&points, self.config.k, self.config.iterations, &mut rng);

        let now = Utc::now();
        let training_assignments: Vec<ClusterAssignment> = points
            .iter()
            .map(|p| {
                let (cluster_id, distance, confidence) = self.nearest(&centroids, p);
                ClusterAssignment {
                    cluster_id,
                    confidence,
                    timestamp: now,
                    features: p.clone(),
                    distance_to_center: distance,
                }
            })
            .collect();

        let clusters: Vec<ClusterData> = centroids
            .iter()
            .enumerate()
            .map(|(id, centroid)| {
                let members: Vec<usize> = training_assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| a.cluster_id == id)
                    .map(|(i, _)| i)
                    .collect();

                let labels: Vec<f64> = members.iter().filter_map(|&i| samples[i].phq9_score).collect();
                let avg_phq9_score = if labels.is_empty() {
                    self.config.fallback_phq9_for(id)
                } else {
                    labels.iter().sum::<f64>() / labels.len() as f64
                };

                let avg_confidence = if members.is_empty() {
                    0.0
                } else {
                    members
                        .iter()
                        .map(|&i| training_assignments[i].confidence)
                        .sum::<f64>()
                        / members.len() as f64
                };

                ClusterData {
                    id,
                    centroid: centroid.clone(),
                    size: members.len(),
                    risk_level: RiskLevel::from_phq9(avg_phq9_score),
                    characteristics: self.config.characteristics_for(id),
                    avg_phq9_score,
                    avg_confidence,
                }
            })
            .collect();

        let predicted: Vec<RiskLevel> = training_assignments
            .iter()
            .map(|a| clusters[a.cluster_id].risk_level)
            .collect();
        let actual: Vec<RiskLevel> = samples.iter().map(|s| s.risk_level).collect();
        let validation = validation::validate(&predicted, &actual);

        KMeansModel {
            clusters,
            standardizer,
            training_assignments,
            validation,
        }
    }

    /// Assign a message to its nearest cluster; `None` while untrained
    pub fn assign(&self, input: &FeatureInput) -> Option<ClusterAssignment> {
        let Some(model) = self.model.get() else {
            debug!("clustering model not trained, no assignment");
            return None;
        };

        let features = model.standardizer.transform(&input.to_vector(&self.features));
        let centroids: Vec<Vec<f64>> = model.clusters.iter().map(|c| c.centroid.clone()).collect();
        let (cluster_id, distance, confidence) = self.nearest(&centroids, &features);

        Some(ClusterAssignment {
            cluster_id,
            confidence,
            timestamp: Utc::now(),
            features,
            distance_to_center: distance,
        })
    }

    /// (index, distance, gap confidence) of the nearest centroid
    fn nearest(&self, centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64, f64) {
        let mut best = (0, f64::INFINITY);
        let mut second = f64::INFINITY;

        for (i, centroid) in centroids.iter().enumerate() {
            let d = euclidean(point, centroid);
            if d < best.1 {
                second = best.1;
                best = (i, d);
            } else if d < second {
                second = d;
            }
        }

        let confidence = assignment_confidence(
            best.1,
            second,
            self.config.confidence_floor,
            self.config.confidence_ceiling,
        );
        (best.0, best.1, confidence)
    }

    pub fn model(&self) -> Option<Arc<KMeansModel>> {
        self.model.get().cloned()
    }

    pub fn clusters(&self) -> Vec<ClusterData> {
        self.model
            .get()
            .map(|m| m.clusters.clone())
            .unwrap_or_default()
    }

    pub fn cluster(&self, id: usize) -> Option<ClusterData> {
        self.model.get().and_then(|m| m.clusters.get(id).cloned())
    }

    pub fn validation_metrics(&self) -> Option<ValidationMetrics> {
        self.model.get().map(|m| m.validation)
    }

    pub fn training_assignments(&self) -> Vec<ClusterAssignment> {
        self.model
            .get()
            .map(|m| m.training_assignments.clone())
            .unwrap_or_default()
    }
}

impl Default for ClusteringEngine {
    fn default() -> Self {
        Self::unchecked(ClusteringConfig::default(), FeatureConfig::default())
    }
}

pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Gap between nearest and runner-up distance, relative to the runner-up
///
/// Exactly 1.0 on a tie; otherwise clamped to `[floor, ceiling]`. With a
/// single centroid there is no runner-up and the ceiling is returned.
pub fn assignment_confidence(nearest: f64, second: f64, floor: f64, ceiling: f64) -> f64 {
    if nearest == second {
        return 1.0;
    }
    if !second.is_finite() {
        return ceiling;
    }
    ((second - nearest) / second).clamp(floor, ceiling)
}

/// Fixed-budget k-means over standardized points
///
/// Initial centroids are `k` distinct points sampled with `rng`. Each round
/// assigns points to their nearest centroid and moves non-empty centroids to
/// their members' mean.
pub fn kmeans(points: &[Vec<f64>], k: usize, iterations: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let k = k.min(points.len());
    let mut centroids: Vec<Vec<f64>> = rand::seq::index::sample(rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].clone())
        .collect();

    let dims = points.first().map(Vec::len).unwrap_or(0);

    for _ in 0..iterations {
        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];

        for point in points {
            let nearest = centroids
                .iter()
                .enumerate()
                .map(|(i, c)| (i, euclidean(point, c)))
                .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
                .0;
            counts[nearest] += 1;
            for (s, v) in sums[nearest].iter_mut().zip(point) {
                *s += v;
            }
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            if counts[c] == 0 {
                continue;
            }
            for (slot, sum) in centroid.iter_mut().zip(&sums[c]) {
                *slot = sum / counts[c] as f64;
            }
        }
    }

    centroids
}
