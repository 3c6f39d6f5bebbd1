//! Subcommand handlers

use crate::settings::Settings;
use anyhow::{Context, Result};
use mindscreen_analysis::{seed_dataset, AnalysisPipeline, ClusteringEngine};
use mindscreen_assistant::{
    Assistant, CompletionBackend, OpenAiCompatibleBackend, TherapeuticResponder,
};
use mindscreen_core::{ClusterData, ValidationMetrics};
use mindscreen_telemetry::{MetricsCollector, TopicTable};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const NEW_SESSION_COMMAND: &str = "/new";

fn trained_pipeline(settings: &Settings) -> Result<AnalysisPipeline> {
    let pipeline = AnalysisPipeline::new(settings.analysis.clone())
        .context("failed to build analysis pipeline")?;
    pipeline.warm_up().context("failed to train clustering model")?;
    Ok(pipeline)
}

pub fn analyze(settings: &Settings, text: &str, pretty: bool) -> Result<()> {
    let pipeline = trained_pipeline(settings)?;
    let result = pipeline.analyze(text);

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}

pub async fn chat(settings: &Settings, offline: bool) -> Result<()> {
    let pipeline = Arc::new(trained_pipeline(settings)?);
    let config = &settings.assistant;

    let backend: Option<Arc<dyn CompletionBackend>> = if offline {
        None
    } else if config.api_key().is_none() {
        warn!(
            env = %config.api_key_env,
            "no API key set, replies will come from the fallback table"
        );
        None
    } else {
        Some(Arc::new(OpenAiCompatibleBackend::from_config(config)?))
    };

    let metrics = MetricsCollector::new();
    let responder = TherapeuticResponder::new(config, backend)?;
    let topics = TopicTable::builtin(&config.locale)?;
    let mut assistant = Assistant::new(
        pipeline,
        responder,
        metrics.clone(),
        topics,
        config.history_window,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == NEW_SESSION_COMMAND {
            println!("{}", serde_json::to_string_pretty(&assistant.summary())?);
            assistant.new_session();
            continue;
        }

        let Some(reply) = assistant.handle_message(&line).await else {
            continue;
        };

        println!("{}", reply.response.content);
        println!(
            "  [risk: {} | sentiment: {} | confidence: {:.2} | context: {} | source: {}]",
            reply.analysis.risk_level,
            reply.analysis.sentiment,
            reply.analysis.confidence,
            reply.response.context,
            if reply.response.is_fallback() { "fallback" } else { "generated" },
        );
        for resource in &reply.response.resource_recommendations {
            println!("  - {resource}");
        }
    }

    println!("{}", serde_json::to_string_pretty(&assistant.summary())?);

    let snapshot = metrics.snapshot();
    info!(
        messages = snapshot.processed_messages,
        alerts = snapshot.alerts_generated,
        fallback_rate = snapshot.fallback_rate(),
        avg_latency_us = snapshot.avg_latency_us(),
        "chat finished"
    );
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationReport {
    clusters: Vec<ClusterData>,
    validation_metrics: Option<ValidationMetrics>,
    training_samples: usize,
}

pub fn validate(settings: &Settings) -> Result<()> {
    let engine = ClusteringEngine::new(
        settings.analysis.clustering.clone(),
        settings.analysis.features.clone(),
    )?;
    let samples = seed_dataset();
    engine.train(&samples).context("training failed")?;

    let report = ValidationReport {
        clusters: engine.clusters(),
        validation_metrics: engine.validation_metrics(),
        training_samples: samples.len(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
