use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{SubmissionError, SubmissionStep};
use crate::k8s::ClusterApi;
use crate::model::BackupConfig;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success { completed: Vec<SubmissionStep> },
    Failed(SubmissionError),
}

impl SubmissionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Success { .. } => "success",
            Self::Failed(_) => "failed",
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SubmitPlan {
    pub admin_namespace: String,
    pub config_map_name: String,
    pub secret_name: String,
    pub threshold_capacity: String,
    pub cluster_label: Option<(String, String)>,
}

impl SubmitPlan {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            admin_namespace: settings.admin_namespace.clone(),
            config_map_name: settings.config_map_name.clone(),
            secret_name: settings.secret_name.clone(),
            threshold_capacity: settings.threshold_capacity.clone(),
            cluster_label: settings
                .label_cluster
                .then(|| settings.protection_label.clone()),
        }
    }
}

pub fn build_config_map(config: &BackupConfig, plan: &SubmitPlan) -> ConfigMap {
    let data = BTreeMap::from([
        ("bucketName".to_string(), config.bucket_name.clone()),
        ("region".to_string(), config.region.clone()),
        (
            "thresholdCapacity".to_string(),
            plan.threshold_capacity.clone(),
        ),
        ("backupNS".to_string(), config.backup_namespace.clone()),
    ]);

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(plan.config_map_name.clone()),
            namespace: Some(plan.admin_namespace.clone()),
            ..Default::default()
        },
        data: Some(data),
        binary_data: Some(BTreeMap::new()),
        immutable: Some(false),
    }
}

pub fn build_secret(config: &BackupConfig, plan: &SubmitPlan) -> Secret {
    let data = BTreeMap::from([
        (
            "accessKey".to_string(),
            ByteString(config.access_key.as_bytes().to_vec()),
        ),
        (
            "secretKey".to_string(),
            ByteString(config.secret_key.as_bytes().to_vec()),
        ),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(plan.secret_name.clone()),
            namespace: Some(plan.admin_namespace.clone()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Runs the mutation steps strictly in order. The first failure stops the run; earlier
/// writes stay in place and are listed in the error.
pub async fn submit(
    api: &dyn ClusterApi,
    config: &BackupConfig,
    plan: &SubmitPlan,
) -> Result<Vec<SubmissionStep>, SubmissionError> {
    let mut completed = Vec::new();

    if let Some((key, value)) = &plan.cluster_label {
        if config.source_cluster.is_empty() {
            warn!("no source cluster selected, skipping {key}={value} label");
        } else {
            info!(cluster = %config.source_cluster, "adding {key}={value} label");
            api.label_managed_cluster(&config.source_cluster, key, value)
                .await
                .map_err(|source| failure(SubmissionStep::LabelCluster, source, &completed))?;
            completed.push(SubmissionStep::LabelCluster);
        }
    }

    let config_map = build_config_map(config, plan);
    info!(
        namespace = %plan.admin_namespace,
        name = %plan.config_map_name,
        "creating config map"
    );
    api.create_config_map(&plan.admin_namespace, &config_map)
        .await
        .map_err(|source| failure(SubmissionStep::CreateConfigMap, source, &completed))?;
    completed.push(SubmissionStep::CreateConfigMap);

    let secret = build_secret(config, plan);
    info!(
        namespace = %plan.admin_namespace,
        name = %plan.secret_name,
        "creating secret"
    );
    api.create_secret(&plan.admin_namespace, &secret)
        .await
        .map_err(|source| failure(SubmissionStep::CreateSecret, source, &completed))?;
    completed.push(SubmissionStep::CreateSecret);

    info!("backup target configured");
    Ok(completed)
}

pub fn spawn_submit(
    api: Arc<dyn ClusterApi>,
    config: BackupConfig,
    plan: SubmitPlan,
    tx: mpsc::UnboundedSender<Result<Vec<SubmissionStep>, SubmissionError>>,
) {
    tokio::spawn(async move {
        let outcome = submit(api.as_ref(), &config, &plan).await;
        let _ = tx.send(outcome);
    });
}

fn failure(
    step: SubmissionStep,
    source: anyhow::Error,
    completed: &[SubmissionStep],
) -> SubmissionError {
    let error = SubmissionError {
        step,
        message: format!("{source:#}"),
        completed: completed.to_vec(),
    };
    error!(step = step.describe(), completed = ?error.completed, "submission failed: {source:#}");
    error
}
