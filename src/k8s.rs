use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::api::{ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

use crate::model::{Resource, ResourceKind};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>>;

    async fn label_managed_cluster(&self, name: &str, key: &str, value: &str) -> Result<()>;

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()>;
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
    cluster: String,
}

impl KubeGateway {
    pub async fn connect(context: Option<String>) -> Result<Self> {
        let kubeconfig = Kubeconfig::read().ok();

        let config = if let Some(kubeconfig_value) = kubeconfig.clone() {
            let options = KubeConfigOptions {
                context: context.clone(),
                cluster: None,
                user: None,
            };
            Config::from_custom_kubeconfig(kubeconfig_value, &options)
                .await
                .context("failed to infer Kubernetes configuration")?
        } else {
            if context.is_some() {
                anyhow::bail!("kubeconfig not found; --context is unavailable in this environment");
            }
            Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?
        };

        let cluster = config.cluster_url.to_string();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        let context = context
            .or_else(|| {
                kubeconfig
                    .as_ref()
                    .and_then(|cfg| cfg.current_context.clone())
            })
            .unwrap_or_else(|| "in-cluster".to_string());

        Ok(Self {
            client,
            context,
            cluster,
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn dynamic_api(&self, kind: ResourceKind) -> Result<Api<DynamicObject>> {
        let (group, version, type_name, plural) = kind
            .dynamic_type()
            .with_context(|| format!("{kind} is not served through the dynamic API"))?;
        let gvk = GroupVersionKind::gvk(group, version, type_name);
        let api_resource = ApiResource::from_gvk_with_plural(&gvk, plural);
        Ok(Api::all_with(self.client.clone(), &api_resource))
    }
}

#[async_trait]
impl ClusterApi for KubeGateway {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        debug!(endpoint = kind.endpoint(), "listing collection");
        match kind {
            ResourceKind::Namespaces => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                list_all(&api).await
            }
            ResourceKind::ManagedClusters | ResourceKind::Licenses => {
                list_all(&self.dynamic_api(kind)?).await
            }
        }
    }

    async fn label_managed_cluster(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let api = self.dynamic_api(ResourceKind::ManagedClusters)?;
        let cluster = api
            .get(name)
            .await
            .with_context(|| format!("failed to read managed cluster {name}"))?;
        let cluster = with_label(cluster, key, value);
        let _ = api.replace(name, &PostParams::default(), &cluster).await?;
        Ok(())
    }

    async fn create_config_map(&self, namespace: &str, config_map: &ConfigMap) -> Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let _ = api.create(&PostParams::default(), config_map).await?;
        Ok(())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let _ = api.create(&PostParams::default(), secret).await?;
        Ok(())
    }
}

fn summarize<K: ResourceExt>(object: &K) -> Resource {
    Resource {
        name: object.name_any(),
        uid: object.uid().unwrap_or_default(),
        labels: object.labels().clone(),
    }
}

fn with_label(mut cluster: DynamicObject, key: &str, value: &str) -> DynamicObject {
    cluster
        .labels_mut()
        .insert(key.to_string(), value.to_string());
    cluster
}

async fn list_all<K>(api: &Api<K>) -> Result<Vec<Resource>>
where
    K: kube::Resource + Clone + DeserializeOwned + Debug,
{
    collect_pages(|token| async move {
        let params = match &token {
            Some(token) => list_params().continue_token(token),
            None => list_params(),
        };
        let page = api.list(&params).await?;
        let items = page.iter().map(summarize).collect::<Vec<_>>();
        Ok((items, page.metadata.continue_))
    })
    .await
}

/// Follows `continue` tokens until the server reports the last page.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Resource>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<Resource>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut token = None;
    loop {
        let (page, next) = fetch_page(token.take()).await?;
        items.extend(page);
        match next.filter(|next| !next.is_empty()) {
            Some(next) => token = Some(next),
            None => return Ok(items),
        }
    }
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}
