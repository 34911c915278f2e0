use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Namespaces,
    ManagedClusters,
    Licenses,
}

impl ResourceKind {
    pub const ALL: [Self; 3] = [Self::Namespaces, Self::ManagedClusters, Self::Licenses];

    pub fn title(self) -> &'static str {
        match self {
            Self::Namespaces => "Namespaces",
            Self::ManagedClusters => "ManagedClusters",
            Self::Licenses => "Licenses",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Namespaces => "/api/v1/namespaces",
            Self::ManagedClusters => "/apis/cluster.open-cluster-management.io/v1/managedclusters",
            Self::Licenses => "/apis/triliovault.trilio.io/v1/licenses",
        }
    }

    /// (group, version, kind, plural) for kinds served through the dynamic API.
    pub fn dynamic_type(self) -> Option<(&'static str, &'static str, &'static str, &'static str)> {
        match self {
            Self::Namespaces => None,
            Self::ManagedClusters => Some((
                "cluster.open-cluster-management.io",
                "v1",
                "ManagedCluster",
                "managedclusters",
            )),
            Self::Licenses => Some(("triliovault.trilio.io", "v1", "License", "licenses")),
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Resource {
    pub name: String,
    pub uid: String,
    pub labels: BTreeMap<String, String>,
}

impl Resource {
    #[cfg(test)]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uid: format!("uid-{name}"),
            name,
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BackupConfig {
    pub source_cluster: String,
    pub secret_key: String,
    pub access_key: String,
    pub bucket_name: String,
    pub region: String,
    pub backup_namespace: String,
}

impl BackupConfig {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::SourceCluster => &self.source_cluster,
            FormField::SecretKey => &self.secret_key,
            FormField::AccessKey => &self.access_key,
            FormField::BucketName => &self.bucket_name,
            FormField::Region => &self.region,
            FormField::BackupNamespace => &self.backup_namespace,
        }
    }

    pub fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::SourceCluster => &mut self.source_cluster,
            FormField::SecretKey => &mut self.secret_key,
            FormField::AccessKey => &mut self.access_key,
            FormField::BucketName => &mut self.bucket_name,
            FormField::Region => &mut self.region,
            FormField::BackupNamespace => &mut self.backup_namespace,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FormField {
    SourceCluster,
    SecretKey,
    AccessKey,
    BucketName,
    Region,
    BackupNamespace,
}

impl FormField {
    pub const ALL: [Self; 6] = [
        Self::SourceCluster,
        Self::SecretKey,
        Self::AccessKey,
        Self::BucketName,
        Self::Region,
        Self::BackupNamespace,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::SourceCluster => "Source Cluster",
            Self::SecretKey => "AWS Secret Key",
            Self::AccessKey => "AWS Access Key",
            Self::BucketName => "AWS S3 Bucket Name",
            Self::Region => "Region",
            Self::BackupNamespace => "Backup Namespace",
        }
    }

    pub fn options_source(self) -> Option<ResourceKind> {
        match self {
            Self::SourceCluster => Some(ResourceKind::ManagedClusters),
            Self::BackupNamespace => Some(ResourceKind::Namespaces),
            _ => None,
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Self::SecretKey)
    }
}
