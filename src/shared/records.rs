/**
 * Record Data Structures
 *
 * Plain transfer objects exchanged with the PHP API: documents, exigences
 * (compliance requirements), groups, members and users.
 *
 * Field names follow the server payloads (`userId`, `date_creation`,
 * `date_modification`), so records round-trip through the API untouched.
 * Audit timestamps are kept as the strings MySQL hands back.
 */
use serde::{Deserialize, Serialize};

/// A record tracked by the sync layer.
///
/// Every sync-relevant record belongs to exactly one user (`owner`) and
/// lives in one logical table (`TABLE`), which is also the resource name
/// its `SyncState` is keyed by.
pub trait SyncRecord:
    Clone + std::fmt::Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Resource/table name, e.g. `"documents"`
    const TABLE: &'static str;

    /// Record identifier
    fn record_id(&self) -> &str;

    /// Ownership tag (`userId`)
    fn owner(&self) -> &str;
}

/// Compliance document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Group the document is filed under; not checked client-side
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modification: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            group_id: None,
            file_path: None,
            date_creation: None,
            date_modification: None,
        }
    }
}

impl SyncRecord for Document {
    const TABLE: &'static str = "documents";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }
}

/// Conformity status of an exigence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConformityStatus {
    #[default]
    NonConforme,
    PartiellementConforme,
    Conforme,
    Exclusion,
}

impl ConformityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConformityStatus::NonConforme => "Non conforme",
            ConformityStatus::PartiellementConforme => "Partiellement conforme",
            ConformityStatus::Conforme => "Conforme",
            ConformityStatus::Exclusion => "Exclusion",
        }
    }
}

/// Compliance requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exigence {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ConformityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modification: Option<String>,
}

impl SyncRecord for Exigence {
    const TABLE: &'static str = "exigences";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }
}

/// Document group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modification: Option<String>,
}

impl SyncRecord for Group {
    const TABLE: &'static str = "groups";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }
}

/// Organisation member ("membres")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub nom: String,
    pub prenom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modification: Option<String>,
}

impl SyncRecord for Member {
    const TABLE: &'static str = "membres";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }
}

/// Application user, as stored under `currentUser`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prenom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<String>,
}

impl User {
    /// Name shown in the top bar
    pub fn display_name(&self) -> String {
        match (&self.prenom, &self.nom) {
            (Some(prenom), Some(nom)) => format!("{} {}", prenom, nom),
            (None, Some(nom)) => nom.clone(),
            (Some(prenom), None) => prenom.clone(),
            (None, None) if !self.email.is_empty() => self.email.clone(),
            (None, None) => self.id.clone(),
        }
    }
}
