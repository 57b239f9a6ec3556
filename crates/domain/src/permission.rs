use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use talentgate_core::AppError;

/// Feature area a permission protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionCategory {
    /// Account and profile management.
    User,
    /// Posts, reels and other published content.
    Content,
    /// Job postings and applications.
    Jobs,
    /// Uploaded photos, audio and video.
    Media,
    /// Administrative tooling.
    Admin,
    /// AI-assisted features.
    Ai,
    /// Subscriptions and invoices.
    Billing,
    /// Operational and system settings.
    System,
}

impl PermissionCategory {
    /// Returns the stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Content => "CONTENT",
            Self::Jobs => "JOBS",
            Self::Media => "MEDIA",
            Self::Admin => "ADMIN",
            Self::Ai => "AI",
            Self::Billing => "BILLING",
            Self::System => "SYSTEM",
        }
    }

    /// Returns all known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionCategory] = &[
            PermissionCategory::User,
            PermissionCategory::Content,
            PermissionCategory::Jobs,
            PermissionCategory::Media,
            PermissionCategory::Admin,
            PermissionCategory::Ai,
            PermissionCategory::Billing,
            PermissionCategory::System,
        ];

        ALL
    }
}

impl Display for PermissionCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| {
                AppError::Validation(format!("unknown permission category '{value}'"))
            })
    }
}

/// Operation performed within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionAction {
    /// Create new items.
    Create,
    /// Read or list items.
    Read,
    /// Modify existing items.
    Update,
    /// Remove items.
    Delete,
    /// Upload binary assets.
    Upload,
    /// Invoke a feature.
    Use,
    /// Administer every item in the category.
    Manage,
    /// Make items publicly visible.
    Publish,
    /// Review or take down items created by others.
    Moderate,
    /// Export data out of the platform.
    Export,
}

impl PermissionAction {
    /// Returns the stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Upload => "UPLOAD",
            Self::Use => "USE",
            Self::Manage => "MANAGE",
            Self::Publish => "PUBLISH",
            Self::Moderate => "MODERATE",
            Self::Export => "EXPORT",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionAction] = &[
            PermissionAction::Create,
            PermissionAction::Read,
            PermissionAction::Update,
            PermissionAction::Delete,
            PermissionAction::Upload,
            PermissionAction::Use,
            PermissionAction::Manage,
            PermissionAction::Publish,
            PermissionAction::Moderate,
            PermissionAction::Export,
        ];

        ALL
    }
}

impl Display for PermissionAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| AppError::Validation(format!("unknown permission action '{value}'")))
    }
}

/// Optional qualifier narrowing a permission to a class of objects.
///
/// Scopes are trimmed and lowercased on construction; comparison is exact on
/// the normalized value. The `all` scope on a grant covers every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceScope(Cow<'static, str>);

impl ResourceScope {
    /// Wildcard scope value.
    pub const ALL_VALUE: &'static str = "all";

    /// Scope covering every object.
    pub const ALL: Self = Self::from_static(Self::ALL_VALUE);
    /// Scope covering objects owned by the actor.
    pub const OWN: Self = Self::from_static("own");
    /// Scope covering the actor's own profile.
    pub const OWN_PROFILE: Self = Self::from_static("own_profile");

    /// Wraps a compile-time scope that is already normalized.
    #[must_use]
    pub const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Creates a normalized scope from caller or storage input.
    pub fn new(value: impl AsRef<str>) -> Result<Self, AppError> {
        let normalized = value.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(AppError::Validation(
                "resource scope must not be empty or whitespace".to_owned(),
            ));
        }
        if normalized.contains(['.', ':']) {
            return Err(AppError::Validation(format!(
                "resource scope '{normalized}' must not contain '.' or ':'"
            )));
        }

        Ok(Self(Cow::Owned(normalized)))
    }

    /// Returns the normalized scope value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is the wildcard scope.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.as_str() == Self::ALL_VALUE
    }
}

impl Display for ResourceScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for ResourceScope {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceScope> for String {
    fn from(value: ResourceScope) -> Self {
        value.0.into_owned()
    }
}

/// Returns whether a grant scope covers a requested scope.
///
/// An unscoped request is covered by any grant. A scoped request needs the
/// same scope or the `all` wildcard on the grant.
#[must_use]
pub fn scope_covers(granted: Option<&ResourceScope>, requested: Option<&ResourceScope>) -> bool {
    match requested {
        None => true,
        Some(requested) => granted.is_some_and(|scope| scope.is_all() || scope == requested),
    }
}

/// Protectable capability identified by category, action and optional scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    /// Feature area.
    pub category: PermissionCategory,
    /// Operation within the area.
    pub action: PermissionAction,
    /// Optional resource scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceScope>,
}

impl Permission {
    /// Creates an unscoped permission.
    #[must_use]
    pub const fn new(category: PermissionCategory, action: PermissionAction) -> Self {
        Self {
            category,
            action,
            resource: None,
        }
    }

    /// Creates a permission scoped to a compile-time resource.
    #[must_use]
    pub const fn scoped(
        category: PermissionCategory,
        action: PermissionAction,
        resource: &'static str,
    ) -> Self {
        Self {
            category,
            action,
            resource: Some(ResourceScope::from_static(resource)),
        }
    }

    /// Returns a copy of this permission narrowed to another scope.
    #[must_use]
    pub fn with_resource(&self, resource: ResourceScope) -> Self {
        Self {
            category: self.category,
            action: self.action,
            resource: Some(resource),
        }
    }

    /// Parses the transport form `CATEGORY.ACTION[:resource]`.
    ///
    /// Category and action are matched case-insensitively. The result is not
    /// checked against the catalog; use `catalog::lookup` for that.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let (key, resource) = match value.split_once(':') {
            Some((key, resource)) => (key, Some(ResourceScope::new(resource)?)),
            None => (value, None),
        };

        let Some((category, action)) = key.split_once('.') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must look like CATEGORY.ACTION[:resource]"
            )));
        };

        Ok(Self {
            category: PermissionCategory::from_str(category)?,
            action: PermissionAction::from_str(action)?,
            resource,
        })
    }

    /// Returns the transport form `CATEGORY.ACTION[:resource]`.
    #[must_use]
    pub fn as_transport(&self) -> String {
        self.to_string()
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.category, self.action)?;
        if let Some(resource) = &self.resource {
            write!(formatter, ":{resource}")?;
        }

        Ok(())
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
