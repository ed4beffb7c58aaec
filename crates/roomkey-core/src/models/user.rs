use serde::{Deserialize, Serialize};

/// Profile of the signed-in customer as returned by `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(alias = "name")]
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "avatar_url")]
    pub profile_image_url: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.email
        } else {
            &self.full_name
        }
    }

    /// Initials for an avatar placeholder when no image URL is set
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// The profile endpoint answers either with the bare profile or with a
/// resource envelope `{"data": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProfileEnvelope {
    Wrapped { data: UserProfile },
    Bare(UserProfile),
}

impl ProfileEnvelope {
    pub(crate) fn into_profile(self) -> UserProfile {
        match self {
            ProfileEnvelope::Wrapped { data } => data,
            ProfileEnvelope::Bare(profile) => profile,
        }
    }
}
