use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

pub const ROLE_PROPIETARIO: &str = "propietario";
pub const ROLE_ADMIN: &str = "admin";

/// Direct role claims are preferred over identity-provider metadata blobs.
const DIRECT_ROLE_CLAIM_KEYS: [&str; 3] = ["role", "user_role", "app_role"];
const METADATA_CLAIM_KEYS: [&str; 2] = ["app_metadata", "user_metadata"];

/// Flat string view over a decoded token's claims. Non-string claim values
/// keep their raw JSON text so metadata blobs stay parseable.
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    claims: HashMap<String, String>,
}

impl ClaimSet {
    pub fn from_json(claims: &serde_json::Map<String, Value>) -> Self {
        let claims = claims
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();
        Self { claims }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            claims: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.claims.get(key).map(String::as_str)
    }

    /// Subject id bridging the token to the internal users table.
    pub fn auth_user_id(&self) -> Option<Uuid> {
        self.get("sub")
            .or_else(|| self.get("nameid"))
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }
}

pub fn resolve_role(claims: &ClaimSet) -> Option<String> {
    for key in DIRECT_ROLE_CLAIM_KEYS {
        if let Some(value) = claims.get(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_lowercase());
            }
        }
    }

    for key in METADATA_CLAIM_KEYS {
        if let Some(role) = extract_role_from_json(claims.get(key)) {
            return Some(role);
        }
    }

    None
}

/// Case-insensitive membership test; a principal with no resolvable role
/// is in no role.
pub fn is_in_any_role(claims: &ClaimSet, allowed_roles: &[&str]) -> bool {
    match resolve_role(claims) {
        Some(resolved) => allowed_roles
            .iter()
            .any(|role| role.eq_ignore_ascii_case(&resolved)),
        None => false,
    }
}

fn extract_role_from_json(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    // Malformed metadata is treated as absent, never as an error.
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let role = parsed.get("role")?.as_str()?.trim();
    if role.is_empty() {
        None
    } else {
        Some(role.to_lowercase())
    }
}
