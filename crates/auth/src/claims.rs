use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Decoded token payload, before normalization.
pub type RawClaims = serde_json::Map<String, Value>;

/// Claim names read from identity-provider tokens.
pub mod names {
    /// Flat, multi-valued role claim.
    pub const ROLES: &str = "roles";
    /// Per-client roles: `{ "<client>": { "roles": ["..."] } }`.
    pub const RESOURCE_ACCESS: &str = "resource_access";
    /// Group memberships (plain names or `/`-separated paths).
    pub const GROUPS: &str = "groups";
    pub const SUBJECT: &str = "sub";
    pub const PREFERRED_USERNAME: &str = "preferred_username";
    pub const USERNAME: &str = "username";
    pub const NAME: &str = "name";
}

/// Case folding used for every role/group comparison.
pub(crate) fn fold(value: &str) -> String {
    value.to_lowercase()
}

/// Normalized, immutable view over a request's identity claims.
///
/// Built exactly once per request by [`ClaimSet::from_claims`]. Malformed
/// claim data is recovered during that pass (logged, then treated as absent)
/// so every downstream check works on well-formed values only.
///
/// Roles are stored case-folded. Groups keep their original spelling (first
/// occurrence wins) and are deduplicated case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    flat_roles: BTreeSet<String>,
    client_roles: BTreeMap<String, BTreeSet<String>>,
    groups: Vec<String>,
}

impl ClaimSet {
    pub fn builder() -> ClaimSetBuilder {
        ClaimSetBuilder::default()
    }

    /// Normalize a decoded token payload.
    ///
    /// Never fails: unparsable `resource_access`/`groups` values are logged at
    /// warn level and skipped.
    pub fn from_claims(raw: &RawClaims) -> Self {
        let mut builder = ClaimSetBuilder::default();

        if let Some(value) = raw.get(names::ROLES) {
            collect_roles(value, &mut builder);
        }
        if let Some(value) = raw.get(names::RESOURCE_ACCESS) {
            collect_resource_access(value, &mut builder);
        }
        if let Some(value) = raw.get(names::GROUPS) {
            collect_groups(value, &mut builder);
        }

        builder.build()
    }

    /// Folded realm-wide roles.
    pub fn flat_roles(&self) -> impl Iterator<Item = &str> {
        self.flat_roles.iter().map(String::as_str)
    }

    pub fn has_flat_role(&self, role: &str) -> bool {
        self.flat_roles.contains(&fold(role))
    }

    /// Folded roles granted under `client_id`, if the client appears at all.
    pub fn client_roles(&self, client_id: &str) -> Option<&BTreeSet<String>> {
        self.client_roles.get(client_id)
    }

    pub fn has_client_role(&self, client_id: &str, role: &str) -> bool {
        self.client_roles
            .get(client_id)
            .is_some_and(|roles| roles.contains(&fold(role)))
    }

    pub fn clients(&self) -> impl Iterator<Item = &str> {
        self.client_roles.keys().map(String::as_str)
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

/// Incremental construction of a [`ClaimSet`] (tests, non-token sources).
#[derive(Debug, Clone, Default)]
pub struct ClaimSetBuilder {
    inner: ClaimSet,
    seen_groups: BTreeSet<String>,
}

impl ClaimSetBuilder {
    pub fn flat_role(mut self, role: impl AsRef<str>) -> Self {
        self.add_flat_role(role.as_ref());
        self
    }

    pub fn client_role(mut self, client_id: impl Into<String>, role: impl AsRef<str>) -> Self {
        self.add_client_role(client_id.into(), role.as_ref());
        self
    }

    pub fn group(mut self, group: impl AsRef<str>) -> Self {
        self.add_group(group.as_ref());
        self
    }

    pub fn groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        for group in groups {
            self.add_group(group.as_ref());
        }
        self
    }

    pub fn build(self) -> ClaimSet {
        self.inner
    }

    fn add_flat_role(&mut self, role: &str) {
        let role = role.trim();
        if !role.is_empty() {
            self.inner.flat_roles.insert(fold(role));
        }
    }

    fn add_client_role(&mut self, client_id: String, role: &str) {
        let role = role.trim();
        let roles = self.inner.client_roles.entry(client_id).or_default();
        if !role.is_empty() {
            roles.insert(fold(role));
        }
    }

    fn touch_client(&mut self, client_id: String) {
        self.inner.client_roles.entry(client_id).or_default();
    }

    fn add_group(&mut self, group: &str) {
        let group = group.trim();
        if group.is_empty() {
            return;
        }
        if self.seen_groups.insert(fold(group)) {
            self.inner.groups.push(group.to_string());
        }
    }
}

fn collect_roles(value: &Value, builder: &mut ClaimSetBuilder) {
    match value {
        Value::String(role) => builder.add_flat_role(role),
        Value::Array(items) => {
            for item in items {
                match item.as_str() {
                    Some(role) => builder.add_flat_role(role),
                    None => tracing::warn!(claim = names::ROLES, "ignoring non-string role entry"),
                }
            }
        }
        Value::Null => {}
        _ => tracing::warn!(claim = names::ROLES, "unexpected claim shape; treating as absent"),
    }
}

fn collect_resource_access(value: &Value, builder: &mut ClaimSetBuilder) {
    // Some token mappers emit the object JSON-encoded inside a string.
    let parsed;
    let object = match value {
        Value::Object(map) => map,
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => {
                parsed = map;
                &parsed
            }
            Ok(_) => {
                tracing::warn!(
                    claim = names::RESOURCE_ACCESS,
                    "encoded claim is not a JSON object; treating as absent"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(
                    claim = names::RESOURCE_ACCESS,
                    error = %e,
                    "failed to parse claim; treating as absent"
                );
                return;
            }
        },
        Value::Null => return,
        _ => {
            tracing::warn!(
                claim = names::RESOURCE_ACCESS,
                "unexpected claim shape; treating as absent"
            );
            return;
        }
    };

    for (client_id, entry) in object {
        let Some(roles) = entry.get("roles").and_then(Value::as_array) else {
            tracing::warn!(
                claim = names::RESOURCE_ACCESS,
                client_id = %client_id,
                "client entry has no roles array; ignoring client"
            );
            continue;
        };

        builder.touch_client(client_id.clone());
        for role in roles {
            match role.as_str() {
                Some(role) => builder.add_client_role(client_id.clone(), role),
                None => tracing::warn!(
                    claim = names::RESOURCE_ACCESS,
                    client_id = %client_id,
                    "ignoring non-string client role entry"
                ),
            }
        }
    }
}

fn collect_groups(value: &Value, builder: &mut ClaimSetBuilder) {
    match value {
        Value::String(group) => collect_group_value(group, builder),
        Value::Array(items) => {
            for item in items {
                match item.as_str() {
                    Some(group) => collect_group_value(group, builder),
                    None => tracing::warn!(claim = names::GROUPS, "ignoring non-string group entry"),
                }
            }
        }
        Value::Null => {}
        _ => tracing::warn!(claim = names::GROUPS, "unexpected claim shape; treating as absent"),
    }
}

/// A single group value is either a group name/path or a JSON-encoded array
/// of group names. The encoded form is replaced by its contents.
fn collect_group_value(value: &str, builder: &mut ClaimSetBuilder) {
    if !value.trim_start().starts_with('[') {
        builder.add_group(value);
        return;
    }

    match serde_json::from_str::<Vec<Value>>(value) {
        Ok(items) => {
            for item in items {
                if let Some(group) = item.as_str() {
                    builder.add_group(group);
                }
            }
        }
        Err(e) => tracing::warn!(
            claim = names::GROUPS,
            error = %e,
            "failed to parse encoded group array; ignoring value"
        ),
    }
}
