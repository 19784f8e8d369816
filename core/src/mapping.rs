//! Rule set that maps a method name onto an HTTP verb and a URI template.
//!
//! # Design
//! Resolution is an explicit lookup, never string sniffing hidden in the
//! client. Explicit `Route`s win; otherwise the longest matching verb prefix
//! decides the verb and the remainder of the method name (kebab-cased) names
//! the resource. An empty remainder falls back to the mapping's default
//! resource:
//!
//! | method name        | verb   | template            |
//! |--------------------|--------|---------------------|
//! | `get`              | GET    | `/<default>`        |
//! | `getUserLocations` | GET    | `/user-locations`   |
//! | `create_user`      | POST   | `/user`             |
//! | `removeSession`    | DELETE | `/session`          |

use heck::ToKebabCase;
use serde::{Deserialize, Serialize};

use crate::error::RestError;
use crate::http::HttpMethod;

/// Verb prefixes installed by `MethodMapping::default`.
const DEFAULT_PREFIXES: &[(&str, HttpMethod)] = &[
    ("get", HttpMethod::Get),
    ("find", HttpMethod::Get),
    ("list", HttpMethod::Get),
    ("create", HttpMethod::Post),
    ("add", HttpMethod::Post),
    ("update", HttpMethod::Put),
    ("put", HttpMethod::Put),
    ("delete", HttpMethod::Delete),
    ("remove", HttpMethod::Delete),
];

/// Binds one method-name prefix to a verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbRule {
    pub prefix: String,
    pub http: HttpMethod,
}

/// An explicit binding of a method name to a verb and URI template.
///
/// Templates may contain `{name}` placeholders. The n-th placeholder is filled
/// from the n-th call parameter; a dotted name such as `{location.id}` reads
/// that field path out of an object parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub http: HttpMethod,
    pub uri: String,
}

impl Route {
    pub fn new(
        method: impl Into<String>,
        http: HttpMethod,
        uri: impl Into<String>,
    ) -> Result<Self, RestError> {
        let route = Self {
            method: method.into(),
            http,
            uri: uri.into(),
        };
        route.validate()?;
        Ok(route)
    }

    /// Checks that the template is well formed and that body-carrying verbs
    /// never pull parameters into the URL.
    pub fn validate(&self) -> Result<(), RestError> {
        let parts = parse_template(&self.method, &self.uri)?;
        let placeholders = parts
            .iter()
            .filter(|part| matches!(part, TemplatePart::Placeholder(_)))
            .count();
        if self.http.has_body() && placeholders > 0 {
            return Err(RestError::InvalidRoute {
                method: self.method.clone(),
                reason: format!("{} routes carry parameters in the body, not the URI", self.http),
            });
        }
        Ok(())
    }
}

/// A resolved method: the verb plus the URI template to expand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub http: HttpMethod,
    pub template: String,
}

/// The rule set consulted for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMapping {
    resource: Option<String>,
    prefixes: Vec<VerbRule>,
    routes: Vec<Route>,
}

impl Default for MethodMapping {
    fn default() -> Self {
        Self {
            resource: None,
            prefixes: DEFAULT_PREFIXES
                .iter()
                .map(|(prefix, http)| VerbRule {
                    prefix: (*prefix).to_string(),
                    http: *http,
                })
                .collect(),
            routes: Vec::new(),
        }
    }
}

impl MethodMapping {
    /// Default prefix rules with `resource` used for bare verb names such as
    /// `get` or `create`.
    pub fn new(resource: &str) -> Self {
        Self::default().with_resource(resource)
    }

    pub fn with_resource(mut self, resource: &str) -> Self {
        let trimmed = resource.trim_matches('/');
        self.resource = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Add or replace the verb bound to `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>, http: HttpMethod) -> Self {
        let prefix = prefix.into();
        self.prefixes.retain(|rule| rule.prefix != prefix);
        self.prefixes.push(VerbRule { prefix, http });
        self
    }

    /// Add or replace the explicit route for `route.method`.
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.retain(|existing| existing.method != route.method);
        self.routes.push(route);
        self
    }

    /// Add several routes, validating each one.
    pub fn with_routes(
        mut self,
        routes: impl IntoIterator<Item = Route>,
    ) -> Result<Self, RestError> {
        for route in routes {
            route.validate()?;
            self = self.with_route(route);
        }
        Ok(self)
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn prefixes(&self) -> &[VerbRule] {
        &self.prefixes
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolve a method name to its verb and URI template.
    pub fn resolve(&self, method: &str) -> Result<Resolution, RestError> {
        if let Some(route) = self.routes.iter().find(|route| route.method == method) {
            return Ok(Resolution {
                http: route.http,
                template: route.uri.clone(),
            });
        }

        let (rule, remainder) = self
            .prefixes
            .iter()
            .filter_map(|rule| strip_verb_prefix(method, &rule.prefix).map(|rest| (rule, rest)))
            .max_by_key(|(rule, _)| rule.prefix.len())
            .ok_or_else(|| RestError::UnsupportedMethod {
                method: method.to_string(),
                reason: "no route or verb prefix matches".to_string(),
            })?;

        let resource = if remainder.is_empty() {
            self.resource.clone().ok_or_else(|| RestError::UnsupportedMethod {
                method: method.to_string(),
                reason: "method names no resource and no default resource is configured"
                    .to_string(),
            })?
        } else {
            remainder.to_kebab_case()
        };

        Ok(Resolution {
            http: rule.http,
            template: format!("/{resource}"),
        })
    }
}

/// Returns the part of `method` after `prefix` when the prefix ends on a word
/// boundary (end of name, camelCase hump or `_`).
fn strip_verb_prefix<'a>(method: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = method.strip_prefix(prefix)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_ascii_uppercase() => Some(rest),
        Some('_') => Some(&rest[1..]),
        Some(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplatePart<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

pub(crate) fn parse_template<'a>(
    method: &str,
    template: &'a str,
) -> Result<Vec<TemplatePart<'a>>, RestError> {
    let invalid = |reason: &str| RestError::InvalidRoute {
        method: method.to_string(),
        reason: format!("{reason} in `{template}`"),
    };

    let mut parts = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if open > 0 {
            parts.push(TemplatePart::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| invalid("unclosed placeholder"))?;
        let name = after[..close].trim();
        if name.is_empty() || name.contains('{') {
            return Err(invalid("empty or nested placeholder"));
        }
        parts.push(TemplatePart::Placeholder(name));
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(invalid("unmatched `}`"));
    }
    if !rest.is_empty() {
        parts.push(TemplatePart::Literal(rest));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_verbs_use_default_resource() {
        let mapping = MethodMapping::new("users");
        let get = mapping.resolve("get").unwrap();
        assert_eq!(get.http, HttpMethod::Get);
        assert_eq!(get.template, "/users");
        assert_eq!(mapping.resolve("create").unwrap().http, HttpMethod::Post);
        assert_eq!(mapping.resolve("update").unwrap().http, HttpMethod::Put);
        assert_eq!(mapping.resolve("remove").unwrap().http, HttpMethod::Delete);
    }

    #[test]
    fn remainder_is_kebab_cased() {
        let mapping = MethodMapping::default();
        assert_eq!(
            mapping.resolve("getUserLocations").unwrap().template,
            "/user-locations"
        );
        assert_eq!(mapping.resolve("delete_session").unwrap().template, "/session");
    }

    #[test]
    fn prefix_needs_word_boundary() {
        let mapping = MethodMapping::new("users");
        // "getaway" is not "get" + "away"
        assert!(matches!(
            mapping.resolve("getaway"),
            Err(RestError::UnsupportedMethod { .. })
        ));
        // "address" is not "add" + "ress"
        assert!(mapping.resolve("address").is_err());
    }

    #[test]
    fn longest_prefix_wins() {
        let mapping = MethodMapping::new("users").with_prefix("getOrCreate", HttpMethod::Put);
        assert_eq!(mapping.resolve("getOrCreate").unwrap().http, HttpMethod::Put);
        assert_eq!(mapping.resolve("getOrCreate").unwrap().template, "/users");
        assert_eq!(mapping.resolve("getOrders").unwrap().http, HttpMethod::Get);
    }

    #[test]
    fn with_prefix_replaces_existing_rule() {
        let mapping = MethodMapping::new("users").with_prefix("put", HttpMethod::Post);
        assert_eq!(mapping.resolve("put").unwrap().http, HttpMethod::Post);
        assert_eq!(
            mapping.prefixes().iter().filter(|rule| rule.prefix == "put").count(),
            1
        );
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let mapping = MethodMapping::new("users");
        let err = mapping.resolve("frobnicate").unwrap_err();
        assert!(matches!(err, RestError::UnsupportedMethod { ref method, .. } if method == "frobnicate"));
    }

    #[test]
    fn bare_verb_without_default_resource_is_unsupported() {
        let err = MethodMapping::default().resolve("get").unwrap_err();
        assert!(matches!(err, RestError::UnsupportedMethod { .. }));
    }

    #[test]
    fn explicit_route_wins_over_prefix() {
        let route = Route::new(
            "getUsersFromLocation",
            HttpMethod::Get,
            "/locations/{location.id}/users",
        )
        .unwrap();
        let mapping = MethodMapping::new("users").with_route(route);
        let resolved = mapping.resolve("getUsersFromLocation").unwrap();
        assert_eq!(resolved.template, "/locations/{location.id}/users");
    }

    #[test]
    fn body_routes_reject_placeholders() {
        let err = Route::new("updateUser", HttpMethod::Put, "/users/{id}").unwrap_err();
        assert!(matches!(err, RestError::InvalidRoute { .. }));
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(Route::new("get", HttpMethod::Get, "/users/{id").is_err());
        assert!(Route::new("get", HttpMethod::Get, "/users/{}").is_err());
        assert!(Route::new("get", HttpMethod::Get, "/users/id}").is_err());
    }

    #[test]
    fn parse_template_splits_parts() {
        let parts = parse_template("m", "/a/{x}/b/{y.z}").unwrap();
        assert_eq!(
            parts,
            vec![
                TemplatePart::Literal("/a/"),
                TemplatePart::Placeholder("x"),
                TemplatePart::Literal("/b/"),
                TemplatePart::Placeholder("y.z"),
            ]
        );
    }

    #[test]
    fn routes_deserialize_from_config() {
        let routes: Vec<Route> = serde_json::from_str(
            r#"[{"method":"listActive","http":"GET","uri":"/users/active"}]"#,
        )
        .unwrap();
        let mapping = MethodMapping::default().with_routes(routes).unwrap();
        assert_eq!(mapping.routes().len(), 1);
        assert_eq!(mapping.resolve("listActive").unwrap().template, "/users/active");
    }
}
