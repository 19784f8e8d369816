//! Authentication hook applied to every outgoing request.

use crate::error::RestError;
use crate::http::HttpRequest;

/// Adds credentials to an outgoing request. At most one is active per client.
pub trait AuthenticationStrategy: Send + Sync {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<(), RestError>;
}

/// Appends the token as a query parameter (`?token=...` by default).
#[derive(Debug, Clone)]
pub struct TokenAuthenticationStrategy {
    token: String,
    param: String,
}

impl TokenAuthenticationStrategy {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            param: "token".to_string(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }
}

impl AuthenticationStrategy for TokenAuthenticationStrategy {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        if self.token.is_empty() {
            return Err(RestError::strategy("authentication", "empty token"));
        }
        request.append_query(&self.param, &self.token);
        Ok(())
    }
}

/// Sends `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerAuthenticationStrategy {
    token: String,
}

impl BearerAuthenticationStrategy {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthenticationStrategy for BearerAuthenticationStrategy {
    fn authenticate(&self, request: &mut HttpRequest) -> Result<(), RestError> {
        if self.token.is_empty() {
            return Err(RestError::strategy("authentication", "empty bearer token"));
        }
        request.set_header("Authorization", format!("Bearer {}", self.token));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, "http://my-company.com/rest/users/1")
    }

    #[test]
    fn token_goes_into_query() {
        let mut req = request();
        TokenAuthenticationStrategy::new("qwerty").authenticate(&mut req).unwrap();
        assert_eq!(req.url, "http://my-company.com/rest/users/1?token=qwerty");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn token_param_is_configurable() {
        let mut req = request();
        TokenAuthenticationStrategy::new("k")
            .with_param("api_key")
            .authenticate(&mut req)
            .unwrap();
        assert!(req.url.ends_with("?api_key=k"));
    }

    #[test]
    fn bearer_sets_authorization() {
        let mut req = request();
        BearerAuthenticationStrategy::new("abc").authenticate(&mut req).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn empty_token_fails() {
        let mut req = request();
        let err = TokenAuthenticationStrategy::new("").authenticate(&mut req).unwrap_err();
        assert!(matches!(err, RestError::Strategy { strategy: "authentication", .. }));
    }
}
