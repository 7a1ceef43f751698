use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::error::{Error, Result};

/// Claims carried by the hosted auth provider's access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user id
    pub sub: String,
    pub aud: String,
    pub exp: u64,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

/// Server-controlled metadata; clients cannot edit it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub premium: bool,
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub is_premium: bool,
}

/// Verifies HS256 bearer tokens and yields the viewer id
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        if settings.jwt_secret.is_empty() {
            tracing::warn!("No JWT secret configured; every authenticated request will be rejected");
        }
        Self::new(&settings.jwt_secret, &settings.audience)
    }

    /// Decode `token` into the viewer it was issued for
    pub fn verify(&self, token: &str) -> Result<Viewer> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidAudience => "invalid audience",
                _ => "invalid token",
            };
            tracing::debug!("Rejected bearer token: {}", reason);
            Error::Unauthenticated
        })?;

        let id = Uuid::try_parse(&data.claims.sub).map_err(|_| Error::Unauthenticated)?;

        Ok(Viewer {
            id,
            is_premium: data.claims.app_metadata.premium,
        })
    }

    /// Viewer id of an authenticated request
    pub fn viewer(&self, req: &HttpRequest) -> Result<Uuid> {
        self.authenticate(req).map(|viewer| viewer.id)
    }

    /// Authenticate a request from its `Authorization: Bearer` header
    pub fn authenticate(&self, req: &HttpRequest) -> Result<Viewer> {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Error::Unauthenticated)?;

        self.verify(token.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-with-enough-length-1234";

    fn token(sub: &str, aud: &str) -> String {
        token_with(sub, aud, false)
    }

    fn token_with(sub: &str, aud: &str, premium: bool) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            aud: aud.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as u64,
            app_metadata: AppMetadata { premium },
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let viewer = Uuid::new_v4();

        let verified = verifier.verify(&token(&viewer.to_string(), "authenticated")).unwrap();
        assert_eq!(verified.id, viewer);
        assert!(!verified.is_premium);
    }

    #[test]
    fn test_premium_comes_from_app_metadata() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let viewer = Uuid::new_v4();

        let req = TestRequest::default()
            .insert_header((
                AUTHORIZATION,
                format!("Bearer {}", token_with(&viewer.to_string(), "authenticated", true)),
            ))
            .to_http_request();

        assert_eq!(
            verifier.authenticate(&req).unwrap(),
            Viewer {
                id: viewer,
                is_premium: true
            }
        );
    }

    #[test]
    fn test_verify_rejects_wrong_audience_and_subject() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");

        assert!(matches!(
            verifier.verify(&token(&Uuid::new_v4().to_string(), "anon")),
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            verifier.verify(&token("not-a-uuid", "authenticated")),
            Err(Error::Unauthenticated)
        ));
    }

    #[test]
    fn test_viewer_requires_bearer_header() {
        let verifier = JwtVerifier::new(SECRET, "authenticated");
        let viewer = Uuid::new_v4();

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, format!("Bearer {}", token(&viewer.to_string(), "authenticated"))))
            .to_http_request();
        assert_eq!(verifier.viewer(&req).unwrap(), viewer);

        let req = TestRequest::default().to_http_request();
        assert!(matches!(verifier.viewer(&req), Err(Error::Unauthenticated)));
    }
}
