//! Bearer-token authentication.
//!
//! Expects `Authorization: Bearer <jwt>`. The token must be signed with an
//! HMAC algorithm (`HS256`, `HS384`, `HS512`) and verify against the
//! configured key. Registered claims (`exp`, `nbf`, `aud`, ...) are not
//! checked; the decoded payload is attached to the request as [`Claims`].
//!
//! Every failure produces the same response, `401 Unauthorized` with body
//! `Unauthorized`. The cause is only visible in `debug` logs or through
//! [`BearerAuth::verify`].
//!
//! ```rust
//! use muxa::middleware::auth::{BearerAuth, Claims};
//! use muxa::{Request, Router};
//!
//! async fn me(req: Request) -> String {
//!     let sub = req.extensions().get::<Claims>().and_then(Claims::subject);
//!     format!("hello {}", sub.unwrap_or("anonymous"))
//! }
//!
//! let auth = BearerAuth::from_secret(b"change-me").into_middleware();
//! let app = Router::new().get("/me", me, [auth]);
//! ```

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use super::{from_fn, Middleware, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The only accepted signing algorithms.
const HMAC: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Why a request was rejected. All variants answer with the same 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("signing algorithm {0:?} is not HMAC")]
    Algorithm(Algorithm),

    #[error("no verification key for token")]
    UnknownKey,

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        Response::unauthorized()
    }
}

/// Payload of a verified token.
#[derive(Clone, Debug, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `sub` claim, when present and a string.
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

type KeyFn = dyn Fn(&Header) -> Option<DecodingKey> + Send + Sync + 'static;

#[derive(Clone)]
enum KeySource {
    Secret(DecodingKey),
    Lookup(Arc<KeyFn>),
}

/// Validates bearer tokens against an injected key source.
#[derive(Clone)]
pub struct BearerAuth {
    keys: KeySource,
    validation: Validation,
}

impl BearerAuth {
    /// Verifies every token against one shared secret.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Self {
        Self::with_keys(KeySource::Secret(DecodingKey::from_secret(secret.as_ref())))
    }

    /// Picks the verification key per token, typically by `kid`.
    ///
    /// The lookup is only consulted for HMAC tokens. Returning `None`
    /// rejects the request.
    pub fn from_key_fn<F>(lookup: F) -> Self
    where
        F: Fn(&Header) -> Option<DecodingKey> + Send + Sync + 'static,
    {
        Self::with_keys(KeySource::Lookup(Arc::new(lookup)))
    }

    fn with_keys(keys: KeySource) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC.to_vec();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        Self { keys, validation }
    }

    /// Checks an `Authorization` header value.
    ///
    /// A leading `Bearer ` is stripped when present; otherwise the whole
    /// value is taken as the token.
    pub fn verify(&self, authorization: Option<&str>) -> Result<Claims, AuthError> {
        let value = authorization.ok_or(AuthError::MissingHeader)?;
        let token = value.strip_prefix("Bearer ").unwrap_or(value);

        let header = decode_header(token)?;
        if !HMAC.contains(&header.alg) {
            return Err(AuthError::Algorithm(header.alg));
        }

        let looked_up;
        let key = match &self.keys {
            KeySource::Secret(key) => key,
            KeySource::Lookup(find) => {
                looked_up = find(&header).ok_or(AuthError::UnknownKey)?;
                &looked_up
            }
        };

        let data = decode::<Map<String, Value>>(token, key, &self.validation)?;
        Ok(Claims(data.claims))
    }

    pub fn into_middleware(self) -> Middleware {
        let auth = Arc::new(self);
        from_fn(move |mut req: Request, next: Next| {
            let auth = Arc::clone(&auth);
            async move {
                let verdict = auth.verify(req.header("authorization"));
                match verdict {
                    Ok(claims) => {
                        req.extensions_mut().insert(claims);
                        next.run(req).await
                    }
                    Err(e) => {
                        debug!(error = %e, path = %req.path(), "rejecting unauthenticated request");
                        e.into_response()
                    }
                }
            }
        })
    }
}

impl From<BearerAuth> for Middleware {
    fn from(auth: BearerAuth) -> Self {
        auth.into_middleware()
    }
}
