use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT payload. `sub` is the account email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// HS256 keys and the lifetime of issued tokens
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    /// Checks signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    fn keys() -> TokenKeys {
        TokenKeys::new(b"test-secret", Duration::minutes(30))
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = keys();
        let token = keys.issue("ada@school.test").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "ada@school.test");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys();
        let token = keys
            .encode(&Claims {
                sub: "ada@school.test".to_string(),
                exp: (Utc::now() - Duration::seconds(5)).timestamp(),
            })
            .unwrap();

        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TokenKeys::new(b"another-secret", Duration::minutes(30));
        let token = other.issue("ada@school.test").unwrap();

        let err = keys().verify(&token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }
}
