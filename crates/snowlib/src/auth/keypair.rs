//! Key-pair (JWT) authentication

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::{KeyPairConfig, Secret};
use crate::config::paths::expand_home;
use crate::{Error, Result};

/// Lifetime of an issued token; Snowflake rejects anything over one hour
const TOKEN_LIFETIME_SECS: u64 = 59 * 60;

/// Tokens are reissued this long before they expire
const REFRESH_MARGIN_SECS: u64 = 60;

/// Validate and expand `private_key_file`.
///
/// Only absolute and `~`-relative paths are accepted.
pub fn resolve_key_path(private_key_file: Option<&str>) -> Result<PathBuf> {
    let raw = private_key_file
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            Error::config(
                "Keypair authentication requires 'private_key_file' in profile configuration",
            )
        })?;

    let path = if raw.starts_with('~') {
        expand_home(raw)
    } else if Path::new(raw).is_absolute() {
        PathBuf::from(raw)
    } else {
        return Err(Error::config(format!(
            "Private key path must be absolute or use ~ for home directory.\n\
             Got: {raw}\n\n\
             Relative paths are not supported to prevent accidentally committing keys \
             to version control.\n\n\
             Valid examples:\n  \
             private_key_file = \"~/.snowflake/rsa_key.p8\"\n  \
             private_key_file = \"/home/user/.snowflake/rsa_key.p8\""
        )));
    };

    if !path.is_file() {
        return Err(Error::KeyFileNotFound(path));
    }
    Ok(path)
}

/// Account part of JWT claims: upper-cased, region suffix removed
#[must_use]
pub fn account_identifier(account: &str) -> String {
    account
        .split('.')
        .next()
        .unwrap_or(account)
        .trim()
        .to_uppercase()
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: u64,
    exp: u64,
}

struct CachedToken {
    token: String,
    expires_at: u64,
}

/// Issues RS256 JWTs for the SQL API and caches them until shortly before expiry
pub struct KeyPairAuth {
    subject: String,
    issuer: String,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for KeyPairAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairAuth")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl KeyPairAuth {
    /// Read the key file named in `config`
    pub fn load(account: &str, user: &str, config: &KeyPairConfig) -> Result<Self> {
        let pem = std::fs::read_to_string(&config.key_path).map_err(|e| {
            Error::auth(format!(
                "Failed to read private key {}: {e}",
                config.key_path.display()
            ))
        })?;
        Self::from_pem(account, user, &pem, config.passphrase.as_ref())
    }

    /// Build from PEM text: encrypted PKCS#8, plain PKCS#8 or PKCS#1
    pub fn from_pem(
        account: &str,
        user: &str,
        pem: &str,
        passphrase: Option<&Secret>,
    ) -> Result<Self> {
        let key = decode_private_key(pem, passphrase)?;

        let public_der = key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| Error::auth(format!("Failed to encode public key: {e}")))?;
        let fingerprint = STANDARD.encode(Sha256::digest(public_der.as_bytes()));

        let private_der = key
            .to_pkcs1_der()
            .map_err(|e| Error::auth(format!("Failed to encode private key: {e}")))?;

        let subject = format!("{}.{}", account_identifier(account), user.to_uppercase());
        let issuer = format!("{subject}.SHA256:{fingerprint}");

        Ok(Self {
            subject,
            issuer,
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            cached: Mutex::new(None),
        })
    }

    /// `ACCOUNT.USER`
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `ACCOUNT.USER.SHA256:<public key fingerprint>`
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Current token, reissued when within a minute of expiry
    pub fn token(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::auth(format!("System clock is before the Unix epoch: {e}")))?
            .as_secs();
        self.token_at(now)
    }

    fn token_at(&self, now: u64) -> Result<String> {
        let mut cached = self.cached.lock();
        if let Some(entry) = cached.as_ref()
            && now + REFRESH_MARGIN_SECS < entry.expires_at
        {
            return Ok(entry.token.clone());
        }

        let claims = Claims {
            iss: &self.issuer,
            sub: &self.subject,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| Error::auth(format!("Failed to sign JWT: {e}")))?;

        tracing::debug!(subject = %self.subject, "Issued key-pair JWT");
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: claims.exp,
        });
        Ok(token)
    }
}

fn decode_private_key(pem: &str, passphrase: Option<&Secret>) -> Result<RsaPrivateKey> {
    if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
        let passphrase = passphrase.ok_or_else(|| {
            Error::auth(
                "Private key is encrypted but no passphrase is configured. \
                 Set 'private_key_passphrase_env' or enable the keyring",
            )
        })?;
        return RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.expose().as_bytes())
            .map_err(|e| Error::auth(format!("Failed to decrypt private key: {e}")));
    }

    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::auth(format!("Failed to parse private key: {e}")))
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation};
    use serde::Deserialize;

    use super::*;
    use crate::auth::tests::fixture_path;

    const PLAIN_KEY: &str = include_str!("../../testdata/rsa_key.p8");
    const ENCRYPTED_KEY: &str = include_str!("../../testdata/rsa_key_encrypted.p8");
    const PKCS1_KEY: &str = include_str!("../../testdata/rsa_key_pkcs1.pem");
    const PUBLIC_KEY: &str = include_str!("../../testdata/rsa_key.pub");
    const FINGERPRINT: &str = "J4QZj+PWsmdzUe6iT2gGXIOgvGXFvpMLvcuYye2/i/8=";

    #[derive(Deserialize)]
    struct DecodedClaims {
        iss: String,
        sub: String,
        iat: u64,
        exp: u64,
    }

    fn decode(token: &str) -> DecodedClaims {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        jsonwebtoken::decode::<DecodedClaims>(
            token,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[test]
    fn test_account_identifier() {
        assert_eq!(account_identifier("xy12345.us-east-1"), "XY12345");
        assert_eq!(account_identifier("myorg-myacct"), "MYORG-MYACCT");
        assert_eq!(account_identifier("abc.eu-west-1.aws"), "ABC");
    }

    #[test]
    fn test_issuer_and_subject() {
        let auth = KeyPairAuth::from_pem("xy12345.us-east-1", "analyst", PLAIN_KEY, None).unwrap();
        assert_eq!(auth.subject(), "XY12345.ANALYST");
        assert_eq!(auth.issuer(), format!("XY12345.ANALYST.SHA256:{FINGERPRINT}"));
    }

    #[test]
    fn test_pkcs1_key_has_same_fingerprint() {
        let auth = KeyPairAuth::from_pem("xy12345", "analyst", PKCS1_KEY, None).unwrap();
        assert!(auth.issuer().ends_with(FINGERPRINT));
    }

    #[test]
    fn test_encrypted_key() {
        let passphrase = Secret::new("test-passphrase");
        let auth =
            KeyPairAuth::from_pem("xy12345", "analyst", ENCRYPTED_KEY, Some(&passphrase)).unwrap();
        assert!(auth.issuer().ends_with(FINGERPRINT));
    }

    #[test]
    fn test_encrypted_key_without_passphrase() {
        let err = KeyPairAuth::from_pem("xy12345", "analyst", ENCRYPTED_KEY, None).unwrap_err();
        assert!(err.is_auth());
        assert!(err.to_string().contains("no passphrase"));
    }

    #[test]
    fn test_encrypted_key_wrong_passphrase() {
        let passphrase = Secret::new("wrong");
        let err = KeyPairAuth::from_pem("xy12345", "analyst", ENCRYPTED_KEY, Some(&passphrase))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to decrypt private key"));
    }

    #[test]
    fn test_garbage_key() {
        let err = KeyPairAuth::from_pem("xy12345", "analyst", "not a key", None).unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_token_claims() {
        let auth = KeyPairAuth::from_pem("xy12345.us-east-1", "analyst", PLAIN_KEY, None).unwrap();
        let claims = decode(&auth.token_at(1_700_000_000).unwrap());

        assert_eq!(claims.sub, "XY12345.ANALYST");
        assert_eq!(claims.iss, auth.issuer());
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000 + 59 * 60);
    }

    #[test]
    fn test_token_cached_until_refresh_margin() {
        let auth = KeyPairAuth::from_pem("xy12345", "analyst", PLAIN_KEY, None).unwrap();
        let first = auth.token_at(1_000).unwrap();

        assert_eq!(auth.token_at(1_000 + 30 * 60).unwrap(), first);

        let refreshed = auth.token_at(1_000 + 58 * 60).unwrap();
        assert_ne!(refreshed, first);
        assert_eq!(decode(&refreshed).iat, 1_000 + 58 * 60);
    }

    #[test]
    fn test_load_from_file() {
        let config = KeyPairConfig {
            key_path: PathBuf::from(fixture_path("rsa_key.p8")),
            passphrase: None,
        };
        let auth = KeyPairAuth::load("xy12345", "analyst", &config).unwrap();
        assert!(!auth.token().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_key_path_required() {
        let err = resolve_key_path(None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Keypair authentication requires 'private_key_file' in \
             profile configuration"
        );
    }

    #[test]
    fn test_resolve_key_path_rejects_relative() {
        let err = resolve_key_path(Some("keys/rsa_key.p8")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Private key path must be absolute or use ~ for home directory."));
        assert!(msg.contains("Got: keys/rsa_key.p8"));
        assert!(msg.contains("Valid examples:"));
    }

    #[test]
    fn test_resolve_key_path_missing_file() {
        let err = resolve_key_path(Some("/nonexistent/rsa_key.p8")).unwrap_err();
        assert!(err.is_key_file_not_found());
        assert_eq!(
            err.to_string(),
            "Private key file not found: /nonexistent/rsa_key.p8"
        );
    }

    #[test]
    fn test_resolve_key_path_absolute() {
        let path = fixture_path("rsa_key.p8");
        assert_eq!(resolve_key_path(Some(&path)).unwrap(), PathBuf::from(&path));
    }
}
