use poem::{Error as PoemError, Result as PoemResult, http::StatusCode};
use poem_openapi::SecurityScheme;
use poem_openapi::auth::Bearer;
use sha2::{Digest, Sha256};

/// Shared-secret bearer auth for scheduler-triggered and admin routes.
#[derive(SecurityScheme)]
#[oai(ty = "bearer")]
pub struct SchedulerAuth(pub Bearer);

impl SchedulerAuth {
    /// Compares digests rather than the raw strings, so the check does not
    /// leak matching secret prefixes through timing.
    pub fn verify(&self, secret: &str) -> PoemResult<()> {
        let presented = Sha256::digest(self.0.token.as_bytes());
        let expected = Sha256::digest(secret.as_bytes());
        if presented == expected {
            Ok(())
        } else {
            Err(PoemError::from_string(
                "invalid scheduler secret",
                StatusCode::UNAUTHORIZED,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(token: &str) -> SchedulerAuth {
        SchedulerAuth(Bearer {
            token: token.to_string(),
        })
    }

    #[test]
    fn accepts_the_configured_secret() {
        assert!(auth("cron-s3cret").verify("cron-s3cret").is_ok());
    }

    #[test]
    fn rejects_wrong_empty_and_prefix_tokens() {
        assert!(auth("wrong").verify("cron-s3cret").is_err());
        assert!(auth("").verify("cron-s3cret").is_err());
        assert!(auth("cron-s3cret-and-more").verify("cron-s3cret").is_err());
    }
}
