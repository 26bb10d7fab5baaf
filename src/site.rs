//! The full pipeline: site context, salt, key, password.

use crate::domain::{DomainResolver, normalize_domain};
use crate::error::DerivationError;
use crate::format::format_password;
use crate::kdf::{DerivedKey, derive};
use crate::normalize::{NormalizationConfig, normalize_label, normalize_version};
use crate::salt::build_salt;
use crate::settings::Settings;
use zeroize::Zeroizing;

/// Public description of the account a password is for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteContext {
    pub domain: String,
    pub label: String,
    pub version: String,
}

impl SiteContext {
    pub fn new(
        domain: impl Into<String>,
        label: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            label: label.into(),
            version: version.into(),
        }
    }

    /// Normalized `[domain, label, version]`, in salt order.
    pub fn normalized(
        &self,
        steps: &NormalizationConfig,
        resolver: &dyn DomainResolver,
    ) -> [String; 3] {
        [
            normalize_domain(&self.domain, resolver),
            normalize_label(&self.label, steps),
            normalize_version(&self.version),
        ]
    }

    pub fn salt(&self, steps: &NormalizationConfig, resolver: &dyn DomainResolver) -> String {
        build_salt(&self.normalized(steps, resolver))
    }
}

pub async fn derive_site_key(
    master: &[u8],
    site: &SiteContext,
    settings: &Settings,
    resolver: &dyn DomainResolver,
) -> Result<DerivedKey, DerivationError> {
    let salt = site.salt(&settings.label_steps, resolver);
    derive(master, salt.as_bytes(), &settings.kdf).await
}

/// Regenerates the password for `site`. Same inputs, same password.
pub async fn generate(
    master: &[u8],
    site: &SiteContext,
    settings: &Settings,
    resolver: &dyn DomainResolver,
) -> Result<Zeroizing<String>, DerivationError> {
    let key = derive_site_key(master, site, settings, resolver).await?;
    Ok(format_password(&key, &settings.policy))
}
