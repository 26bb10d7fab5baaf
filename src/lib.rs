pub mod domain;
pub mod error;
pub mod format;
pub mod kdf;
pub mod normalize;
pub mod policy;
pub mod salt;
pub mod settings;
pub mod site;

#[cfg(feature = "psl")]
pub use domain::PublicSuffixList;
pub use domain::{DomainResolver, NoSuffixList, normalize_domain};
pub use error::DerivationError;
pub use format::{FormatPolicy, format_password};
pub use kdf::{DerivedKey, KdfAlgorithm, KdfParams, derive, derive_blocking};
pub use normalize::{
    ChangeRecord, NormalizationConfig, normalize_label, normalize_label_explained,
    normalize_version,
};
pub use policy::{PolicyReport, check_policy};
pub use salt::{SALT_DELIMITER, build_salt};
pub use settings::Settings;
pub use site::{SiteContext, derive_site_key, generate};
