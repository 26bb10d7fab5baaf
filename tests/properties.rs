//! Property-based tests for normalization, formatting and policy checks.

use passbooster::{
    FormatPolicy, NormalizationConfig, SALT_DELIMITER, build_salt, check_policy,
    format_password, normalize_label, normalize_version,
};
use proptest::prelude::*;

fn policy_strategy() -> impl Strategy<Value = FormatPolicy> {
    (0usize..200, "[@#%+=?^!$&*0-9]{0,8}").prop_map(|(length, symbols)| FormatPolicy {
        length,
        symbols,
    })
}

fn has_long_digit_run(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    chars
        .windows(3)
        .any(|w| w.iter().all(|c| c.is_ascii_digit()))
}

proptest! {
    /// Any key material yields a password that passes its own policy.
    #[test]
    fn formatted_password_satisfies_policy(
        key in proptest::collection::vec(any::<u8>(), 16..96),
        policy in policy_strategy(),
    ) {
        let password = format_password(&key, &policy);
        let report = check_policy(&password, &policy);
        prop_assert!(report.ok, "{:?} for {:?}", report, *password);
    }

    /// Output length is always the clamped policy length.
    #[test]
    fn formatted_length_is_exact(
        key in proptest::collection::vec(any::<u8>(), 1..64),
        policy in policy_strategy(),
    ) {
        let password = format_password(&key, &policy);
        prop_assert_eq!(password.chars().count(), policy.length.clamp(12, 128));
    }

    /// No three consecutive digits, even for arbitrary short keys.
    #[test]
    fn formatted_has_no_long_digit_run(
        key in proptest::collection::vec(any::<u8>(), 0..64),
        length in 0usize..200,
    ) {
        let policy = FormatPolicy { length, ..FormatPolicy::default() };
        let password = format_password(&key, &policy);
        prop_assert!(!has_long_digit_run(&password));
    }

    /// Formatting is a pure function of key and policy.
    #[test]
    fn formatting_is_deterministic(
        key in proptest::collection::vec(any::<u8>(), 16..64),
        policy in policy_strategy(),
    ) {
        prop_assert_eq!(
            &*format_password(&key, &policy),
            &*format_password(&key, &policy)
        );
    }

    /// Normalizing a normalized label changes nothing.
    #[test]
    fn label_normalization_is_idempotent(label in any::<String>()) {
        let cfg = NormalizationConfig::default();
        let once = normalize_label(&label, &cfg);
        prop_assert_eq!(normalize_label(&once, &cfg), once);
    }

    /// The salt delimiter never survives, whichever steps are enabled.
    #[test]
    fn label_never_contains_delimiter(
        label in any::<String>(),
        flags in proptest::array::uniform7(any::<bool>()),
    ) {
        let cfg = NormalizationConfig {
            unicode: flags[0],
            trim: flags[1],
            collapse_whitespace: flags[2],
            lowercase: flags[3],
            restrict_charset: flags[4],
            collapse_dashes: flags[5],
            trim_dashes: flags[6],
        };
        let with_delimiter = format!("{label}{SALT_DELIMITER}{label}");
        prop_assert!(!normalize_label(&with_delimiter, &cfg).contains(SALT_DELIMITER));
    }

    /// Default normalization output stays inside the portable charset.
    #[test]
    fn label_uses_portable_charset(label in any::<String>()) {
        let out = normalize_label(&label, &NormalizationConfig::default());
        prop_assert!(out
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._@-".contains(c)));
        prop_assert!(!out.starts_with('-') && !out.ends_with('-'));
        prop_assert!(!out.contains("--"));
    }

    /// Versions always come out as `v<positive integer>`.
    #[test]
    fn version_is_total(version in any::<String>()) {
        let out = normalize_version(&version);
        let digits = out.strip_prefix('v').expect("version starts with v");
        prop_assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
        prop_assert!(digits.parse::<u64>().map(|n| n >= 1).unwrap_or(false));
    }

    /// Distinct normalized triples never share a salt.
    #[test]
    fn distinct_triples_distinct_salts(
        a in proptest::array::uniform3("[a-z0-9.@_-]{0,6}"),
        b in proptest::array::uniform3("[a-z0-9.@_-]{0,6}"),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(build_salt(&a), build_salt(&b));
    }
}
