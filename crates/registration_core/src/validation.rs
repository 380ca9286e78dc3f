//! Field checks applied to a submitted form, in the order the visitor sees them.

use once_cell::sync::Lazy;
use regex::Regex;
use shared::{domain::FormFields, error::FormError, protocol::NEAR_SUFFIX};

static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9-]+$").expect("domain pattern compiles")
});

// Whitespace as browsers define it for form input: includes U+FEFF, leaves out
// U+0085. Unicode `\s` disagrees on both, so the set is spelled out.
const BROWSER_WHITESPACE: &str =
    r"\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let part = format!("[^{BROWSER_WHITESPACE}@]+");
    Regex::new(&format!(r"^{part}@{part}\.{part}$")).expect("email pattern compiles")
});

const MIN_WALLET_LEN: usize = 3;

pub fn validate_domain(domain: &str) -> Result<(), FormError> {
    if DOMAIN_PATTERN.is_match(domain) {
        Ok(())
    } else {
        Err(FormError::InvalidDomain)
    }
}

/// The length floor is implied by the suffix check; both are kept so a change to
/// either rule stays explicit.
pub fn validate_wallet(wallet: &str) -> Result<(), FormError> {
    if !wallet.ends_with(NEAR_SUFFIX) || wallet.chars().count() < MIN_WALLET_LEN {
        return Err(FormError::InvalidWallet);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FormError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(FormError::InvalidEmail)
    }
}

/// Runs domain, wallet and email checks in that order and stops at the first
/// failure. `name` is not checked.
pub fn validate(fields: &FormFields) -> Result<(), FormError> {
    validate_domain(&fields.domain)?;
    validate_wallet(&fields.wallet)?;
    validate_email(&fields.email)?;
    Ok(())
}
