//! The Gemini API key in the OS credential store.

use keyring::Entry;

const SERVICE: &str = "taskplan";
const GEMINI: &str = "gemini";

/// Save the Gemini key, replacing any stored one.
pub fn store_gemini_key(api_key: &str) -> anyhow::Result<()> {
    store(GEMINI, api_key)
}

/// The stored Gemini key, if there is a non-blank one.
#[must_use]
pub fn gemini_key() -> Option<String> {
    load(GEMINI)
}

/// Remove the stored Gemini key. Returns `false` when none was stored.
pub fn forget_gemini_key() -> anyhow::Result<bool> {
    forget(GEMINI)
}

fn store(account: &str, secret: &str) -> anyhow::Result<()> {
    Entry::new(SERVICE, account)?.set_password(secret)?;
    tracing::debug!(account, "stored key in keychain");
    Ok(())
}

fn load(account: &str) -> Option<String> {
    Entry::new(SERVICE, account)
        .and_then(|entry| entry.get_password())
        .inspect_err(|e| {
            if !matches!(e, keyring::Error::NoEntry) {
                tracing::debug!(account, error = %e, "keychain lookup failed");
            }
        })
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn forget(account: &str) -> anyhow::Result<bool> {
    match Entry::new(SERVICE, account)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A scratch account so the user's real Gemini key is never touched
    const ACCOUNT: &str = "taskplan-test";

    #[test]
    fn store_load_forget() {
        let _ = forget(ACCOUNT);

        if store(ACCOUNT, "  AIza-test-key \n").is_err() {
            eprintln!("Keychain not available in test environment, skipping");
            return;
        }
        let Some(loaded) = load(ACCOUNT) else {
            eprintln!("Keychain read failed (mock backend?), skipping");
            return;
        };
        assert_eq!(loaded, "AIza-test-key");

        assert!(forget(ACCOUNT).unwrap());
        assert_eq!(load(ACCOUNT), None);
        assert!(!forget(ACCOUNT).unwrap());
    }
}
