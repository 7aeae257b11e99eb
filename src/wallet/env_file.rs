//! Dotenv-style persistence of the wallet
//!
//! Files are read with `dotenvy`, so quoting, escapes, `export` prefixes and
//! comments follow the usual dotenv rules. Files are written sorted by key with
//! double-quoted values.

use crate::wallet::Wallet;
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const MNEMONIC_KEY: &str = "MNEMONIC";
pub const SEED_KEY: &str = "SEED";
pub const WALLET_ADDRESS_KEY: &str = "WALLET_ADDRESS";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses dotenv content
    pub fn parse(content: &str) -> Result<Self> {
        let vars = dotenvy::from_read_iter(content.as_bytes())
            .collect::<Result<_, _>>()
            .context("Invalid dotenv content")?;
        Ok(Self { vars })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let vars = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<Result<_, _>>())
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { vars })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn render(&self) -> String {
        self.vars
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"\n", key, escape(value)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Entries describing `wallet`
    pub fn from_wallet(wallet: &Wallet) -> Self {
        let mut env = Self::new();
        env.set(MNEMONIC_KEY, wallet.mnemonic())
            .set(SEED_KEY, wallet.seed_hex())
            .set(WALLET_ADDRESS_KEY, wallet.address_hex());
        env
    }
}

/// Wallet address to use, or a freshly generated wallet persisted at `path`.
///
/// A non-empty `WALLET_ADDRESS` in the process environment wins over the file.
/// An existing file must carry `WALLET_ADDRESS`; the second element is the new
/// wallet when one was generated.
pub fn load_or_create(path: &Path) -> Result<(String, Option<Wallet>)> {
    load_or_create_with(path, std::env::var(WALLET_ADDRESS_KEY).ok())
}

fn load_or_create_with(
    path: &Path,
    process_address: Option<String>,
) -> Result<(String, Option<Wallet>)> {
    if let Some(address) = process_address.filter(|address| !address.is_empty()) {
        log::debug!("Using {} from the environment", WALLET_ADDRESS_KEY);
        return Ok((address, None));
    }

    if path.exists() {
        let env = EnvFile::read(path)?;
        let address = env
            .get(WALLET_ADDRESS_KEY)
            .filter(|address| !address.is_empty())
            .ok_or_else(|| anyhow!("{} has no {}", path.display(), WALLET_ADDRESS_KEY))?;
        log::debug!("Loaded wallet {} from {}", address, path.display());
        return Ok((address.to_string(), None));
    }

    let wallet = Wallet::generate()?;
    EnvFile::from_wallet(&wallet).write(path)?;
    log::info!("Created wallet {} in {}", wallet.address_hex(), path.display());
    Ok((wallet.address_hex(), Some(wallet)))
}

// double-quoted dotenv values expand `$` and escapes
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse() {
        let env = EnvFile::parse(
            "# wallet\nMNEMONIC=\"word word\"\nexport SEED='abcd'\n\nWALLET_ADDRESS=ff00 # generated\n",
        )
        .unwrap();
        assert_eq!(env.get(MNEMONIC_KEY), Some("word word"));
        assert_eq!(env.get(SEED_KEY), Some("abcd"));
        assert_eq!(env.get(WALLET_ADDRESS_KEY), Some("ff00"));
    }

    #[test]
    fn test_parse_newline_escape() {
        let env = EnvFile::parse("NOTE=\"two\\nlines\"\n").unwrap();
        assert_eq!(env.get("NOTE"), Some("two\nlines"));
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        assert!(EnvFile::parse("broken line\n").is_err());
    }

    #[test]
    fn test_render_sorted_and_quoted() {
        let mut env = EnvFile::new();
        env.set("B", "2").set("A", "1");
        assert_eq!(env.render(), "A=\"1\"\nB=\"2\"\n");
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut env = EnvFile::new();
        env.set(WALLET_ADDRESS_KEY, "ab".repeat(32))
            .set("NOTE", "say \"hi\"\ncosts $5");
        env.write(&path).unwrap();

        assert_eq!(EnvFile::read(&path).unwrap(), env);
    }

    #[test]
    fn test_load_or_create_generates_then_reuses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");

        let (created, wallet) = load_or_create_with(&path, None).unwrap();
        let wallet = wallet.expect("a new wallet is generated");
        assert_eq!(created, wallet.address_hex());

        let stored = EnvFile::read(&path).unwrap();
        assert_eq!(stored.get(MNEMONIC_KEY), Some(wallet.mnemonic()));
        assert_eq!(stored.get(SEED_KEY), Some(wallet.seed_hex().as_str()));

        let (loaded, again) = load_or_create_with(&path, None).unwrap();
        assert_eq!(loaded, created);
        assert!(again.is_none());
    }

    #[test]
    fn test_process_environment_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut env = EnvFile::new();
        env.set(WALLET_ADDRESS_KEY, "aa".repeat(32));
        env.write(&path).unwrap();

        let (address, wallet) = load_or_create_with(&path, Some("bb".repeat(32))).unwrap();
        assert_eq!(address, "bb".repeat(32));
        assert!(wallet.is_none());

        // an empty variable is ignored
        let (address, _) = load_or_create_with(&path, Some(String::new())).unwrap();
        assert_eq!(address, "aa".repeat(32));
    }

    #[test]
    fn test_process_environment_skips_generation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");

        let (address, wallet) = load_or_create_with(&path, Some("cc".repeat(32))).unwrap();
        assert_eq!(address, "cc".repeat(32));
        assert!(wallet.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_file_without_address() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "MNEMONIC=\"x\"\n").unwrap();

        assert!(load_or_create_with(&path, None).is_err());
    }
}
