//! Wallet identity derived from a BIP-39 mnemonic
//!
//! The wallet address is the lowercase hex of the first 32 bytes of the BIP-39 seed
//! (empty passphrase). The same 32 bytes seed the ed25519 signing key.

pub mod env_file;

use crate::tvm::Address;
use anyhow::{Result, anyhow, bail};
use bip39::{Language, Mnemonic, Seed};
use ed25519_dalek::SigningKey;
use rand::RngCore;
use std::fmt;

pub use env_file::{EnvFile, load_or_create};

/// Number of words in a generated mnemonic
pub const MNEMONIC_WORDS: usize = 24;

/// Bytes of entropy behind a 24-word mnemonic
pub const ENTROPY_BYTES: usize = 32;

pub struct Wallet {
    mnemonic: String,
    seed: [u8; 64],
}

impl Wallet {
    /// Generates a wallet from 256 bits of fresh entropy
    pub fn generate() -> Result<Self> {
        let mut entropy = [0u8; ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut entropy);
        Self::from_entropy(&entropy)
    }

    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        let mnemonic = Mnemonic::from_entropy(entropy, Language::English)
            .map_err(|e| anyhow!("Invalid mnemonic entropy: {}", e))?;
        Ok(Self::from_mnemonic_internal(mnemonic))
    }

    /// Restores a wallet from a 24-word English phrase
    pub fn from_mnemonic(phrase: &str) -> Result<Self> {
        let word_count = phrase.split_whitespace().count();
        if word_count != MNEMONIC_WORDS {
            bail!(
                "Expected {} word mnemonic, got {} words",
                MNEMONIC_WORDS,
                word_count
            );
        }

        let mnemonic = Mnemonic::from_phrase(phrase, Language::English)
            .map_err(|e| anyhow!("Invalid mnemonic phrase: {}", e))?;
        Ok(Self::from_mnemonic_internal(mnemonic))
    }

    fn from_mnemonic_internal(mnemonic: Mnemonic) -> Self {
        let seed = Seed::new(&mnemonic, "");
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(seed.as_bytes());

        Self {
            mnemonic: mnemonic.phrase().to_string(),
            seed: bytes,
        }
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn seed(&self) -> &[u8; 64] {
        &self.seed
    }

    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }

    /// 64 hex characters, the first half of the seed
    pub fn address_hex(&self) -> String {
        hex::encode(self.key_material())
    }

    /// The wallet address as a basechain account
    pub fn address(&self) -> Address {
        Address::new(0, self.key_material())
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.key_material())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key().verifying_key().to_bytes())
    }

    fn key_material(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        key.copy_from_slice(&self.seed[..32]);
        key
    }
}

// never print the phrase or the seed
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address_hex())
            .finish_non_exhaustive()
    }
}
