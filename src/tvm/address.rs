//! TON Address implementation
//!
//! Supports the raw form (`workchain:hash`), a bare 64-character hash (basechain)
//! and the user-friendly base64 form with its CRC16 checksum.

use crate::crc::CRC16;
use anyhow::{Result, bail};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Represents a TON blockchain address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte hash part of the address
    pub hash_part: [u8; 32],
    /// Whether the address is bounceable
    pub is_bounceable: bool,
    /// Whether this is a test-only address
    pub is_test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and hash part
    pub fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
            is_bounceable: true,
            is_test_only: false,
        }
    }

    /// Parses `workchain:hash`, or a bare 64-character hash in the basechain
    pub fn from_hex(address: &str) -> Result<Self> {
        let (workchain, hash_hex) = match address.split_once(':') {
            Some((workchain, hash_hex)) => (workchain.parse::<i8>()?, hash_hex),
            None => (0, address),
        };

        if hash_hex.len() != 64 {
            bail!("Hash part must be 64 hex characters");
        }

        let mut hash_part = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash_part)?;

        Ok(Self::new(workchain, hash_part))
    }

    /// Parses address from base64 user-friendly format
    pub fn from_base64(address: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address)
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(address))?;

        if decoded.len() != 36 {
            bail!("Invalid base64 address length");
        }

        let mut tag = decoded[0];
        let is_test_only = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;

        let is_bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => bail!("Invalid address tag"),
        };

        let expected_crc = u16::from_be_bytes([decoded[34], decoded[35]]);
        if CRC16.checksum(&decoded[..34]) != expected_crc {
            bail!("Invalid address CRC");
        }

        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&decoded[2..34]);

        Ok(Self {
            workchain: decoded[1] as i8,
            hash_part,
            is_bounceable,
            is_test_only,
        })
    }

    /// Raw form: `workchain:hash`
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, self.hash_hex())
    }

    /// Lowercase hex of the hash part only
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash_part)
    }

    /// User-friendly form with explicit flags
    pub fn to_user_friendly(&self, url_safe: bool, bounceable: bool, test_only: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut data = Vec::with_capacity(36);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);
        data.extend_from_slice(&CRC16.checksum(&data).to_be_bytes());

        if url_safe {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
        } else {
            base64::engine::general_purpose::STANDARD.encode(&data)
        }
    }

    /// URL-safe user-friendly form using the address' own flags
    pub fn to_base64(&self) -> String {
        self.to_user_friendly(true, self.is_bounceable, self.is_test_only)
    }

    pub fn with_bounceable(mut self, bounceable: bool) -> Self {
        self.is_bounceable = bounceable;
        self
    }

    pub fn with_test_only(mut self, test_only: bool) -> Self {
        self.is_test_only = test_only;
        self
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // Try hex format first (faster)
        if let Ok(addr) = Self::from_hex(s) {
            return Ok(addr);
        }

        if let Ok(addr) = Self::from_base64(s) {
            return Ok(addr);
        }

        bail!("Invalid address format: {}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8";

    #[test]
    fn test_address_raw() {
        let addr = Address::from_hex(RAW).unwrap();
        assert_eq!(addr.workchain, 0);
        assert_eq!(addr.to_raw(), RAW);
    }

    #[test]
    fn test_address_bare_hash_is_basechain() {
        let addr = Address::from_hex(&RAW[2..]).unwrap();
        assert_eq!(addr.workchain, 0);
        assert_eq!(addr.hash_hex(), &RAW[2..]);
    }

    #[test]
    fn test_address_masterchain() {
        let addr = Address::from_hex(&format!("-1:{}", &RAW[2..])).unwrap();
        assert_eq!(addr.workchain, -1);
    }

    #[test]
    fn test_address_invalid_hex() {
        assert!(Address::from_hex("0:abcd").is_err());
        assert!(Address::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_address_base64() {
        let addr = Address::from_base64("EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N").unwrap();
        assert_eq!(addr.workchain, 0);
        assert!(addr.is_bounceable);
        assert_eq!(addr.to_raw(), RAW);
    }

    #[test]
    fn test_address_base64_bad_crc() {
        assert!(Address::from_base64("EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2O").is_err());
    }

    #[test]
    fn test_address_from_str() {
        let from_raw: Address = RAW.parse().unwrap();
        let from_friendly: Address = from_raw.to_base64().parse().unwrap();
        assert_eq!(from_raw, from_friendly);
        assert!("not an address".parse::<Address>().is_err());
    }

    #[test]
    fn test_zero_address_formats() {
        let zero_addr = Address::new(0, [0u8; 32]);

        assert_eq!(
            zero_addr.to_raw(),
            "0:0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            zero_addr.to_user_friendly(true, true, false),
            "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c"
        );
        assert_eq!(
            zero_addr.clone().with_bounceable(false).to_string(),
            "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ"
        );
    }

    #[test]
    fn test_test_only_flag_roundtrip() {
        let addr = Address::new(0, [7u8; 32]).with_test_only(true);
        let parsed = Address::from_base64(&addr.to_base64()).unwrap();
        assert!(parsed.is_test_only);
        assert_eq!(parsed, addr);
    }
}
