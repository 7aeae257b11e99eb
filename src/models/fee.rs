use std::fmt;

/// Nanotons in one TON
pub const NANOTONS_PER_TON: u64 = 1_000_000_000;

/// Estimated fee, kept in nanotons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fee {
    nanotons: u64,
}

impl Fee {
    pub fn from_nanotons(nanotons: u64) -> Self {
        Self { nanotons }
    }

    pub fn nanotons(&self) -> u64 {
        self.nanotons
    }

    pub fn as_ton(&self) -> f64 {
        self.nanotons as f64 / NANOTONS_PER_TON as f64
    }
}

/// Formats in TON with nine decimals
impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:09}",
            self.nanotons / NANOTONS_PER_TON,
            self.nanotons % NANOTONS_PER_TON
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Fee::from_nanotons(0).to_string(), "0.000000000");
        assert_eq!(Fee::from_nanotons(1_000_012).to_string(), "0.001000012");
        assert_eq!(Fee::from_nanotons(2_500_000_000).to_string(), "2.500000000");
    }

    #[test]
    fn test_as_ton() {
        assert_eq!(Fee::from_nanotons(1_500_000_000).as_ton(), 1.5);
    }
}
