use core::fmt;

/// Envelope type of a transaction, as numbered by EIP-2718
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[derive(Default)]
pub enum TxType {
    // Single gasPrice
    #[default]
    Legacy = 0,
    // maxPriorityFeePerGas + maxFeePerGas
    Eip1559 = 2,
}

impl TryFrom<u8> for TxType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxType::Legacy),
            2 => Ok(TxType::Eip1559),
            _ => Err(()),
        }
    }
}

impl From<TxType> for u8 {
    fn from(val: TxType) -> Self {
        val as u8
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TxType::Legacy => write!(f, "legacy"),
            TxType::Eip1559 => write!(f, "eip1559"),
        }
    }
}

impl serde::Serialize for TxType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> serde::Deserialize<'de> for TxType {
    fn deserialize<D>(deserializer: D) -> Result<TxType, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        TxType::try_from(value).map_err(|_| serde::de::Error::custom("Invalid value for TxType"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_type_serde() {
        assert_eq!(serde_json::to_string(&TxType::Legacy).unwrap(), "0");
        assert_eq!(serde_json::to_string(&TxType::Eip1559).unwrap(), "2");
        let deserialized: TxType = serde_json::from_str("2").unwrap();
        assert_eq!(deserialized, TxType::Eip1559);
    }

    #[test]
    fn test_tx_type_rejects_access_list_type() {
        // Type 1 (EIP-2930) is not supported
        assert!(TxType::try_from(1).is_err());
        assert!(serde_json::from_str::<TxType>("1").is_err());
    }
}
