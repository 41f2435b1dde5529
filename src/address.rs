use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

pub const BROADCAST: Address = Address([0xff; 6]);

/// A 48-bit hardware address, unique within one simulation run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 6]);

impl Address {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Multicast/broadcast iff the low bit of the first byte is set.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Deterministic placeholder addresses for skeleton config generation:
    /// locally-administered, sequential.
    pub fn sequential(n: u8) -> Self {
        Self([0x02, 0x00, 0x00, 0x00, 0x00, n])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for b in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| Error::custom(format!("address {s} has too few octets")))?;
            *b = u8::from_str_radix(part, 16)
                .map_err(|_| Error::custom(format!("address {s} has a malformed octet")))?;
        }
        if parts.next().is_some() {
            return Err(Error::custom(format!("address {s} has too many octets")));
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AddressVisitor;

        impl<'de> de::Visitor<'de> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a colon-separated hex MAC address")
            }

            fn visit_str<E>(self, value: &str) -> Result<Address, E>
            where
                E: de::Error,
            {
                Address::from_str(value).map_err(|err| de::Error::custom(err.to_string()))
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

impl slog::Value for Address {
    fn serialize(
        &self,
        _record: &slog::Record,
        key: slog::Key,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        serializer.emit_str(key, &self.to_string())
    }
}
