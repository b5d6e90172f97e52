use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    aes::{AesCircuit, KeySize},
    chacha::{self, ChaChaCircuit},
    compiler::CircuitDescriptor,
    error::KeygenError,
    scalar::Field,
};

/// The closed set of cipher configurations keys are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    ChaCha20,
    Aes128,
    Aes256,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::ChaCha20, Variant::Aes128, Variant::Aes256];

    /// Artifact file name suffix. Distinct per variant.
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::ChaCha20 => "chacha20",
            Variant::Aes128 => "aes128",
            Variant::Aes256 => "aes256",
        }
    }

    /// Required key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            Variant::ChaCha20 => chacha::KEY_BYTES,
            Variant::Aes128 => KeySize::Aes128.key_bytes(),
            Variant::Aes256 => KeySize::Aes256.key_bytes(),
        }
    }

    /// Placeholder-filled descriptor of the shape keys are generated for.
    pub fn descriptor(&self) -> Box<dyn CircuitDescriptor> {
        match self {
            Variant::ChaCha20 => Box::new(ChaChaCircuit::default()),
            Variant::Aes128 => Box::new(AesCircuit::new(KeySize::Aes128)),
            Variant::Aes256 => Box::new(AesCircuit::new(KeySize::Aes256)),
        }
    }

    pub fn spec(&self) -> VariantSpec {
        VariantSpec::new(*self, self.descriptor())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Variant {
    type Err = KeygenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|variant| variant.suffix() == s)
            .ok_or_else(|| KeygenError::Configuration(format!("unknown variant {s:?}")))
    }
}

/// Everything one pipeline run needs to know about a variant.
pub struct VariantSpec {
    pub variant: Variant,
    pub field: Field,
    pub descriptor: Box<dyn CircuitDescriptor>,
}

impl VariantSpec {
    pub fn new(variant: Variant, descriptor: Box<dyn CircuitDescriptor>) -> Self {
        VariantSpec {
            variant,
            field: Field::default(),
            descriptor,
        }
    }
}

impl fmt::Debug for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSpec")
            .field("variant", &self.variant)
            .field("field", &self.field)
            .field("circuit", &self.descriptor.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_suffixes_are_distinct() {
        let suffixes: HashSet<_> = Variant::ALL.iter().map(Variant::suffix).collect();
        assert_eq!(suffixes.len(), Variant::ALL.len());
    }

    #[test]
    fn test_descriptors_declare_variant_key_length() {
        for variant in Variant::ALL {
            let spec = variant.spec();
            assert_eq!(spec.descriptor.key_len(), variant.key_len());
            assert_eq!(spec.descriptor.name(), variant.suffix());
        }
        assert_eq!(Variant::Aes128.key_len(), 16);
        assert_eq!(Variant::Aes256.key_len(), 32);
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!("aes256".parse::<Variant>().unwrap(), Variant::Aes256);
        assert!(matches!(
            "aes192".parse::<Variant>(),
            Err(KeygenError::Configuration(_))
        ));
        assert_eq!(serde_json::to_string(&Variant::ChaCha20).unwrap(), "\"chacha20\"");
    }
}
