//! Validated name newtypes.
//!
//! Warehouse and product names arrive as free text from the outer layers;
//! both are trimmed and must be non-empty. Recalculation groups movements by
//! exact `ProductName` match, so the trimming happens once, at construction.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! impl_name_newtype {
    ($t:ty, $label:literal) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let trimmed = value.into().trim().to_string();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(concat!($label, " cannot be empty")));
                }
                Ok(Self(trimmed))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Name of a warehouse, unique per principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WarehouseName(String);

/// Name of a product lineage within a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName(String);

impl_name_newtype!(WarehouseName, "warehouse name");
impl_name_newtype!(ProductName, "product name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed() {
        let name = ProductName::new("  beans  ").unwrap();
        assert_eq!(name.as_str(), "beans");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            WarehouseName::new("   "),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(ProductName::new(""), Err(DomainError::Validation(_))));
    }

    #[test]
    fn equality_is_exact_after_trim() {
        let a = ProductName::new("beans").unwrap();
        let b = ProductName::new(" beans ").unwrap();
        let c = ProductName::new("Beans").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
