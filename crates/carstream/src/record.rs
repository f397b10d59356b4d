use serde::{Deserialize, Serialize};

/// A single vehicle descriptor emitted by a producer.
///
/// Records are plain values: they carry no identity beyond their fields and
/// are never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    /// Identifier assigned by the source that manufactured the record.
    pub id: u64,
    /// Model name, e.g. `"Model 3"`.
    pub model: String,
    /// Manufacturer name, e.g. `"Tesla"`.
    pub manufacturer: String,
}

impl Car {
    pub fn new(id: u64, model: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
            manufacturer: manufacturer.into(),
        }
    }

    /// Serializes the record as a single-line JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which cannot happen for
    /// the string and integer fields of a [`Car`] in practice.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_flat_field_names() {
        let car = Car::new(7, "Model 3", "Tesla");
        let json = car.to_json().unwrap();
        assert_eq!(json, r#"{"id":7,"model":"Model 3","manufacturer":"Tesla"}"#);
        assert!(!json.contains('\n'));
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Car::new(1, "Golf", "Volkswagen"), Car::new(1, "Golf", "Volkswagen"));
        assert_ne!(Car::new(1, "Golf", "Volkswagen"), Car::new(2, "Golf", "Volkswagen"));
    }
}
