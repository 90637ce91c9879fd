use serde::{Deserialize, Serialize};

use stockpile_core::{DomainError, DomainResult, RecordId};

/// Longest accepted product name (matches the `varchar(255)` column).
pub const NAME_MAX_LEN: usize = 255;

/// Longest accepted vendor name.
pub const VENDOR_MAX_LEN: usize = 255;

/// Currency codes are ISO-4217 style, e.g. "USD".
pub const CURRENCY_CODE_LEN: usize = 3;

/// Caller-supplied field values for create/update.
///
/// Everything a record holds except its identifier, which only a store may
/// assign. Wire and storage both use `product_name` for the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(rename = "product_name")]
    pub name: String,
    /// Price in the smallest currency unit (e.g. cents).
    pub price: i64,
    pub currency: String,
    pub discount: i64,
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
}

impl ItemDraft {
    /// Check field constraints, reporting the first offending field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product_name cannot be empty"));
        }
        if self.name.chars().count() > NAME_MAX_LEN {
            return Err(DomainError::validation(format!(
                "product_name cannot exceed {NAME_MAX_LEN} characters"
            )));
        }
        if self.price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if self.currency.len() != CURRENCY_CODE_LEN
            || !self.currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(DomainError::validation(
                "currency must be a 3-letter code",
            ));
        }
        if self.discount < 0 {
            return Err(DomainError::validation("discount cannot be negative"));
        }
        if self.vendor.trim().is_empty() {
            return Err(DomainError::validation("vendor cannot be empty"));
        }
        if self.vendor.chars().count() > VENDOR_MAX_LEN {
            return Err(DomainError::validation(format!(
                "vendor cannot exceed {VENDOR_MAX_LEN} characters"
            )));
        }
        Ok(())
    }

    pub fn into_record(self, id: RecordId) -> InventoryRecord {
        InventoryRecord {
            id,
            name: self.name,
            price: self.price,
            currency: self.currency,
            discount: self.discount,
            vendor: self.vendor,
            accessories: self.accessories,
        }
    }
}

/// A stored inventory item.
///
/// `accessories` is empty when the item has none; it is left out of the JSON
/// form in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    #[serde(rename = "product_name")]
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub discount: i64,
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<String>,
}

impl InventoryRecord {
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// The mutable fields of this record, as a draft.
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            price: self.price,
            currency: self.currency.clone(),
            discount: self.discount,
            vendor: self.vendor.clone(),
            accessories: self.accessories.clone(),
        }
    }

    /// Replace every mutable field, keeping the identifier.
    pub fn replace_fields(&mut self, draft: ItemDraft) {
        let id = self.id.clone();
        *self = draft.into_record(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ItemDraft {
        ItemDraft {
            name: "Widget".to_string(),
            price: 500,
            currency: "USD".to_string(),
            discount: 0,
            vendor: "Acme".to_string(),
            accessories: Vec::new(),
        }
    }

    fn expect_validation(draft: ItemDraft, field: &str) {
        match draft.validate() {
            Err(DomainError::Validation(msg)) => assert!(
                msg.contains(field),
                "expected message about {field}, got {msg}"
            ),
            other => panic!("Expected Validation error for {field}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        assert!(widget().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        expect_validation(ItemDraft { name: "   ".into(), ..widget() }, "product_name");
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "x".repeat(NAME_MAX_LEN + 1);
        expect_validation(ItemDraft { name, ..widget() }, "product_name");
    }

    #[test]
    fn rejects_negative_amounts() {
        expect_validation(ItemDraft { price: -1, ..widget() }, "price");
        expect_validation(ItemDraft { discount: -5, ..widget() }, "discount");
    }

    #[test]
    fn rejects_malformed_currency() {
        expect_validation(ItemDraft { currency: "US".into(), ..widget() }, "currency");
        expect_validation(ItemDraft { currency: "US1".into(), ..widget() }, "currency");
        expect_validation(ItemDraft { currency: String::new(), ..widget() }, "currency");
    }

    #[test]
    fn rejects_blank_vendor() {
        expect_validation(ItemDraft { vendor: String::new(), ..widget() }, "vendor");
    }

    #[test]
    fn wire_form_uses_product_name_and_omits_empty_accessories() {
        let record = widget().into_record(RecordId::new("abc"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["id"], "abc");
        assert_eq!(json["product_name"], "Widget");
        assert_eq!(json["price"], 500);
        assert!(json.get("name").is_none());
        assert!(json.get("accessories").is_none());
    }

    #[test]
    fn wire_form_keeps_non_empty_accessories_in_order() {
        let draft = ItemDraft {
            accessories: vec!["cable".into(), "case".into()],
            ..widget()
        };
        let json = serde_json::to_value(draft.into_record(RecordId::new("abc"))).unwrap();
        assert_eq!(json["accessories"], serde_json::json!(["cable", "case"]));
    }

    #[test]
    fn draft_without_accessories_deserializes_to_empty_list() {
        let draft: ItemDraft = serde_json::from_value(serde_json::json!({
            "product_name": "Widget",
            "price": 500,
            "currency": "USD",
            "discount": 0,
            "vendor": "Acme",
        }))
        .unwrap();
        assert!(draft.accessories.is_empty());
    }

    #[test]
    fn replace_fields_keeps_identifier() {
        let mut record = widget().into_record(RecordId::new("keep-me"));
        record.replace_fields(ItemDraft {
            name: "Widget-2".into(),
            accessories: vec!["strap".into()],
            ..widget()
        });

        assert_eq!(record.id.as_str(), "keep-me");
        assert_eq!(record.name, "Widget-2");
        assert_eq!(record.accessories, vec!["strap".to_string()]);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a record built from a valid draft carries every draft field.
            #[test]
            fn into_record_preserves_draft_fields(
                name in "[A-Za-z][A-Za-z0-9 -]{0,60}",
                price in 0i64..1_000_000_000,
                currency in "[A-Z]{3}",
                discount in 0i64..10_000,
                vendor in "[A-Za-z][A-Za-z0-9]{0,30}",
                accessories in prop::collection::vec("[a-z]{1,12}", 0..4),
            ) {
                let draft = ItemDraft { name, price, currency, discount, vendor, accessories };
                prop_assert!(draft.validate().is_ok());

                let record = draft.clone().into_record(RecordId::new("id"));
                prop_assert_eq!(record.to_draft(), draft);
            }
        }
    }
}
