//! The six canonical invoice header fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A canonical invoice header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Invoice identifier.
    InvoiceNumber,
    /// Date the invoice was issued.
    InvoiceDate,
    /// Seller name.
    VendorName,
    /// Buyer name.
    CustomerName,
    /// Total amount due.
    TotalAmount,
    /// Payment due date.
    PaymentDueDate,
}

/// Semantic kind of a field. Drives normalization and comparison rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Identifier,
    Date,
    Name,
    Amount,
}

impl Field {
    /// All fields, in canonical order.
    pub const ALL: [Field; 6] = [
        Field::InvoiceNumber,
        Field::InvoiceDate,
        Field::VendorName,
        Field::CustomerName,
        Field::TotalAmount,
        Field::PaymentDueDate,
    ];

    /// Semantic kind of this field.
    pub fn kind(self) -> FieldKind {
        match self {
            Field::InvoiceNumber => FieldKind::Identifier,
            Field::InvoiceDate | Field::PaymentDueDate => FieldKind::Date,
            Field::VendorName | Field::CustomerName => FieldKind::Name,
            Field::TotalAmount => FieldKind::Amount,
        }
    }

    /// Wire name (snake_case).
    pub fn as_str(self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::InvoiceDate => "invoice_date",
            Field::VendorName => "vendor_name",
            Field::CustomerName => "customer_name",
            Field::TotalAmount => "total_amount",
            Field::PaymentDueDate => "payment_due_date",
        }
    }

    /// Human readable label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Field::InvoiceNumber => "Invoice Number",
            Field::InvoiceDate => "Invoice Date",
            Field::VendorName => "Vendor Name",
            Field::CustomerName => "Customer Name",
            Field::TotalAmount => "Total Amount",
            Field::PaymentDueDate => "Payment Due Date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_kinds() {
        assert_eq!(Field::InvoiceNumber.kind(), FieldKind::Identifier);
        assert_eq!(Field::InvoiceDate.kind(), FieldKind::Date);
        assert_eq!(Field::PaymentDueDate.kind(), FieldKind::Date);
        assert_eq!(Field::VendorName.kind(), FieldKind::Name);
        assert_eq!(Field::TotalAmount.kind(), FieldKind::Amount);
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("invoice_number".parse(), Ok(Field::InvoiceNumber));
        assert_eq!("Payment Due Date".parse(), Ok(Field::PaymentDueDate));
        assert_eq!("total-amount".parse(), Ok(Field::TotalAmount));
        assert!("tax_id".parse::<Field>().is_err());
    }

    #[test]
    fn test_field_serde_names() {
        let json = serde_json::to_string(&Field::VendorName).unwrap();
        assert_eq!(json, "\"vendor_name\"");
        for field in Field::ALL {
            assert_eq!(field.to_string(), field.as_str());
        }
    }
}
