//! Billing document kinds and their numbering conventions.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// The four numbered billing document types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    SalesOrder,
    PurchaseOrder,
    Invoice,
    VendorBill,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SalesOrder => "sales_order",
            Self::PurchaseOrder => "purchase_order",
            Self::Invoice => "invoice",
            Self::VendorBill => "vendor_bill",
        }
    }

    /// Human-readable prefix used in document numbers (e.g. `INV-3001`).
    pub fn number_prefix(self) -> &'static str {
        match self {
            Self::SalesOrder => "SO",
            Self::PurchaseOrder => "PO",
            Self::Invoice => "INV",
            Self::VendorBill => "BILL",
        }
    }

    pub fn format_number(self, value: i64) -> String {
        format!("{}-{}", self.number_prefix(), value)
    }
}

impl TryFrom<&str> for DocumentKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "sales_order" => Ok(Self::SalesOrder),
            "purchase_order" => Ok(Self::PurchaseOrder),
            "invoice" => Ok(Self::Invoice),
            "vendor_bill" => Ok(Self::VendorBill),
            other => Err(EngineError::Validation(format!(
                "invalid document kind: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_format_uses_kind_prefix() {
        assert_eq!(DocumentKind::SalesOrder.format_number(1001), "SO-1001");
        assert_eq!(DocumentKind::Invoice.format_number(3002), "INV-3002");
        assert_eq!(DocumentKind::VendorBill.format_number(4001), "BILL-4001");
    }

    #[test]
    fn kind_round_trips_as_str() {
        for kind in [
            DocumentKind::SalesOrder,
            DocumentKind::PurchaseOrder,
            DocumentKind::Invoice,
            DocumentKind::VendorBill,
        ] {
            assert_eq!(DocumentKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }
}
