//! Catalog collaborator: categories and the products created on approval

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::donation::DonationRequest;
use crate::core::error::DonationError;

/// A catalog category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Status given to every product listed from a donation
pub const DONATED_PRODUCT_STATUS: &str = "Active";

/// An inventory entry
///
/// Field names follow the catalog's wire format (`pName`, `pPrice`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "pName")]
    pub name: String,
    #[serde(rename = "pDescription")]
    pub description: String,
    #[serde(rename = "pCategory")]
    pub category: Uuid,
    #[serde(rename = "pImages")]
    pub images: Vec<String>,
    #[serde(rename = "pPrice")]
    pub price: u64,
    #[serde(rename = "pQuantity")]
    pub quantity: u32,
    #[serde(rename = "pStatus")]
    pub status: String,
    #[serde(rename = "donatedBy")]
    pub donated_by: Option<Uuid>,
    #[serde(rename = "isDonated")]
    pub is_donated: bool,
    #[serde(rename = "donationRequestId")]
    pub donation_request_id: Option<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for a product about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: Uuid,
    pub images: Vec<String>,
    pub price: u64,
    pub quantity: u32,
    pub status: String,
    pub donated_by: Option<Uuid>,
    pub is_donated: bool,
    pub donation_request_id: Option<Uuid>,
}

impl NewProduct {
    /// Free listing derived verbatim from a donation request
    pub fn from_donation(request: &DonationRequest) -> Self {
        Self {
            name: request.organ_name.clone(),
            description: request.description.clone(),
            category: request.category,
            images: request.images.clone(),
            price: 0,
            quantity: request.quantity,
            status: DONATED_PRODUCT_STATUS.to_string(),
            donated_by: Some(request.requested_by),
            is_donated: true,
            donation_request_id: Some(request.id),
        }
    }

    pub fn into_product(self) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category: self.category,
            images: self.images,
            price: self.price,
            quantity: self.quantity,
            status: self.status,
            donated_by: self.donated_by,
            is_donated: self.is_donated,
            donation_request_id: self.donation_request_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Catalog store
///
/// Owned by the catalog side of the application; the workflow only reads
/// categories and creates (or, to compensate a failed approval, removes)
/// donated products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a category by id
    async fn find_category(&self, id: &Uuid) -> Result<Option<Category>, DonationError>;

    /// Create a product
    ///
    /// At most one product exists per donation request: when `product`
    /// references a request that is already listed, the existing product is
    /// returned unchanged.
    async fn create_product(&self, product: NewProduct) -> Result<Product, DonationError>;

    /// Remove a product
    async fn delete_product(&self, id: &Uuid) -> Result<(), DonationError>;

    /// Find the product listed from a given donation request, if any
    async fn find_product_by_donation(
        &self,
        donation_request_id: &Uuid,
    ) -> Result<Option<Product>, DonationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::donation::NewDonationRequest;

    #[test]
    fn test_from_donation_copies_fields() {
        let requester = Uuid::new_v4();
        let request = DonationRequest::pending(
            NewDonationRequest {
                organ_name: "Cornea".to_string(),
                category: Uuid::new_v4(),
                images: vec!["a.png".to_string(), "b.png".to_string()],
                pin_code: 110001,
                description: "Donor registered at city hospital".to_string(),
                quantity: 2,
            },
            requester,
        );

        let product = NewProduct::from_donation(&request).into_product();

        assert_eq!(product.name, "Cornea");
        assert_eq!(product.category, request.category);
        assert_eq!(product.images, request.images);
        assert_eq!(product.quantity, 2);
        assert_eq!(product.price, 0);
        assert!(product.is_donated);
        assert_eq!(product.donated_by, Some(requester));
        assert_eq!(product.donation_request_id, Some(request.id));
    }

    #[test]
    fn test_product_wire_names() {
        let json = serde_json::to_value(
            NewProduct {
                name: "Liver".to_string(),
                description: "Partial liver lobe".to_string(),
                category: Uuid::nil(),
                images: vec![],
                price: 0,
                quantity: 1,
                status: DONATED_PRODUCT_STATUS.to_string(),
                donated_by: None,
                is_donated: true,
                donation_request_id: None,
            }
            .into_product(),
        )
        .unwrap();

        assert_eq!(json["pName"], "Liver");
        assert_eq!(json["pPrice"], 0);
        assert_eq!(json["isDonated"], true);
        assert_eq!(json["pStatus"], "Active");
    }
}
