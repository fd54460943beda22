use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_PRODUCT_TYPE: &str = "template";
const DEFAULT_CATEGORY: &str = "Uncategorized";
const DEFAULT_AFFILIATE_COMMISSION: f64 = 30.0;

#[derive(Debug, serde::Serialize)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub product_type: String,
    pub category: String,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub affiliate_commission: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewProduct {
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub product_type: String,
    pub category: String,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub affiliate_commission: f64,
}

#[derive(Deserialize)]
pub struct NewProductBody {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub affiliate_commission: Option<f64>,
}

impl TryFrom<NewProductBody> for NewProduct {
    type Error = String;

    fn try_from(body: NewProductBody) -> Result<Self, Self::Error> {
        let name = match body.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => return Err(String::from("name is required")),
        };
        let slug = match body.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_lowercase(),
            _ => return Err(String::from("slug is required")),
        };
        if slug.chars().any(|char| char.is_whitespace()) {
            return Err(format!("{} is not a valid slug", slug));
        }
        let price = match body.price {
            Some(price) if price.is_finite() && price >= 0.0 => price,
            Some(_) => return Err(String::from("price must be a non-negative number")),
            None => return Err(String::from("price is required")),
        };

        Ok(NewProduct {
            slug,
            name,
            short_description: body.short_description.unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            price,
            compare_at_price: body.compare_at_price,
            product_type: body
                .product_type
                .unwrap_or_else(|| DEFAULT_PRODUCT_TYPE.to_string()),
            category: body.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: body.tags.unwrap_or_default(),
            features: body.features.unwrap_or_default(),
            is_featured: body.is_featured.unwrap_or(false),
            affiliate_commission: body
                .affiliate_commission
                .unwrap_or(DEFAULT_AFFILIATE_COMMISSION),
        })
    }
}
