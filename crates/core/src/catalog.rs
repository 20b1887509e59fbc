//! Static product catalog.
//!
//! The catalog is seed data compiled into the binary. It has no create,
//! update or delete operations.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Product category. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Beverages,
    Bakery,
    Snacks,
    Meals,
    Desserts,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Beverages,
        Self::Bakery,
        Self::Snacks,
        Self::Meals,
        Self::Desserts,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Beverages => "Beverages",
            Self::Bakery => "Bakery",
            Self::Snacks => "Snacks",
            Self::Meals => "Meals",
            Self::Desserts => "Desserts",
        }
    }

    /// URL slug.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Beverages => "beverages",
            Self::Bakery => "bakery",
            Self::Snacks => "snacks",
            Self::Meals => "meals",
            Self::Desserts => "desserts",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: &'static str,
    pub description: &'static str,
    pub price: Price,
    pub category: Category,
}

/// Seed rows: id, name, description, category, price in cents.
#[rustfmt::skip]
const SEED: &[(u32, &str, &str, Category, u32)] = &[
    (1, "Espresso", "Double shot of house-roasted espresso", Category::Beverages, 300),
    (2, "Cappuccino", "Espresso with steamed milk and foam", Category::Beverages, 450),
    (3, "Iced Tea", "Fresh-brewed black tea over ice", Category::Beverages, 350),
    (4, "Croissant", "Butter croissant baked every morning", Category::Bakery, 325),
    (5, "Blueberry Muffin", "Muffin packed with wild blueberries", Category::Bakery, 375),
    (6, "Sourdough Loaf", "Naturally leavened country loaf", Category::Bakery, 800),
    (7, "Kettle Chips", "Sea salt kettle-cooked potato chips", Category::Snacks, 250),
    (8, "Trail Mix", "Nuts, seeds and dried fruit", Category::Snacks, 425),
    (9, "Club Sandwich", "Turkey, bacon, lettuce and tomato", Category::Meals, 1195),
    (10, "Caesar Salad", "Romaine, parmesan and garlic croutons", Category::Meals, 995),
    (11, "Cheesecake Slice", "New York style with berry compote", Category::Desserts, 650),
    (12, "Chocolate Brownie", "Fudgy brownie with dark chocolate", Category::Desserts, 400),
];

static PRODUCTS: LazyLock<Vec<Product>> = LazyLock::new(|| {
    SEED.iter()
        .map(|&(id, name, description, category, cents)| Product {
            id: ProductId::new(id),
            name,
            description,
            price: Price::from_cents(cents),
            category,
        })
        .collect()
});

/// Every product, ordered by id.
#[must_use]
pub fn products() -> &'static [Product] {
    &PRODUCTS
}

/// Products in one category, ordered by id.
pub fn products_in(category: Category) -> impl Iterator<Item = &'static Product> {
    products().iter().filter(move |p| p.category == category)
}

/// Look up a product by id.
#[must_use]
pub fn find_product(id: ProductId) -> Option<&'static Product> {
    products().iter().find(|p| p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_unique_and_positive() {
        let ids: HashSet<_> = products().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), products().len());
        assert!(products().iter().all(|p| p.id.as_u32() > 0));
    }

    #[test]
    fn test_every_category_has_products() {
        for category in Category::ALL {
            assert!(products_in(category).next().is_some(), "{category} is empty");
        }
    }

    #[test]
    fn test_category_from_slug() {
        assert_eq!("bakery".parse::<Category>().unwrap(), Category::Bakery);
        assert_eq!(" Desserts ".parse::<Category>().unwrap(), Category::Desserts);
        assert!("furniture".parse::<Category>().is_err());
    }

    #[test]
    fn test_find_product() {
        let espresso = find_product(ProductId::new(1)).unwrap();
        assert_eq!(espresso.name, "Espresso");
        assert_eq!(espresso.price, Price::from_cents(300));
        assert!(find_product(ProductId::new(999)).is_none());
    }

    #[test]
    fn test_product_serializes_category_slug() {
        let json = serde_json::to_value(find_product(ProductId::new(4)).unwrap()).unwrap();
        assert_eq!(json["category"], "bakery");
        assert_eq!(json["price"], "3.25");
    }
}
