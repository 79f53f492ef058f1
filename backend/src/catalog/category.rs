//! Category resolution for the `Category_ID` column.
//!
//! Sellers rarely type the exact code, so a value is matched in layers, the
//! first hit winning:
//!
//! 1. exact code (case-insensitive);
//! 2. exact name (case-insensitive);
//! 3. exact example term, so every listed example maps to its own category;
//! 4. containment against the name, in table order;
//! 5. containment against one of the comma-separated examples, in table order.
//!
//! The fuzzy layers need at least [`MIN_FUZZY_LEN`] characters, otherwise a
//! stray `"a"` would land in the first category that happens to contain it.
//! Nothing ever falls back to a default category.

use common::model::category::CategoryMapping;
use std::sync::Arc;

pub const MIN_FUZZY_LEN: usize = 3;

/// Immutable category lookup table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Arc<[CategoryMapping]>,
}

impl CategoryTable {
    pub fn new(entries: Vec<CategoryMapping>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// The FANZON storefront categories.
    pub fn standard() -> Self {
        Self::new(vec![
            CategoryMapping::new("1", "Electronics", "Headphones, Speakers, Laptops, Cameras, Smart Watches"),
            CategoryMapping::new("2", "Fashion", "T-Shirts, Jeans, Dresses, Shoes, Handbags"),
            CategoryMapping::new("3", "Home & Kitchen", "Cookware, Bedding, Furniture, Lamps, Storage"),
            CategoryMapping::new("4", "Beauty & Personal Care", "Skincare, Makeup, Perfume, Hair Care, Shavers"),
            CategoryMapping::new("5", "Sports & Outdoors", "Yoga Mats, Dumbbells, Bicycles, Tents, Footballs"),
            CategoryMapping::new("6", "Books", "Novels, Textbooks, Comics, Cookbooks, Children's Books"),
            CategoryMapping::new("7", "Toys & Games", "Board Games, Puzzles, Dolls, Action Figures, Building Blocks"),
            CategoryMapping::new("8", "Groceries", "Snacks, Beverages, Rice, Spices, Cooking Oil"),
            CategoryMapping::new("9", "Health & Wellness", "Vitamins, Supplements, First Aid, Fitness Trackers, Masks"),
            CategoryMapping::new("10", "Automotive", "Car Accessories, Motor Oil, Tyres, Seat Covers, Dash Cams"),
            CategoryMapping::new("11", "Baby Products", "Diapers, Baby Food, Strollers, Feeding Bottles, Baby Clothes"),
            CategoryMapping::new("12", "Office Supplies", "Notebooks, Pens, Printers, Desk Organizers, Paper"),
            CategoryMapping::new("13", "Pet Supplies", "Pet Food, Leashes, Pet Beds, Aquariums, Cat Litter"),
            CategoryMapping::new("14", "Jewelry & Watches", "Rings, Necklaces, Earrings, Bracelets, Wrist Watches"),
            CategoryMapping::new("15", "Mobile Phones & Accessories", "Smartphones, Phone Cases, Chargers, Power Banks, Screen Protectors"),
        ])
    }

    pub fn entries(&self) -> &[CategoryMapping] {
        &self.entries
    }

    pub fn resolve(&self, raw: &str) -> Option<&CategoryMapping> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(hit) = self
            .entries
            .iter()
            .find(|c| c.code.to_lowercase() == needle)
        {
            return Some(hit);
        }
        if let Some(hit) = self
            .entries
            .iter()
            .find(|c| c.name.to_lowercase() == needle)
        {
            return Some(hit);
        }

        if let Some(hit) = self
            .entries
            .iter()
            .find(|c| example_terms(c).any(|e| e == needle))
        {
            return Some(hit);
        }

        if needle.chars().count() < MIN_FUZZY_LEN {
            return None;
        }

        self.entries
            .iter()
            .find(|c| contains_either_way(&c.name.to_lowercase(), &needle))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|c| example_terms(c).any(|e| contains_either_way(&e, &needle)))
            })
    }
}

fn example_terms(category: &CategoryMapping) -> impl Iterator<Item = String> + '_ {
    category
        .examples
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

fn contains_either_way(candidate: &str, needle: &str) -> bool {
    candidate.contains(needle) || needle.contains(candidate)
}
