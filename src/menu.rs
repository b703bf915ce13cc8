//! Typed menu schema the model is instructed to emit, one document per page.
//!
//! Field names match the JSON contract in [`crate::prompts`]. Optional
//! fields that were absent in the model reply stay absent when the menu is
//! serialised back out, so the API response mirrors what the model saw.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One page's parsed model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuDocument {
    pub menus: Vec<Menu>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Set-menu courses. Never shares a category with `categories`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<Course>>,
    /// Set-menu price; 0 or absent for à la carte menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<Vec<ModifierGroup>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierGroup {
    pub name: String,
    #[serde(default)]
    pub options: Vec<ModifierOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub options: Vec<CourseOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<Addon>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
}

/// The merged result of every page: the sole output of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMenu {
    pub name: String,
    pub categories: Vec<Category>,
}

impl MenuDocument {
    /// Check semantic constraints serde cannot express.
    ///
    /// Returns a human-readable path to the first offending value.
    pub fn validate(&self) -> Result<(), String> {
        for (m, menu) in self.menus.iter().enumerate() {
            let at = format!("menus[{m}]");
            check_price(menu.price, &at)?;
            for (c, category) in menu.categories.iter().enumerate() {
                for (p, product) in category.products.iter().enumerate() {
                    let at = format!("{at}.categories[{c}].products[{p}]");
                    check_price(Some(product.price), &at)?;
                    for (g, group) in product.modifiers.iter().flatten().enumerate() {
                        for (o, option) in group.options.iter().enumerate() {
                            let option_at = format!("{at}.modifiers[{g}].options[{o}]");
                            check_price(option.price, &option_at)?;
                        }
                    }
                }
            }
            for (c, course) in menu.courses.iter().flatten().enumerate() {
                for (o, option) in course.options.iter().enumerate() {
                    let at = format!("{at}.courses[{c}].options[{o}]");
                    check_price(option.price, &at)?;
                    for (a, addon) in option.addons.iter().flatten().enumerate() {
                        check_price(addon.price, &format!("{at}.addons[{a}]"))?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_price(price: Option<f64>, at: &str) -> Result<(), String> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            Err(format!("{at}.price must be a non-negative number, got {p}"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn burger_doc() -> serde_json::Value {
        json!({
            "menus": [{
                "name": "The Crown",
                "categories": [{
                    "name": "Mains",
                    "products": [{
                        "name": "Burger",
                        "price": 12.5,
                        "calories": 850,
                        "allergies": ["nuts", "gluten-free", "nuts"],
                        "modifiers": [{
                            "name": "Upgrade fries",
                            "options": [{ "name": "Large fries", "price": 1.5 }]
                        }]
                    }]
                }]
            }]
        })
    }

    #[test]
    fn parses_full_product() {
        let doc: MenuDocument = serde_json::from_value(burger_doc()).unwrap();
        let product = &doc.menus[0].categories[0].products[0];
        assert_eq!(product.calories, Some(850));
        assert_eq!(product.allergies.as_ref().unwrap().len(), 2);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn absent_optionals_stay_absent() {
        let doc: MenuDocument = serde_json::from_value(json!({
            "menus": [{ "name": "Cafe", "categories": [{ "name": "Drinks", "products": [{ "name": "Tea", "price": 2 }] }] }]
        }))
        .unwrap();
        let out = serde_json::to_value(&doc).unwrap();
        let product = &out["menus"][0]["categories"][0]["products"][0];
        assert_eq!(product, &json!({ "name": "Tea", "price": 2.0 }));
        assert!(out["menus"][0].get("courses").is_none());
    }

    #[test]
    fn set_menu_courses_parse() {
        let doc: MenuDocument = serde_json::from_value(json!({
            "menus": [{
                "name": "Sunday Lunch",
                "price": 29.95,
                "courses": [{
                    "title": "Mains",
                    "options": [{ "name": "Turkey", "addons": [{ "name": "Extra gravy", "price": 1.99 }] }]
                }]
            }]
        }))
        .unwrap();
        assert!(doc.menus[0].categories.is_empty());
        assert_eq!(doc.menus[0].courses.as_ref().unwrap()[0].options[0].name, "Turkey");
    }

    #[test]
    fn missing_product_price_is_rejected() {
        let result: Result<MenuDocument, _> = serde_json::from_value(json!({
            "menus": [{ "name": "X", "categories": [{ "name": "Y", "products": [{ "name": "Z" }] }] }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn negative_price_fails_validation() {
        let mut value = burger_doc();
        let product = &mut value["menus"][0]["categories"][0]["products"][0];
        product["modifiers"][0]["options"][0]["price"] = json!(-1);
        let doc: MenuDocument = serde_json::from_value(value).unwrap();
        let err = doc.validate().unwrap_err();
        assert!(err.contains("modifiers[0].options[0].price"), "got: {err}");
    }
}
