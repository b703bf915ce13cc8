//! Merge per-page menu documents into one `{ name, categories }` result.

use crate::error::MenuScanError;
use crate::menu::{AggregatedMenu, MenuDocument};

/// Combine page documents, in page order, into a single menu.
///
/// `pages[i]` is `None` when page `i` could not be parsed; such pages
/// contribute no categories. The name is always the first menu of the first
/// page. There is no fallback to a later page: a menu named after page 2
/// would silently misname multi-menu scans.
///
/// # Errors
/// - [`MenuScanError::FirstPageUnparsed`] if `pages` is empty or page 1 is absent
/// - [`MenuScanError::MissingMenuName`] if page 1 parsed with an empty `menus` list
pub fn aggregate(pages: &[Option<MenuDocument>]) -> Result<AggregatedMenu, MenuScanError> {
    let first = pages
        .first()
        .and_then(Option::as_ref)
        .ok_or(MenuScanError::FirstPageUnparsed)?;
    let name = first
        .menus
        .first()
        .map(|m| m.name.clone())
        .ok_or(MenuScanError::MissingMenuName)?;

    let categories = pages
        .iter()
        .flatten()
        .flat_map(|doc| doc.menus.iter())
        .flat_map(|menu| menu.categories.iter().cloned())
        .collect();

    Ok(AggregatedMenu { name, categories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str, categories: &[&str]) -> MenuDocument {
        let cats: Vec<_> = categories
            .iter()
            .map(|c| json!({ "name": c, "products": [] }))
            .collect();
        serde_json::from_value(json!({ "menus": [{ "name": name, "categories": cats }] })).unwrap()
    }

    fn names(menu: &AggregatedMenu) -> Vec<&str> {
        menu.categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn categories_concatenate_in_page_order() {
        let pages = vec![
            Some(doc("Bistro", &["Starters", "Mains"])),
            Some(doc("Ignored", &["Desserts"])),
        ];
        let menu = aggregate(&pages).unwrap();
        assert_eq!(menu.name, "Bistro");
        assert_eq!(names(&menu), ["Starters", "Mains", "Desserts"]);
    }

    #[test]
    fn absent_middle_page_is_skipped() {
        let pages = vec![Some(doc("A", &["One"])), None, Some(doc("B", &["Two"]))];
        let menu = aggregate(&pages).unwrap();
        assert_eq!(menu.name, "A");
        assert_eq!(names(&menu), ["One", "Two"]);
    }

    #[test]
    fn absent_first_page_fails() {
        let pages = vec![None, Some(doc("B", &["Two"]))];
        assert!(matches!(aggregate(&pages), Err(MenuScanError::FirstPageUnparsed)));
    }

    #[test]
    fn no_pages_fails() {
        assert!(matches!(aggregate(&[]), Err(MenuScanError::FirstPageUnparsed)));
    }

    #[test]
    fn first_page_without_menus_fails() {
        let empty: MenuDocument = serde_json::from_value(json!({ "menus": [] })).unwrap();
        assert!(matches!(aggregate(&[Some(empty)]), Err(MenuScanError::MissingMenuName)));
    }

    #[test]
    fn every_menu_on_a_page_contributes() {
        let two_menus: MenuDocument = serde_json::from_value(json!({
            "menus": [
                { "name": "Lunch", "categories": [{ "name": "Sandwiches" }] },
                { "name": "Dinner", "categories": [{ "name": "Steaks" }] }
            ]
        }))
        .unwrap();
        let menu = aggregate(&[Some(two_menus)]).unwrap();
        assert_eq!(menu.name, "Lunch");
        assert_eq!(names(&menu), ["Sandwiches", "Steaks"]);
    }

    #[test]
    fn page_with_no_categories_adds_nothing() {
        let pages = vec![Some(doc("Solo", &[]))];
        let menu = aggregate(&pages).unwrap();
        assert!(menu.categories.is_empty());
    }
}
