use crate::model::category::{Category, CategoryCollection, is_valid_category_name};
use crate::model::ids::IdGenerator;

/// Append a new, empty category. Blank names leave the collection unchanged.
pub fn add_category(
    categories: &[Category],
    name: &str,
    color: &str,
    ids: &mut IdGenerator,
) -> CategoryCollection {
    let mut next = categories.to_vec();
    if !is_valid_category_name(name) {
        return next;
    }
    next.push(Category::new(ids.next_id(), name, color));
    next
}

/// Replace the entry whose id matches `updated.id`.
///
/// The caller is trusted to have kept the id intact; an id that matches no
/// entry leaves the collection unchanged.
pub fn update_category(categories: &[Category], updated: Category) -> CategoryCollection {
    categories
        .iter()
        .map(|c| {
            if c.id == updated.id {
                updated.clone()
            } else {
                c.clone()
            }
        })
        .collect()
}

/// Remove a category and every task in it. Irreversible; confirm first.
pub fn delete_category(categories: &[Category], category_id: &str) -> CategoryCollection {
    categories
        .iter()
        .filter(|c| c.id != category_id)
        .cloned()
        .collect()
}

/// Rename a category value. Blank names are ignored.
pub fn rename_category(category: &Category, name: &str) -> Category {
    let mut next = category.clone();
    if is_valid_category_name(name) {
        next.name = name.trim().to_string();
    }
    next
}

pub fn recolor_category(category: &Category, color: &str) -> Category {
    let mut next = category.clone();
    let color = color.trim();
    if !color.is_empty() {
        next.color = color.to_string();
    }
    next
}

/// Resolve a category by exact id, falling back to a case-insensitive name match.
pub fn find_category<'a>(categories: &'a [Category], key: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.id == key).or_else(|| {
        let key = key.trim().to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::category::seed_categories;
    use crate::model::task::Task;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_add_category_grows_by_one_with_fresh_id() {
        let mut ids = IdGenerator::seeded(&seed_categories());
        let before = seed_categories();
        let after = add_category(&before, "  Fitness ", "#2ECC71", &mut ids);

        assert_eq!(after.len(), before.len() + 1);
        let added = after.last().unwrap();
        assert_eq!(added.name, "Fitness");
        assert_eq!(added.color, "#2ECC71");
        assert!(added.tasks.is_empty());
        assert!(before.iter().all(|c| c.id != added.id));
    }

    #[test]
    fn test_add_category_rejects_blank_names() {
        let mut ids = IdGenerator::new();
        let before = seed_categories();
        for name in ["", " ", "\t\n"] {
            assert_eq!(add_category(&before, name, "#000000", &mut ids), before);
        }
    }

    #[test]
    fn test_many_categories_have_unique_ids() {
        let mut ids = IdGenerator::new();
        let mut cats = Vec::new();
        for i in 0..100 {
            cats = add_category(&cats, &format!("c{}", i), "#000000", &mut ids);
        }
        let unique: HashSet<_> = cats.iter().map(|c| c.id.clone()).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_update_category_replaces_matching_entry() {
        let before = seed_categories();
        let mut updated = before[1].clone();
        updated.tasks.push(Task::new("t1".into(), "Invoice", 0));

        let after = update_category(&before, updated.clone());
        assert_eq!(after.len(), before.len());
        assert_eq!(after[1], updated);
        assert_eq!(after[0], before[0]);
        // Input snapshot untouched
        assert!(before[1].tasks.is_empty());
    }

    #[test]
    fn test_update_category_unknown_id_is_noop() {
        let before = seed_categories();
        let stray = Category::new("999".into(), "Ghost", "#FFFFFF");
        assert_eq!(update_category(&before, stray), before);
    }

    #[test]
    fn test_delete_category() {
        let before = seed_categories();
        let after = delete_category(&before, "3");
        assert_eq!(after.len(), 5);
        assert!(after.iter().all(|c| c.id != "3"));
        assert_eq!(delete_category(&before, "nope"), before);
    }

    #[test]
    fn test_rename_and_recolor() {
        let cat = seed_categories().remove(0);
        assert_eq!(rename_category(&cat, " Clients ").name, "Clients");
        assert_eq!(rename_category(&cat, "  "), cat);
        assert_eq!(recolor_category(&cat, "#000000").color, "#000000");
        assert_eq!(recolor_category(&cat, ""), cat);
    }

    #[test]
    fn test_find_category_by_id_then_name() {
        let cats = seed_categories();
        assert_eq!(find_category(&cats, "4").unwrap().name, "AI & Tech");
        assert_eq!(find_category(&cats, "learning").unwrap().id, "5");
        assert_eq!(find_category(&cats, " PERSONAL ").unwrap().id, "6");
        assert!(find_category(&cats, "Hobbies").is_none());
    }
}
