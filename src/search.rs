//! In-memory filtering for entity lists.
//!
//! Pure functions of `(items, term, facet)`; the list controller caches the
//! result and slices it into pages.

use crate::model::Resource;

/// Case-insensitive substring test across the entity's displayed fields.
/// A blank term matches everything.
pub fn matches_term<T: Resource>(item: &T, term: &str) -> bool {
    let q = term.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&q))
}

/// `None` matches everything; otherwise the entity's facet must equal `facet`.
pub fn matches_facet<T: Resource>(item: &T, facet: Option<&str>) -> bool {
    match facet {
        None => true,
        Some(want) => item.facet().is_some_and(|f| f.eq_ignore_ascii_case(want)),
    }
}

/// Indices into `items` that pass both filters, in fetch order.
pub fn filter_indices<T: Resource>(items: &[T], term: &str, facet: Option<&str>) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| matches_facet(*item, facet) && matches_term(*item, term))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryItem, InventoryType, Patient};

    fn mk_patient(cedula: &str, name: &str, email: &str) -> Patient {
        Patient {
            cedula: cedula.to_string(),
            full_name: name.to_string(),
            email: email.to_string(),
            ..Patient::default()
        }
    }

    fn mk_item(name: &str, kind: InventoryType) -> InventoryItem {
        InventoryItem {
            name: name.to_string(),
            item_type: Some(kind),
            ..InventoryItem::default()
        }
    }

    #[test]
    fn search_patients_filters_by_multiple_fields() {
        let patients = vec![
            mk_patient("10000001", "Ana Ruiz", "ana@mail.co"),
            mk_patient("10000002", "Bob Perez", "bob@mail.co"),
            mk_patient("20000003", "Carla Diaz", "carla@other.co"),
        ];
        assert_eq!(filter_indices(&patients, "bOb", None), vec![1]);
        assert_eq!(filter_indices(&patients, "1000000", None), vec![0, 1]);
        assert_eq!(filter_indices(&patients, "OTHER.co", None), vec![2]);
        assert_eq!(filter_indices(&patients, "  ", None), vec![0, 1, 2]);
        assert!(filter_indices(&patients, "zzz", None).is_empty());
    }

    #[test]
    fn filtering_is_deterministic() {
        let patients = vec![
            mk_patient("1", "Juan", "j@x.co"),
            mk_patient("2", "Juana", "jj@x.co"),
        ];
        let a = filter_indices(&patients, "jua", None);
        let b = filter_indices(&patients, "jua", None);
        assert_eq!(a, b);
        assert!(matches_term(&patients[1], "ANA"));
    }

    #[test]
    fn filter_agrees_with_matches_term() {
        let patients = vec![
            mk_patient("10000001", "Ana Ruiz", "ana@mail.co"),
            mk_patient("10000002", "Bob Perez", "bob@mail.co"),
        ];
        for term in ["ana", " RUIZ ", "mail", "x"] {
            let expected: Vec<usize> = (0..patients.len()).filter(|i| matches_term(&patients[*i], term)).collect();
            assert_eq!(filter_indices(&patients, term, None), expected, "term {term:?}");
        }
    }

    #[test]
    fn facet_combines_with_term() {
        let items = vec![
            mk_item("Ibuprofen", InventoryType::Medicamento),
            mk_item("Syringe", InventoryType::Suministro),
            mk_item("Insulin syringe", InventoryType::Medicamento),
        ];
        assert_eq!(filter_indices(&items, "", Some("MEDICAMENTO")), vec![0, 2]);
        assert_eq!(filter_indices(&items, "syringe", Some("MEDICAMENTO")), vec![2]);
        assert_eq!(filter_indices(&items, "syringe", None), vec![1, 2]);
    }
}
