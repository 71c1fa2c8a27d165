use atelier_core::{ElementId, LayerError};
use atelier_designer::{DesignElement, ElementKind, ElementPatch, LayerStack, ShapeKind};
use proptest::prelude::*;

fn stack_with(elements: Vec<DesignElement>) -> LayerStack {
    let mut stack = LayerStack::new();
    for element in elements {
        stack.add(element).unwrap();
    }
    stack
}

#[test]
fn test_update_missing_id_leaves_stack_unchanged() {
    let mut stack = stack_with(vec![DesignElement::shape(ShapeKind::Rectangle)]);
    let before = stack.clone();
    let revision = stack.revision();

    let err = stack
        .update(
            &ElementId::from("missing-id"),
            &ElementPatch::new().position(1.0, 2.0),
        )
        .unwrap_err();

    assert!(matches!(err, LayerError::NotFound { .. }));
    assert_eq!(stack, before);
    assert_eq!(stack.revision(), revision);
}

#[test]
fn test_update_foreign_field_is_rejected() {
    let mut stack = LayerStack::new();
    let id = stack.add(DesignElement::shape(ShapeKind::Star)).unwrap();
    let before = stack.clone();

    let err = stack
        .update(&id, &ElementPatch::new().text("hello").rotation(45.0))
        .unwrap_err();

    assert!(matches!(err, LayerError::TypeMismatch { .. }));
    assert_eq!(stack, before);
}

#[test]
fn test_update_merges_fields() {
    let mut stack = LayerStack::new();
    let id = stack.add(DesignElement::text("Bonjour", "Inter")).unwrap();

    stack
        .update(&id, &ElementPatch::new().text("Salut").rotation(-90.0))
        .unwrap();

    match stack.get(&id).unwrap() {
        DesignElement::Text(text) => {
            assert_eq!(text.text, "Salut");
            assert_eq!(text.common.rotation, 270.0);
            assert_eq!(text.font_family, "Inter");
        }
        other => panic!("unexpected element {:?}", other),
    }
}

#[test]
fn test_duplicate_identifier_rejected() {
    let mut stack = LayerStack::new();
    stack
        .add(DesignElement::shape(ShapeKind::Circle).with_id("logo"))
        .unwrap();
    let err = stack
        .add(DesignElement::text("x", "Inter").with_id("logo"))
        .unwrap_err();
    assert!(matches!(err, LayerError::DuplicateIdentifier { .. }));
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_remove_is_idempotent_and_clears_selection() {
    let mut stack = LayerStack::new();
    let id = stack.add(DesignElement::shape(ShapeKind::Triangle)).unwrap();
    assert_eq!(stack.selected_id(), Some(&id));

    assert!(stack.remove(&id).is_some());
    assert!(stack.selected_id().is_none());
    assert!(stack.remove(&id).is_none());
    assert!(stack.is_empty());
}

#[test]
fn test_reorder_to_top_and_bottom() {
    let a = DesignElement::shape(ShapeKind::Rectangle).with_z(5);
    let b = DesignElement::shape(ShapeKind::Circle).with_z(1);
    let c = DesignElement::shape(ShapeKind::Star).with_z(3);
    let (ida, idb, idc) = (a.id().clone(), b.id().clone(), c.id().clone());
    let mut stack = stack_with(vec![a, b, c]);

    assert_eq!(stack.reorder_to_top(&idb).unwrap(), 6);
    assert_eq!(stack.reorder_to_bottom(&ida).unwrap(), 2);

    let order: Vec<&ElementId> = stack.paint_order().into_iter().map(|e| e.id()).collect();
    assert_eq!(order, vec![&ida, &idc, &idb]);

    let panel: Vec<ElementKind> = stack.layers().into_iter().map(|l| l.kind).collect();
    assert_eq!(panel.len(), 3);
    assert!(stack.reorder_to_top(&ElementId::from("ghost")).is_err());
}

#[test]
fn test_selection_of_unknown_id_clears() {
    let mut stack = stack_with(vec![DesignElement::shape(ShapeKind::Rectangle)]);
    assert!(stack.selected_id().is_some());
    assert!(stack
        .set_selection(Some(&ElementId::from("nobody")))
        .is_none());
    assert!(stack.selected().is_none());
}

#[test]
fn test_locked_elements_refuse_drag() {
    let mut stack = LayerStack::new();
    let id = stack.add(DesignElement::shape(ShapeKind::Rectangle)).unwrap();
    assert!(stack.toggle_lock(&id).unwrap());

    assert!(matches!(
        stack.move_by(&id, 5.0, 5.0),
        Err(LayerError::ElementLocked { .. })
    ));
    // programmatic updates still apply
    stack
        .update(&id, &ElementPatch::new().position(1.0, 1.0))
        .unwrap();
    assert_eq!(stack.get(&id).unwrap().common().position.x, 1.0);
}

fn arb_element() -> impl Strategy<Value = DesignElement> {
    (
        0usize..6,
        -500.0f64..2500.0,
        -500.0f64..2500.0,
        -10i32..10,
        0.0f64..720.0,
    )
        .prop_map(|(kind, x, y, z, rotation)| {
            let element = match kind {
                0 => DesignElement::shape(ShapeKind::Rectangle),
                1 => DesignElement::shape(ShapeKind::Circle),
                2 => DesignElement::shape(ShapeKind::Triangle),
                3 => DesignElement::shape(ShapeKind::Star),
                4 => DesignElement::text("Nouveau texte", "Inter"),
                _ => DesignElement::image("data:image/png;base64,AAAA"),
            };
            let element = element.at(x, y).with_z(z);
            ElementPatch::new()
                .rotation(rotation)
                .apply_to(&element)
                .unwrap()
        })
}

proptest! {
    #[test]
    fn prop_remove_undoes_add(
        existing in prop::collection::vec(arb_element(), 0..8),
        extra in arb_element(),
    ) {
        let mut stack = stack_with(existing);
        let before = stack.clone();

        let id = stack.add(extra).unwrap();
        stack.remove(&id);

        prop_assert_eq!(stack, before);
    }

    #[test]
    fn prop_paint_order_sorted_and_stable(elements in prop::collection::vec(arb_element(), 0..12)) {
        let stack = stack_with(elements);
        let order = stack.paint_order();
        for pair in order.windows(2) {
            prop_assert!(pair[0].z_index() <= pair[1].z_index());
            if pair[0].z_index() == pair[1].z_index() {
                let pos = |id: &ElementId| stack.elements().iter().position(|e| e.id() == id);
                prop_assert!(pos(pair[0].id()) < pos(pair[1].id()));
            }
        }
    }
}
