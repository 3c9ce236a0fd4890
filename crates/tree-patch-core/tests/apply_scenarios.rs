use std::rc::Rc;

use tree_patch_core::{apply, ApplyError, Key, Node, PatchBuilder, Patch, Scalar};

fn record_child(node: &Node, name: &str) -> Rc<Node> {
    match node {
        Node::Record(entries) => Rc::clone(&entries[name]),
        other => panic!("expected record, got {:?}", other.kind()),
    }
}

fn seq_items(node: &Node) -> Vec<Rc<Node>> {
    match node {
        Node::Seq(items) => items.clone(),
        other => panic!("expected sequence, got {:?}", other.kind()),
    }
}

// -- empty patch: new tree equals original, children still shared -----------

#[test]
fn empty_patch_reallocates_record_and_shares_children() {
    let tree = Node::record([("x", Node::from(1)), ("y", Node::from("hello"))]);
    let updated = apply(&tree, &Patch::empty()).expect("apply must succeed");

    assert_eq!(updated, tree);
    let before = record_child(&tree, "x");
    let after = record_child(&updated, "x");
    assert!(Rc::ptr_eq(&before, &after), "children must be shared");
}

#[test]
fn empty_patch_preserves_each_kind() {
    let trees = [
        Node::map([(Key::Num(1), Node::from("hello")), (Key::Str("bye".into()), Node::from(2))]),
        Node::set([Key::Num(1), Key::Str("hello".into())]),
        Node::seq([Node::from(1), Node::from("hello")]),
    ];
    for tree in &trees {
        let updated = apply(tree, &Patch::empty()).expect("apply must succeed");
        assert_eq!(&updated, tree);
    }
}

// -- records ----------------------------------------------------------------

#[test]
fn record_set_new_and_existing_fields() {
    let tree = Node::record([("a", Node::from(1)), ("B", Node::from(2))]);
    let patch = PatchBuilder::new()
        .set("a", Node::from(3))
        .set("B", Node::from(4))
        .set("c", Node::from("new"))
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::record([
            ("a", Node::from(3)),
            ("B", Node::from(4)),
            ("c", Node::from("new")),
        ])
    );
}

#[test]
fn record_delete_existing_fields() {
    let tree = Node::record([
        ("a", Node::from(1)),
        ("B", Node::from(2)),
        ("c", Node::from(3)),
        ("D", Node::from(4)),
    ]);
    let patch = PatchBuilder::new().delete("a").delete("c").build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::record([("B", Node::from(2)), ("D", Node::from(4))])
    );
}

#[test]
fn record_delete_missing_fields_is_a_no_op() {
    let tree = Node::record([("a", Node::from(1)), ("B", Node::from(2))]);
    let patch = PatchBuilder::new().delete("C").delete("d").build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(updated, tree);
}

#[test]
fn three_level_nested_child_patches_apply_in_one_call() {
    let tree = Node::record([
        ("a", Node::from("x")),
        ("x", Node::from("x")),
        (
            "child",
            Node::record([
                ("y", Node::from("y")),
                (
                    "grandchild",
                    Node::record([(
                        "z",
                        Node::seq([Node::from(1), Node::from(2), Node::from(3)]),
                    )]),
                ),
            ]),
        ),
    ]);

    let grandchild_patch = PatchBuilder::new()
        .set("greatgrandchild", Node::record([("d", Node::from(4))]))
        .delete("z")
        .build();
    let child_patch = PatchBuilder::new()
        .set("c", Node::from("3"))
        .delete("y")
        .child("grandchild", grandchild_patch)
        .build();
    let patch = PatchBuilder::new()
        .set("a", Node::from(1))
        .set("b", Node::from("2"))
        .delete("x")
        .child("child", child_patch)
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::record([
            ("a", Node::from(1)),
            ("b", Node::from("2")),
            (
                "child",
                Node::record([
                    ("c", Node::from("3")),
                    (
                        "grandchild",
                        Node::record([(
                            "greatgrandchild",
                            Node::record([("d", Node::from(4))]),
                        )]),
                    ),
                ]),
            ),
        ])
    );
}

#[test]
fn untouched_sibling_subtrees_stay_reference_identical() {
    let tree = Node::record([
        ("left", Node::record([("v", Node::from(1))])),
        ("right", Node::record([("v", Node::from(2))])),
    ]);
    let patch = PatchBuilder::new()
        .child("left", PatchBuilder::new().set("v", Node::from(10)).build())
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    let right_before = record_child(&tree, "right");
    let right_after = record_child(&updated, "right");
    assert!(Rc::ptr_eq(&right_before, &right_after));

    let left_before = record_child(&tree, "left");
    let left_after = record_child(&updated, "left");
    assert!(!Rc::ptr_eq(&left_before, &left_after));
    assert_eq!(*left_after, Node::record([("v", Node::from(10))]));
}

// -- associative maps -------------------------------------------------------

fn sample_map() -> Node {
    Node::map([
        (Key::Str("a".into()), Node::from(1)),
        (Key::Str("b".into()), Node::from(2)),
        (Key::Str("c".into()), Node::from(3)),
        (Key::Num(1), Node::from("a")),
        (Key::Num(2), Node::from("b")),
        (Key::Num(3), Node::from("c")),
    ])
}

#[test]
fn map_set_and_delete_mixed_keys() {
    let patch = PatchBuilder::new()
        .set("d", Node::from(4))
        .set(4, Node::from("D"))
        .delete("a")
        .delete("b")
        .delete(2)
        .delete(3)
        .build();

    let updated = apply(&sample_map(), &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::map([
            (Key::Str("c".into()), Node::from(3)),
            (Key::Num(1), Node::from("a")),
            (Key::Str("d".into()), Node::from(4)),
            (Key::Num(4), Node::from("D")),
        ])
    );
}

#[test]
fn map_delete_missing_keys_is_a_no_op() {
    let tree = Node::map([(Key::Str("a".into()), Node::from(1))]);
    let patch = PatchBuilder::new().delete("C").delete(9).build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(updated, tree);
}

#[test]
fn map_delete_all_then_set_keeps_only_new_entries() {
    // The shape the merge engine produces for "clear, then set".
    let patch = PatchBuilder::new()
        .delete_all()
        .set("d", Node::from(4))
        .set(4, Node::from("D"))
        .build();

    let updated = apply(&sample_map(), &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::map([
            (Key::Str("d".into()), Node::from(4)),
            (Key::Num(4), Node::from("D")),
        ])
    );
}

#[test]
fn nested_map_children_under_mixed_keys() {
    let tree = Node::map([
        (Key::Str("x".into()), sample_map()),
        (Key::Num(9), sample_map()),
    ]);
    let child = || {
        PatchBuilder::new()
            .set("d", Node::from(4))
            .set(4, Node::from("D"))
            .delete("a")
            .delete("b")
            .delete(2)
            .delete(3)
            .build()
    };
    let patch = PatchBuilder::new()
        .child("x", child())
        .child(9, child())
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    let expected_inner = Node::map([
        (Key::Str("c".into()), Node::from(3)),
        (Key::Num(1), Node::from("a")),
        (Key::Str("d".into()), Node::from(4)),
        (Key::Num(4), Node::from("D")),
    ]);
    assert_eq!(
        updated,
        Node::map([
            (Key::Str("x".into()), expected_inner.clone()),
            (Key::Num(9), expected_inner),
        ])
    );
}

// -- value sets -------------------------------------------------------------

#[test]
fn set_add_and_delete_elements() {
    let tree = Node::set([Key::Num(1), Key::Num(2), Key::Num(3)]);
    let patch = PatchBuilder::new()
        .add("a")
        .add(4)
        .add(5)
        .delete(2)
        .delete(3)
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::set([Key::Num(1), Key::Str("a".into()), Key::Num(4), Key::Num(5)])
    );
}

#[test]
fn set_delete_all_then_add_keeps_only_added_elements() {
    let tree = Node::set([Key::Num(1), Key::Num(2), Key::Num(3)]);
    let patch = PatchBuilder::new().delete_all().add("a").add(4).add(5).build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::set([Key::Str("a".into()), Key::Num(4), Key::Num(5)])
    );
}

// -- sequences --------------------------------------------------------------

#[test]
fn sequence_splice_removes_and_inserts() {
    let tree = Node::seq([Node::from(0), Node::from(1), Node::from(2), Node::from(3)]);
    let patch = PatchBuilder::new()
        .splice(1, 1, vec![Node::from("a"), Node::from("b")])
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::seq([
            Node::from(0),
            Node::from("a"),
            Node::from("b"),
            Node::from(2),
            Node::from(3),
        ])
    );
}

#[test]
fn sequence_ops_apply_in_list_order() {
    let tree = Node::seq([Node::from(0), Node::from(1), Node::from(2)]);
    let patch = PatchBuilder::new()
        .splice(0, 1, vec![])
        .splice(1, 0, vec![Node::from(9)])
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::seq([Node::from(1), Node::from(9), Node::from(2)])
    );
}

#[test]
fn sequence_set_assigns_by_index_and_extends_with_null() {
    let tree = Node::seq([Node::from(0), Node::from(1)]);
    let patch = PatchBuilder::new()
        .set(1usize, Node::from("x"))
        .set(3usize, Node::from("y"))
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::seq([Node::from(0), Node::from("x"), Node::null(), Node::from("y")])
    );
}

#[test]
fn sequence_delete_by_index_ignores_position_shifts() {
    let tree = Node::seq([Node::from(0), Node::from(1), Node::from(2), Node::from(3)]);
    // Deleting positions 0 and 2 of the original sequence, in either order.
    let patch = PatchBuilder::new().delete(0usize).delete(2usize).build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(updated, Node::seq([Node::from(1), Node::from(3)]));
}

#[test]
fn sequence_child_patch_edits_element_in_place() {
    let tree = Node::seq([
        Node::record([("v", Node::from(1))]),
        Node::record([("v", Node::from(2))]),
    ]);
    let patch = PatchBuilder::new()
        .child(1usize, PatchBuilder::new().set("v", Node::from(20)).build())
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    let items = seq_items(&updated);
    assert_eq!(*items[1], Node::record([("v", Node::from(20))]));

    // Sibling element untouched, still shared with the input.
    let before = seq_items(&tree);
    assert!(Rc::ptr_eq(&before[0], &items[0]));
}

// -- values taken from the patch --------------------------------------------

#[test]
fn set_can_introduce_new_maps_and_sets() {
    let tree = Node::record(Vec::<(String, Node)>::new());
    let patch = PatchBuilder::new()
        .set(
            "a",
            Node::map([
                (Key::Str("x".into()), Node::from(1)),
                (Key::Str("y".into()), Node::from(2)),
                (Key::Str("z".into()), Node::from("3")),
            ]),
        )
        .set("b", Node::set([Key::Num(1), Key::Num(2), Key::Num(4), Key::Num(8)]))
        .set(
            "c",
            Node::map([
                (
                    Key::Str("d".into()),
                    Node::record([
                        ("x", Node::from("1")),
                        ("y", Node::from("2")),
                        ("z", Node::from(3)),
                    ]),
                ),
                (
                    Key::Num(1),
                    Node::map([(Key::Str("x".into()), Node::from(1))]),
                ),
                (
                    Key::Str("e".into()),
                    Node::set([Key::Str("x".into()), Key::Str("y".into()), Key::Str("z".into())]),
                ),
            ]),
        )
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::record([
            (
                "a",
                Node::map([
                    (Key::Str("x".into()), Node::from(1)),
                    (Key::Str("y".into()), Node::from(2)),
                    (Key::Str("z".into()), Node::from("3")),
                ]),
            ),
            (
                "b",
                Node::set([Key::Num(1), Key::Num(2), Key::Num(4), Key::Num(8)]),
            ),
            (
                "c",
                Node::map([
                    (
                        Key::Str("d".into()),
                        Node::record([
                            ("x", Node::from("1")),
                            ("y", Node::from("2")),
                            ("z", Node::from(3)),
                        ]),
                    ),
                    (
                        Key::Num(1),
                        Node::map([(Key::Str("x".into()), Node::from(1))]),
                    ),
                    (
                        Key::Str("e".into()),
                        Node::set([
                            Key::Str("x".into()),
                            Key::Str("y".into()),
                            Key::Str("z".into()),
                        ]),
                    ),
                ]),
            ),
        ])
    );
}

#[test]
fn opaque_stamps_pass_through_unmodified() {
    let tree = Node::record([("child", Node::record(Vec::<(String, Node)>::new()))]);
    let noon = Scalar::Stamp(1_609_459_200_000);
    let midnight = Scalar::Stamp(1_609_372_800_000);

    let patch = PatchBuilder::new()
        .set("a", Node::Scalar(noon.clone()))
        .child(
            "child",
            PatchBuilder::new().set("b", Node::Scalar(midnight.clone())).build(),
        )
        .build();

    let updated = apply(&tree, &patch).expect("apply must succeed");

    assert_eq!(
        updated,
        Node::record([
            ("child", Node::record([("b", Node::Scalar(midnight))])),
            ("a", Node::Scalar(noon)),
        ])
    );
}

// -- errors -----------------------------------------------------------------

#[test]
fn child_patch_with_no_target_is_an_error() {
    let tree = Node::record([("a", Node::from(1))]);
    let patch = PatchBuilder::new()
        .child("missing", PatchBuilder::new().set("x", Node::from(1)).build())
        .build();

    assert_eq!(
        apply(&tree, &patch),
        Err(ApplyError::MissingPatchTarget(Key::Str("missing".into())))
    );
}

#[test]
fn non_index_key_on_a_sequence_is_malformed() {
    let tree = Node::seq([Node::from(1)]);
    let patch = PatchBuilder::new().set("name", Node::from(2)).build();

    assert!(matches!(
        apply(&tree, &patch),
        Err(ApplyError::MalformedPatch(_))
    ));
}
