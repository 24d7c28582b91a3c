use super::{load_tree_json, parse_manifest_json, NodeManifest, RangeEntry, MAX_MANIFEST_DEPTH};
use crate::error::{ManifestError, TreeError};
use crate::node::NodeId;
use crate::tree::TemplateTree;

const ZIP_HEADER: &str = r#"[{
    "label": "Local File Header",
    "section": true,
    "ranges": [{"location": 0, "length": 30}],
    "children": [
        {"label": "Signature", "value": "PK\\x03\\x04", "ranges": [{"location": 0, "length": 4}]},
        {"label": "Version", "value": "20", "ranges": [{"location": 4, "length": 2}]},
        {"label": "Flags", "group": true, "children": [
            {"label": "Encrypted", "value": "no", "ranges": [{"location": 6, "length": 1}]}
        ]}
    ]
}]"#;

#[test]
fn test_parse_array_of_roots() {
    let manifests = parse_manifest_json(ZIP_HEADER).unwrap();

    assert_eq!(manifests.len(), 1);
    assert!(manifests[0].section);
    assert!(!manifests[0].group);
    assert_eq!(manifests[0].children.len(), 3);
    assert_eq!(
        manifests[0].children[1].ranges,
        vec![RangeEntry {
            location: 4,
            length: 2
        }]
    );
}

#[test]
fn test_parse_single_object() {
    let manifests = parse_manifest_json(r#"{"label": "Only", "value": "1"}"#).unwrap();

    assert_eq!(manifests.len(), 1);
    assert_eq!(manifests[0].label.as_deref(), Some("Only"));
    assert!(manifests[0].children.is_empty());
}

#[test]
fn test_invalid_json_reported() {
    let err = parse_manifest_json("[{\"label\": 3}]").unwrap_err();
    assert!(matches!(err, ManifestError::Json(_)), "got {err}");
}

#[test]
fn test_load_builds_tree() {
    let tree = load_tree_json(ZIP_HEADER).unwrap();
    assert_eq!(tree.len(), 5);

    let header = tree.roots()[0];
    let node = tree.get(header).unwrap();
    assert!(node.is_section());
    assert!(node.is_group());
    assert_eq!(node.label(), Some("Local File Header"));

    let children = tree.children(header);
    let signature = tree.get(children[0]).unwrap();
    assert_eq!(signature.value(), Some("PK\\x03\\x04"));
    assert!(!signature.is_group());

    let flags = children[2];
    assert!(tree.get(flags).unwrap().is_group());
    assert_eq!(tree.depth(tree.children(flags)[0]), Some(2));
}

#[test]
fn test_zero_length_entries_dropped() {
    let tree =
        load_tree_json(r#"{"label": "Pad", "ranges": [{"location": 8, "length": 0}]}"#).unwrap();
    let pad = tree.roots()[0];

    assert!(tree.get(pad).unwrap().ranges().is_empty());
}

#[test]
fn test_value_on_group_rejected() {
    let err = load_tree_json(r#"{"label": "Box", "group": true, "value": "x"}"#).unwrap_err();
    assert!(
        matches!(err, ManifestError::Tree(TreeError::ValueOnGroup(_))),
        "got {err}"
    );
}

#[test]
fn test_overflowing_range_rejected() {
    let json = format!(
        r#"{{"label": "Huge", "ranges": [{{"location": {}, "length": 2}}]}}"#,
        u64::MAX
    );
    let err = load_tree_json(&json).unwrap_err();
    assert!(
        matches!(err, ManifestError::Tree(TreeError::RangeOverflow { .. })),
        "got {err}"
    );
}

#[test]
fn test_export_matches_input() {
    let manifests = parse_manifest_json(ZIP_HEADER).unwrap();
    let tree = TemplateTree::from_manifests(&manifests).unwrap();

    assert_eq!(tree.to_manifests().unwrap(), manifests);
}

#[test]
fn test_export_after_merge() {
    let mut tree = TemplateTree::new();
    let root = tree.new_group(Some("Body".into()), None).unwrap();
    tree.add_range(root, 8, 8).unwrap();
    tree.add_range(root, 0, 8).unwrap();
    tree.merge_ranges(root).unwrap();

    let exported = tree.to_manifest(root).unwrap().unwrap();
    assert_eq!(
        exported,
        NodeManifest {
            label: Some("Body".to_string()),
            value: None,
            group: true,
            section: false,
            ranges: vec![RangeEntry {
                location: 0,
                length: 16
            }],
            children: Vec::new(),
        }
    );

    let json = serde_json::to_string(&exported).unwrap();
    assert_eq!(
        json,
        r#"{"label":"Body","group":true,"ranges":[{"location":0,"length":16}]}"#
    );
}

/// Chain of nested groups `levels` deep, with a ranged leaf at the bottom.
fn group_chain(levels: usize) -> (TemplateTree, NodeId) {
    let mut tree = TemplateTree::new();
    let mut parent = None;
    for level in 0..levels {
        let id = tree.new_group(Some(format!("L{level}")), parent).unwrap();
        parent = Some(id);
    }
    let leaf = tree
        .new_leaf(Some("Bottom".into()), Some("1".into()), parent)
        .unwrap();
    tree.add_range(leaf, 0, 1).unwrap();
    (tree, leaf)
}

fn leaf_chain(depth: usize) -> NodeManifest {
    let mut manifest = NodeManifest {
        label: Some("Bottom".to_string()),
        value: None,
        group: false,
        section: false,
        ranges: vec![RangeEntry {
            location: 0,
            length: 1,
        }],
        children: Vec::new(),
    };
    for _ in 0..depth {
        manifest = NodeManifest {
            label: None,
            value: None,
            group: true,
            section: false,
            ranges: Vec::new(),
            children: vec![manifest],
        };
    }
    manifest
}

#[test]
fn test_deepest_allowed_chain_round_trips() {
    let (tree, leaf) = group_chain(MAX_MANIFEST_DEPTH);
    assert_eq!(tree.depth(leaf), Some(MAX_MANIFEST_DEPTH));

    let exported = tree.to_manifests().unwrap();
    let json = serde_json::to_string(&exported).unwrap();
    let reloaded = load_tree_json(&json).unwrap();

    assert_eq!(reloaded.len(), tree.len());
    assert_eq!(reloaded.to_manifests().unwrap(), exported);
    let bottom = reloaded.nodes().last().unwrap();
    assert_eq!(reloaded.depth(bottom), Some(MAX_MANIFEST_DEPTH));
    assert_eq!(reloaded.get(bottom).unwrap().value(), Some("1"));
}

#[test]
fn test_export_past_limit_rejected() {
    let (tree, _) = group_chain(MAX_MANIFEST_DEPTH + 1);
    let err = tree.to_manifests().unwrap_err();

    assert!(
        matches!(err, ManifestError::TooDeep { depth, max }
            if depth == MAX_MANIFEST_DEPTH + 1 && max == MAX_MANIFEST_DEPTH),
        "got {err}"
    );
}

#[test]
fn test_export_of_very_deep_tree_does_not_overflow() {
    let (tree, leaf) = group_chain(200_000);

    assert!(matches!(
        tree.to_manifests(),
        Err(ManifestError::TooDeep { .. })
    ));
    assert_eq!(tree.depth(leaf), Some(200_000));
}

#[test]
fn test_import_past_limit_rejected_without_partial_tree() {
    let manifest = leaf_chain(MAX_MANIFEST_DEPTH + 1);
    let mut tree = TemplateTree::new();
    let err = tree.load_manifest(&manifest, None).unwrap_err();

    assert!(matches!(err, ManifestError::TooDeep { .. }), "got {err}");
    assert!(tree.is_empty());

    let json = serde_json::to_string(&manifest).unwrap();
    assert!(matches!(
        load_tree_json(&json),
        Err(ManifestError::TooDeep { .. })
    ));
}
