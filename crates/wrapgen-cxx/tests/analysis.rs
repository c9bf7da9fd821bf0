// Copyright (c) the wrapgen contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! End-to-end analysis over the front-end's JSON interchange format.

use wrapgen_core::{NullPolicy, TablePolicy};
use wrapgen_cxx::{Analyzer, DeclTree};

/// namespace gui {
///   struct Widget { virtual void show(); void resize(int); };
///   struct Button : Widget { void show(); };
/// }
const GUI_MODULE: &str = r#"{
  "nodes": [
    {"kind": "module", "name": "gui_demo", "members": [1]},
    {"kind": "namespace", "name": "gui", "members": [2, 5]},
    {"kind": "struct", "struct_kind": "struct",
     "name": {"parts": [{"name": "Widget"}]}, "body": [3, 4]},
    {"kind": "declaration", "virtual": true,
     "ty": {"concrete": {"kind": "pod", "name": "void"},
            "inner": {"kind": "function",
                      "inner": {"kind": "named", "id": {"parts": [{"name": "show"}]}},
                      "params": []}}},
    {"kind": "declaration",
     "ty": {"concrete": {"kind": "pod", "name": "void"},
            "inner": {"kind": "function",
                      "inner": {"kind": "named", "id": {"parts": [{"name": "resize"}]}},
                      "params": [{"concrete": {"kind": "pod", "name": "int"},
                                  "inner": {"kind": "named",
                                            "id": {"parts": [{"name": "w"}]}}}]}}},
    {"kind": "struct", "struct_kind": "struct",
     "name": {"parts": [{"name": "Button"}]},
     "bases": [{"target": {"parts": [{"name": "Widget"}]}}],
     "body": [6]},
    {"kind": "declaration",
     "ty": {"concrete": {"kind": "pod", "name": "void"},
            "inner": {"kind": "function",
                      "inner": {"kind": "named", "id": {"parts": [{"name": "show"}]}},
                      "params": []}}}
  ]
}"#;

#[test]
fn analyzes_parsed_module() {
    let tree: DeclTree = serde_json::from_str(GUI_MODULE).unwrap();
    let policy = NullPolicy;
    let out = Analyzer::new(tree, &policy).run().unwrap();

    assert_eq!(out.module, "gui_demo");
    assert!(out.skipped.is_empty());
    let names: Vec<&str> = out.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["gui::Widget", "gui::Button"]);

    // Widget declares a virtual method, so both classes get adaptors.
    assert!(out.classes.iter().all(|c| c.needs_adaptor));

    let button = &out.classes[1];
    let show = button.methods.iter().find(|m| m.name == "show").unwrap();
    assert!(show.virtual_);
    assert!(show.overridden);
    assert_eq!(show.declared_in, "gui::Button");
    let resize = button.methods.iter().find(|m| m.name == "resize").unwrap();
    assert_eq!(resize.declared_in, "gui::Widget");
    assert_eq!(resize.signature, "(int)");

    // Inherited methods keep the hash key of their declaring class.
    let widget = &out.classes[0];
    let original = widget.methods.iter().find(|m| m.name == "resize").unwrap();
    assert_eq!(resize.hash_key, original.hash_key);
}

#[test]
fn hash_keys_survive_unrelated_edits() {
    let tree: DeclTree = serde_json::from_str(GUI_MODULE).unwrap();
    let policy = NullPolicy;
    let first = Analyzer::new(tree, &policy).run().unwrap();

    // Renaming a parameter is a no-op for signatures and hash keys.
    let edited = GUI_MODULE.replace("\"name\": \"w\"", "\"name\": \"width\"");
    let tree: DeclTree = serde_json::from_str(&edited).unwrap();
    let second = Analyzer::new(tree, &policy).run().unwrap();

    let keys = |out: &wrapgen_cxx::ModuleAnalysis| -> Vec<(String, String)> {
        out.classes
            .iter()
            .flat_map(|c| c.methods.iter().map(|m| (m.name.clone(), m.hash_key.clone())))
            .collect()
    };
    assert_eq!(keys(&first), keys(&second));
}

#[test]
fn policy_table_filters_and_renames() {
    let tree: DeclTree = serde_json::from_str(GUI_MODULE).unwrap();
    let policy = TablePolicy::from_json(
        r#"{
            "classes": {
                "gui::Widget": {
                    "drop": ["show()"],
                    "rename": {"resize(int)": ["set_width"]}
                },
                "gui::Button": {"final": true}
            }
        }"#,
    )
    .unwrap();
    let out = Analyzer::new(tree, &policy).run().unwrap();

    let widget = &out.classes[0];
    let names: Vec<&str> = widget.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["resize"]);
    assert_eq!(widget.methods[0].aliases, vec!["set_width"]);

    let button = &out.classes[1];
    assert!(!button.needs_adaptor);
}

#[test]
fn out_of_line_definitions_are_relocated_before_analysis() {
    // struct A { struct B; };  struct A::B { void run(); };
    let json = r#"{
      "nodes": [
        {"kind": "module", "name": "demo", "members": [1, 3]},
        {"kind": "struct", "struct_kind": "struct",
         "name": {"parts": [{"name": "A"}]}, "body": [2]},
        {"kind": "struct", "struct_kind": "struct", "forward": true,
         "name": {"parts": [{"name": "B"}]}},
        {"kind": "struct", "struct_kind": "struct",
         "name": {"parts": [{"name": "A"}, {"name": "B"}]}, "body": [4]},
        {"kind": "declaration",
         "ty": {"concrete": {"kind": "pod", "name": "void"},
                "inner": {"kind": "function",
                          "inner": {"kind": "named", "id": {"parts": [{"name": "run"}]}},
                          "params": []}}}
      ]
    }"#;
    let tree: DeclTree = serde_json::from_str(json).unwrap();
    let policy = NullPolicy;
    let out = Analyzer::new(tree, &policy).run().unwrap();

    // The forward declaration is skipped; the out-of-line definition is
    // analyzed under its injected qualified name.
    let names: Vec<&str> = out.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "A::B"]);
    let b = &out.classes[1];
    assert_eq!(b.methods.len(), 1);
    assert_eq!(b.methods[0].name, "run");
}
