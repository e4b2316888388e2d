use super::*;

#[test]
fn builtin_table_keeps_rule_order_and_greeting() {
    let table = ResponseTable::builtin().expect("builtin");
    assert_eq!(table.greeting, "What can I help you build today? 3D asset, scene, or something else?");
    assert_eq!(table.fallback, "I'll help with that. What else would you like to configure?");
    assert_eq!(table.rules.len(), 11);
    assert_eq!(table.rules[4].signal, Some(Panel::ProjectSetup));
    assert_eq!(table.rules[5].signal, Some(Panel::TeamSetup));
    assert_eq!(table.rules[6].signal, Some(Panel::ToolsComparison));
    assert!(table.rules[..4].iter().all(|r| r.signal.is_none()));
}

#[test]
fn builtin_table_reaches_every_panel() {
    let table = ResponseTable::builtin().expect("builtin");
    for panel in Panel::ALL {
        assert!(table.rules.iter().any(|r| r.signal == Some(panel)), "{panel} has no rule");
    }
}

#[test]
fn yaml_table_parses_signals_and_patterns() {
    let table = ResponseTable::from_yaml(
        r#"
greeting: "Hello"
fallback: "Tell me more"
rules:
  - triggers: ["rig", "skeleton"]
    reply: "Rigging noted."
    signal: teamSetup
  - triggers: ["render"]
    reply: "Rendering noted."
"#,
    )
    .expect("table");
    assert_eq!(table.greeting, "Hello");
    assert_eq!(table.rules.len(), 2);
    assert_eq!(table.rules[0].signal, Some(Panel::TeamSetup));
    assert!(table.rules[0].matches("the SKELETON needs work"));
    assert_eq!(table.rules[1].signal, None);
}

#[test]
fn invalid_regex_is_rejected_with_rule_index() {
    let err = ResponseTable::from_yaml(
        r#"
greeting: hi
fallback: fb
rules:
  - triggers: ["ok"]
    reply: fine
  - triggers: ["(unclosed"]
    reply: broken
"#,
    )
    .expect_err("bad regex");
    assert!(matches!(err, ResponseTableError::Pattern { rule: 1, .. }));
}

#[test]
fn unknown_signal_is_rejected() {
    let err = ResponseTable::from_yaml(
        r#"
greeting: hi
fallback: fb
rules:
  - triggers: ["x"]
    reply: y
    signal: spaceship
"#,
    )
    .expect_err("unknown signal");
    assert!(matches!(err, ResponseTableError::UnknownSignal { rule: 0, ref signal } if signal == "spaceship"));
}

#[test]
fn rule_without_triggers_is_rejected() {
    let err = ResponseTable::from_yaml("greeting: hi\nfallback: fb\nrules:\n  - triggers: []\n    reply: y\n")
        .expect_err("no triggers");
    assert!(matches!(err, ResponseTableError::NoTriggers { rule: 0 }));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ResponseTable::load(Path::new("/definitely/not/here.yaml")).expect_err("missing");
    assert!(matches!(err, ResponseTableError::Io { .. }));
}
