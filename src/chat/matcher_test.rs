use super::*;

fn table() -> ResponseTable {
    ResponseTable::builtin().expect("builtin table compiles")
}

#[test]
fn milestone_talk_unlocks_project_setup() {
    let table = table();
    let intent = match_intent(&table, "Let's add milestones for texture and animation");
    assert!(intent.reply.starts_with("Here's your project setup"));
    assert_eq!(intent.signal, Some(Panel::ProjectSetup));
}

#[test]
fn team_talk_unlocks_team_setup() {
    let table = table();
    let intent = match_intent(&table, "team members please");
    assert!(intent.reply.starts_with("I've added your team members"));
    assert_eq!(intent.signal, Some(Panel::TeamSetup));
}

#[test]
fn matching_is_case_insensitive_and_unanchored() {
    let table = table();
    let intent = match_intent(&table, "We should COMPARE a few packages");
    assert_eq!(intent.signal, Some(Panel::ToolsComparison));
}

#[test]
fn first_match_wins_over_later_overlapping_rules() {
    let table = table();
    // "game" appears in both the first and second rule.
    let intent = match_intent(&table, "a game");
    assert_eq!(intent.rule, Some(0));
    assert_eq!(intent.reply, "That sounds cool! Is this for a video game, VR, or something else?");
}

#[test]
fn no_match_falls_back_without_signal() {
    let table = table();
    let intent = match_intent(&table, "hello there");
    assert_eq!(intent.reply, table.fallback);
    assert_eq!(intent.signal, None);
    assert_eq!(intent.rule, None);
}

#[test]
fn input_is_trimmed_before_matching() {
    let table = ResponseTable::from_yaml(
        r#"
greeting: hi
fallback: fallback
rules:
  - triggers: ["^yes$"]
    reply: confirmed
"#,
    )
    .expect("table");
    assert_eq!(match_intent(&table, "  yes \n").reply, "confirmed");
}
