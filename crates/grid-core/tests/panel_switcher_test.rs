//! Integration test: panel switcher.
//!
//! ## Scenarios
//! 1. Any click sequence leaves exactly one visible panel and at most one highlighted tool.
//! 2. Home shows the home panel and clears the highlight.
//! 3. Unknown identifiers are rejected without changing the selection.

use grid_core::{GridError, Panel, PanelSwitcher, Selection, Tool};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn visible(switcher: &PanelSwitcher) -> Vec<Panel> {
    Panel::all().filter(|p| switcher.is_visible(*p)).collect()
}

fn highlighted(switcher: &PanelSwitcher) -> Vec<Tool> {
    Tool::ALL.into_iter().filter(|t| switcher.is_highlighted(*t)).collect()
}

#[test]
fn starts_on_home_with_nothing_highlighted() {
    let switcher = PanelSwitcher::default();
    assert_eq!(visible(&switcher), vec![Panel::Home]);
    assert!(highlighted(&switcher).is_empty());
}

#[test]
fn random_click_sequences_keep_one_visible_panel() {
    let ids = ["home", "port-scanner", "pass-gen", "hash-cracker", "ai-assistant"];
    let mut rng = StdRng::seed_from_u64(1337);
    let mut switcher = PanelSwitcher::default();

    for _ in 0..500 {
        let id = ids[rng.gen_range(0..ids.len())];
        let panel = switcher.select_id(id).unwrap();

        assert_eq!(visible(&switcher), vec![panel]);
        let lit = highlighted(&switcher);
        match panel {
            Panel::Home => assert!(lit.is_empty()),
            Panel::Tool(tool) => {
                assert_eq!(lit, vec![tool]);
                assert_eq!(panel.id(), format!("{}-panel", id));
            }
        }
    }
}

#[test]
fn home_clears_highlight() {
    let mut switcher = PanelSwitcher::default();
    switcher.select(Selection::Tool(Tool::HashCracker));
    assert_eq!(switcher.highlighted(), Some(Tool::HashCracker));

    switcher.select(Selection::Home);
    assert_eq!(switcher.active(), Panel::Home);
    assert_eq!(switcher.active().id(), "dashboard-home");
    assert_eq!(switcher.highlighted(), None);
}

#[test]
fn reselecting_the_same_tool_is_stable() {
    let mut switcher = PanelSwitcher::default();
    switcher.select(Selection::Tool(Tool::PassGen));
    let before = switcher.clone();
    switcher.select(Selection::Tool(Tool::PassGen));
    assert_eq!(switcher, before);
}

#[test]
fn unknown_identifier_leaves_selection_unchanged() {
    let mut switcher = PanelSwitcher::default();
    switcher.select(Selection::Tool(Tool::AiAssistant));
    let before = switcher.clone();

    for bogus in ["", "Home", "port_scanner", "dashboard-home", "ai-assistant-panel"] {
        let result = switcher.select_id(bogus);
        assert!(matches!(result, Err(GridError::UnknownTool(ref id)) if id == bogus));
        assert_eq!(switcher, before);
    }
}
