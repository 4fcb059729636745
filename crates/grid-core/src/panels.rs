//! Tool panel switcher: exactly one visible panel, at most one highlighted tool control.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GridError;

/// Tool controls listed in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    PortScanner,
    PassGen,
    HashCracker,
    AiAssistant,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::PortScanner, Tool::PassGen, Tool::HashCracker, Tool::AiAssistant];

    pub fn id(self) -> &'static str {
        match self {
            Tool::PortScanner => "port-scanner",
            Tool::PassGen => "pass-gen",
            Tool::HashCracker => "hash-cracker",
            Tool::AiAssistant => "ai-assistant",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::PortScanner => "Port Scanner",
            Tool::PassGen => "Password Generator",
            Tool::HashCracker => "Hash Cracker",
            Tool::AiAssistant => "GRID AI Assistant",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What a click carries: a tool, or the special home control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    Home,
    Tool(Tool),
}

impl FromStr for Selection {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "home" {
            return Ok(Selection::Home);
        }
        Tool::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .map(Selection::Tool)
            .ok_or_else(|| GridError::UnknownTool(s.to_string()))
    }
}

/// A mutually-exclusive view region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Panel {
    Home,
    Tool(Tool),
}

impl Panel {
    /// Element id: `dashboard-home` or `<tool>-panel`.
    pub fn id(self) -> String {
        match self {
            Panel::Home => "dashboard-home".to_string(),
            Panel::Tool(tool) => format!("{}-panel", tool.id()),
        }
    }

    pub fn all() -> impl Iterator<Item = Panel> {
        std::iter::once(Panel::Home).chain(Tool::ALL.into_iter().map(Panel::Tool))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSwitcher {
    active: Panel,
    highlighted: Option<Tool>,
}

impl Default for PanelSwitcher {
    fn default() -> Self {
        Self { active: Panel::Home, highlighted: None }
    }
}

impl PanelSwitcher {
    pub fn select(&mut self, selection: Selection) {
        match selection {
            Selection::Home => {
                self.active = Panel::Home;
                self.highlighted = None;
            }
            Selection::Tool(tool) => {
                self.active = Panel::Tool(tool);
                self.highlighted = Some(tool);
            }
        }
        tracing::debug!(panel = %self.active.id(), "panel selected");
    }

    /// Select by element identifier. Unknown ids leave the selection untouched.
    pub fn select_id(&mut self, id: &str) -> Result<Panel, GridError> {
        let selection = id.parse::<Selection>()?;
        self.select(selection);
        Ok(self.active)
    }

    pub fn active(&self) -> Panel {
        self.active
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        self.active == panel
    }

    pub fn is_highlighted(&self, tool: Tool) -> bool {
        self.highlighted == Some(tool)
    }

    pub fn highlighted(&self) -> Option<Tool> {
        self.highlighted
    }
}
