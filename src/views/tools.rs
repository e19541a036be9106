//! Tools panel: the backend's registered tools, fetched once per mount.

use serde::Serialize;

use super::{Applied, ViewController};
use crate::api::types::{ToolDescriptor, ToolParameter};
use crate::runtime::{
    Completion, MountId, Payload, Request, RequestKind, Runtime, Sequencer, StalePolicy, Ticket,
};

/// Icon shown next to a tool, chosen from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolIcon {
    Code,
    File,
    Calculator,
    Globe,
    Wrench,
}

impl ToolIcon {
    /// Ordered substring rules; the first match wins.
    pub fn for_name(name: &str) -> Self {
        const RULES: [(&str, ToolIcon); 4] = [
            ("code", ToolIcon::Code),
            ("file", ToolIcon::File),
            ("calculate", ToolIcon::Calculator),
            ("search", ToolIcon::Globe),
        ];
        RULES
            .iter()
            .find(|(needle, _)| name.contains(needle))
            .map(|(_, icon)| *icon)
            .unwrap_or(ToolIcon::Wrench)
    }

    /// Single-glyph terminal rendering.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Code => "</>",
            Self::File => "[f]",
            Self::Calculator => "[=]",
            Self::Globe => "(@)",
            Self::Wrench => "[*]",
        }
    }
}

pub struct ToolsController {
    mount: MountId,
    /// `None` until the first successful fetch.
    tools: Option<Vec<ToolDescriptor>>,
    seq: Sequencer,
}

impl ToolsController {
    pub fn mount(mount: MountId, rt: &mut dyn Runtime) -> Self {
        let mut seq = Sequencer::new(StalePolicy::DropOutOfOrder);
        rt.issue(Ticket {
            mount,
            seq: seq.next(),
            request: Request::Tools,
        });
        Self {
            mount,
            tools: None,
            seq,
        }
    }

    pub fn tools(&self) -> Option<&[ToolDescriptor]> {
        self.tools.as_deref()
    }

    pub fn view_model(&self) -> ToolsPanel {
        match &self.tools {
            None => ToolsPanel::Loading,
            Some(tools) => ToolsPanel::Ready {
                tools: tools
                    .iter()
                    .map(|t| ToolCard {
                        name: t.name.clone(),
                        icon: ToolIcon::for_name(&t.name),
                        description: t.description.clone(),
                        parameters: t.parameters(),
                    })
                    .collect(),
            },
        }
    }
}

impl ViewController for ToolsController {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        match (completion.kind, completion.result) {
            (RequestKind::Tools, Ok(Payload::Tools(tools))) => {
                if !self.seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.tools = Some(tools);
                Applied::Changed
            }
            (RequestKind::Tools, _) => Applied::Unchanged,
            _ => Applied::Stale,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ToolsPanel {
    Loading,
    Ready { tools: Vec<ToolCard> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCard {
    pub name: String,
    pub icon: ToolIcon,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}
