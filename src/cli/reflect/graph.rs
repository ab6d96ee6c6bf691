//! Turn-bounded generate/reflect loop.
//!
//! The loop has two nodes. `Generate` appends an assistant draft, then the
//! conditional edge either ends the run (message count above the threshold)
//! or hands over to `Reflect`. `Reflect` appends a critique tagged as a user
//! message and always returns to `Generate`, so a run can only end on a
//! fresh draft.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info};

use super::conversation_state::{ConversationState, Message, Role};
use super::generator::TextGenerator;
use super::prompt::{GENERATION_INSTRUCTION, REFLECTION_INSTRUCTION};
use crate::error::{GenerationError, RunError};

/// Default message-count threshold checked after each generate step
pub const DEFAULT_MAX_MESSAGES: usize = 6;

const START: &str = "__start__";
const END: &str = "__end__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Generate,
    Reflect,
}

impl Node {
    pub const ALL: [Node; 2] = [Node::Generate, Node::Reflect];

    pub fn name(&self) -> &'static str {
        match self {
            Node::Generate => "generate",
            Node::Reflect => "reflect",
        }
    }

    /// Role under which this node records the collaborator's reply
    pub fn output_role(&self) -> Role {
        match self {
            Node::Generate => Role::Assistant,
            Node::Reflect => Role::User,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the controller goes after a node has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Run(Node),
    Done,
}

/// Outgoing edge of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Always(Node),
    /// Ends the run once the message count exceeds the threshold
    Threshold { otherwise: Node },
}

impl Edge {
    fn next(&self, message_count: usize, max_messages: usize) -> Step {
        match *self {
            Edge::Always(node) => Step::Run(node),
            Edge::Threshold { otherwise } => {
                if message_count > max_messages {
                    Step::Done
                } else {
                    Step::Run(otherwise)
                }
            }
        }
    }
}

/// Transition table of the loop.
pub fn edge(node: Node) -> Edge {
    match node {
        Node::Generate => Edge::Threshold {
            otherwise: Node::Reflect,
        },
        Node::Reflect => Edge::Always(Node::Generate),
    }
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub generation_instruction: String,
    pub reflection_instruction: String,
    pub max_messages: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            generation_instruction: GENERATION_INSTRUCTION.to_string(),
            reflection_instruction: REFLECTION_INSTRUCTION.to_string(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

pub struct ReflectionGraph {
    generator: Arc<dyn TextGenerator>,
    config: GraphConfig,
}

impl ReflectionGraph {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GraphConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Run the loop from a plain-text improvement request.
    pub async fn run(&self, seed_text: &str) -> Result<ConversationState, RunError> {
        if seed_text.trim().is_empty() {
            return Err(RunError::EmptySeed);
        }
        self.run_from(ConversationState::seeded(seed_text)).await
    }

    /// Run the loop over an existing, non-empty conversation.
    pub async fn run_from(&self, mut state: ConversationState) -> Result<ConversationState, RunError> {
        if state.is_empty() {
            return Err(RunError::EmptySeed);
        }

        let mut step = Step::Run(Node::Generate);
        while let Step::Run(node) = step {
            if let Err(source) = self.invoke_node(node, &mut state).await {
                return Err(RunError::Generation {
                    node,
                    partial: state,
                    source,
                });
            }
            step = edge(node).next(state.len(), self.config.max_messages);
            debug!("{} -> {:?} at {} messages", node, step, state.len());
        }

        info!("Reflection loop finished with {} messages", state.len());
        Ok(state)
    }

    /// Run one node: call the collaborator with the full history and append
    /// its reply under the node's role. On failure `state` is untouched.
    pub async fn invoke_node(
        &self,
        node: Node,
        state: &mut ConversationState,
    ) -> Result<(), GenerationError> {
        let instruction = match node {
            Node::Generate => &self.config.generation_instruction,
            Node::Reflect => &self.config.reflection_instruction,
        };

        info!("Running {} node on {} messages", node, state.len());
        let reply = self.generator.invoke(state.messages(), instruction).await?;
        state.push(Message::new(node.output_role(), reply));
        Ok(())
    }
}

/// Mermaid flowchart of the loop, built from the transition table.
pub fn draw_mermaid(max_messages: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "%%{{init: {{'flowchart': {{'curve': 'linear'}}}}}}%%");
    let _ = writeln!(out, "graph TD;");
    let _ = writeln!(out, "\t{}([<p>{}</p>]):::first", START, START);
    for node in Node::ALL {
        let _ = writeln!(out, "\t{}({})", node, node);
    }
    let _ = writeln!(out, "\t{}([<p>{}</p>]):::last", END, END);
    let _ = writeln!(out, "\t{} --> {};", START, Node::Generate);
    for node in Node::ALL {
        match edge(node) {
            Edge::Always(target) => {
                let _ = writeln!(out, "\t{} --> {};", node, target);
            }
            Edge::Threshold { otherwise } => {
                let _ = writeln!(out, "\t{} -.-> {};", node, otherwise);
                let _ = writeln!(
                    out,
                    "\t{} -. &nbsp;messages > {}&nbsp; .-> {};",
                    node, max_messages, END
                );
            }
        }
    }
    let _ = writeln!(out, "\tclassDef default fill:#f2f0ff,line-height:1.2");
    let _ = writeln!(out, "\tclassDef first fill-opacity:0");
    let _ = writeln!(out, "\tclassDef last fill:#bfb6fc");
    out
}

/// Plain-text sketch of the loop for terminals.
pub fn draw_ascii(max_messages: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {}", START);
    let _ = writeln!(out, "      |");
    let _ = writeln!(out, "      v");
    let _ = writeln!(
        out,
        "  {} ---[messages > {}]---> {}",
        Node::Generate,
        max_messages,
        END
    );
    let _ = writeln!(out, "    |     ^");
    let _ = writeln!(out, "    v     |");
    let _ = writeln!(out, "  {} ---+", Node::Reflect);
    out
}
