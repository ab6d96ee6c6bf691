pub mod conversation_state;
pub mod generator;
pub mod graph;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use color_print::cformat;
use conversation_state::{ConversationState, Role};
use eyre::Result;
use generator::TextGenerator;
use graph::{GraphConfig, ReflectionGraph};
use prompt::{generate_prompt, improvement_request};
use tracing::{error, info};

use crate::azure_client::AzureOpenAiClient;
use crate::error::RunError;

const SEPARATOR: &str = "==================================================";
const RULE: &str = "------------------------------";

pub struct ReflectContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    graph_config: GraphConfig,
}

impl ReflectContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        graph_config: GraphConfig,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            graph_config,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Missing settings end the run before the tweet is read
        let client = match AzureOpenAiClient::from_env() {
            Ok(client) => client,
            Err(e) => {
                writeln!(self.output, "Failed to initialize Azure OpenAI client: {}", e)?;
                return Ok(ExitCode::FAILURE);
            }
        };

        self.run_with(Arc::new(client)).await
    }

    /// Read the tweet, run the loop against `generator` and print the report.
    pub async fn run_with(&mut self, generator: Arc<dyn TextGenerator>) -> Result<ExitCode> {
        let tweet = match self.input.take() {
            Some(input) => input,
            None if self.interactive => self.read_tweet()?,
            None => String::new(),
        };
        let tweet = tweet.trim();

        if tweet.is_empty() {
            writeln!(self.output, "No tweet content provided. Exiting.")?;
            return Ok(ExitCode::FAILURE);
        }

        let graph = ReflectionGraph::new(generator, self.graph_config.clone());
        info!(
            "Improving tweet with up to {} messages",
            graph.config().max_messages
        );

        match graph.run(&improvement_request(tweet)).await {
            Ok(state) => {
                render_report(&mut self.output, &state)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(RunError::Generation {
                node,
                partial,
                source,
            }) => {
                error!("{} node failed: {}", node, source);
                writeln!(self.output, "Error: {} node failed: {}", node, source)?;
                render_history(&mut self.output, &partial)?;
                Err(RunError::Generation {
                    node,
                    partial,
                    source,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_tweet(&mut self) -> Result<String> {
        writeln!(self.output, "Please enter the tweet you want to improve:")?;
        self.output.flush()?;

        let mut rl = prompt::rl()?;
        let line = rl.readline(&generate_prompt(None))?;
        Ok(line)
    }
}

/// Final tweet followed by the numbered conversation history.
pub fn render_report(output: &mut dyn Write, state: &ConversationState) -> std::io::Result<()> {
    writeln!(output, "\n{}", SEPARATOR)?;
    writeln!(output, "{}", cformat!("<bold>FINAL TWEET:</bold>"))?;
    writeln!(output, "{}", SEPARATOR)?;

    match state.last_from(Role::Assistant) {
        Some(message) => writeln!(output, "{}", message.content())?,
        None => writeln!(output, "No final tweet found in response")?,
    }

    render_history(output, state)
}

pub fn render_history(output: &mut dyn Write, state: &ConversationState) -> std::io::Result<()> {
    writeln!(output, "\n{}", SEPARATOR)?;
    writeln!(output, "{}", cformat!("<bold>CONVERSATION HISTORY:</bold>"))?;
    writeln!(output, "{}", SEPARATOR)?;

    for (i, message) in state.messages().iter().enumerate() {
        writeln!(output, "\n[{}] {}:", i + 1, message.role().label())?;
        writeln!(output, "{}", RULE)?;
        writeln!(output, "{}", message.content())?;
        writeln!(output, "{}", RULE)?;
    }

    Ok(())
}
