use async_trait::async_trait;

use super::conversation_state::Message;
use crate::error::GenerationError;

/// Turns a message history plus a system instruction into one reply.
///
/// Implementations own authentication, endpoint selection and model
/// settings. The loop only sees the reply text; the calling node decides
/// which role the reply is recorded under.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn invoke(
        &self,
        history: &[Message],
        system_instruction: &str,
    ) -> Result<String, GenerationError>;
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// One recorded call to [`ScriptedGenerator`]
    #[derive(Debug, Clone)]
    pub struct Call {
        pub history: Vec<Message>,
        pub system_instruction: String,
    }

    /// Fake collaborator that replays queued replies and records each call.
    /// Once the script runs out it answers `reply N`.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedGenerator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_replies<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let generator = Self::new();
            for reply in replies {
                generator.push(Ok(reply.into()));
            }
            generator
        }

        pub fn push(&self, reply: Result<String, GenerationError>) {
            self.script.lock().unwrap().push_back(reply);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn invoke(
            &self,
            history: &[Message],
            system_instruction: &str,
        ) -> Result<String, GenerationError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                history: history.to_vec(),
                system_instruction: system_instruction.to_string(),
            });
            let n = calls.len();
            drop(calls);

            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("reply {}", n)))
        }
    }
}
