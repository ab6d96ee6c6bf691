use rustyline::{Config, Editor, Result};

pub const GENERATION_INSTRUCTION: &str = "You are a twitter techie influencer assistant tasked with writing excellent twitter posts. \
Generate the best twitter post possible for the user's request. \
If the user provides critique, respond with a revised version of your previous attempts.";

pub const REFLECTION_INSTRUCTION: &str = "You are a viral twitter influencer grading a tweet. \
Generate critique and recommendations for the user's tweet. \
Always provide detailed recommendations, including requests for length, virality, style, etc.";

/// Wrap the raw tweet into the seed request sent to the generator.
pub fn improvement_request(tweet: &str) -> String {
    format!("Make this tweet better: \"{}\"", tweet)
}

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("> ").to_string()
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .build();
    Editor::with_config(config)
}
