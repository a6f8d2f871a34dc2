//! Offline backend with canned persona responses
//!
//! Used when no model server is reachable so the client stays usable for
//! demos and UI work. Responses are streamed word by word.

use async_stream::stream;
use async_trait::async_trait;
use parley_core::{BackendResult, ChatBackend, Message, Role, TokenEvent, TokenStream};
use std::time::Duration;

const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(5);

/// Models the mock claims to have installed
const MOCK_MODELS: &[&str] = &["llama3", "dolphin-mixtral", "mistral"];

#[derive(Debug, Clone)]
pub struct MockBackend {
    word_delay: Duration,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            word_delay: DEFAULT_WORD_DELAY,
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause between streamed words
    pub fn with_word_delay(mut self, delay: Duration) -> Self {
        self.word_delay = delay;
        self
    }

    /// Full response the mock gives for a model and prompt
    pub fn response_for(model: &str, prompt: &str) -> String {
        if model == "llama3" {
            format!(
                "Hey! I'm **{model}**, your go-to for online culture. \
                 You asked about: '{prompt}'. That's a big one. \
                 The current internet aesthetic is shifting hard toward maximalist production, less 'lo-fi'. \
                 It's all about main character energy in short-form content. What else do you need to know? \
                 Here is a small Python code block for no reason:\n\
                 ```python\n\
                 print('Salty')\n\
                 for i in range(20):\n    \
                 # Long line test to check scrolling:\n    \
                 # This is a very very very very very very very very very very very long line of code\n    \
                 print(f'Iteration: {{i}}')\n\
                 ```\n\
                 Bet. That code is *straight fire*."
            )
        } else {
            format!(
                "Greetings. I am **{model}**, an analytical assistant. \
                 Your query was: '{prompt}'. I can provide a precise and detailed explanation. \
                 For technical topics or general knowledge, I prioritize accuracy and formal language. \
                 Please specify if you require a technical breakdown or a general overview. \
                 Here is some formal text that mentions code:\n\
                 The **Abstract Syntax Tree (AST)** generation is critical for compilers. \
                 Consider the following pseudocode snippet, which demonstrates the recursive descent approach:\n\
                 ```pascal\n\
                 FUNCTION ParseExpression(tokens):\n  \
                 IF token is ID THEN\n    \
                 RETURN NewNode('Variable', token)\n  \
                 ELSE IF token is NUM THEN\n    \
                 RETURN NewNode('Literal', token)\n  \
                 END IF\n\
                 END FUNCTION\n\
                 ```\n\
                 This ensures proper operator precedence."
            )
        }
    }
}

/// Split on single spaces, keeping each separator with its word
fn words(text: &str) -> Vec<String> {
    text.split(' ').map(|word| format!("{} ", word)).collect()
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    fn stream_chat(&self, model: &str, messages: &[Message]) -> TokenStream {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("No prompt found.");
        let response = Self::response_for(model, prompt);
        let delay = self.word_delay;

        Box::pin(stream! {
            for word in words(&response) {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(TokenEvent::Content(word));
            }
            yield Ok(TokenEvent::Content("\n".to_string()));
            yield Ok(TokenEvent::End);
        })
    }

    async fn list_models(&self) -> BackendResult<Vec<String>> {
        Ok(MOCK_MODELS.iter().map(|m| m.to_string()).collect())
    }
}
