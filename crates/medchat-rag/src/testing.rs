//! Generator doubles for exercising the pipelines without a model server

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use medchat_core::{Error, GenerationConfig, Generator, Result};

/// Returns a fixed answer and remembers every prompt it was given
pub struct RecordingGenerator {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.answer.clone())
    }

    fn model_id(&self) -> &str {
        "recording"
    }
}

/// How a [`ScriptedGenerator`] misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Fail with `Error::Generation`
    Crash,
    /// Sleep past any reasonable timeout
    Hang,
}

/// Fails the first `failures` calls, then answers
pub struct ScriptedGenerator {
    failure: Failure,
    remaining: Mutex<u32>,
    answer: String,
}

impl ScriptedGenerator {
    pub fn failing(failure: Failure) -> Self {
        Self::failing_times(failure, u32::MAX, "")
    }

    pub fn failing_times(failure: Failure, failures: u32, answer: impl Into<String>) -> Self {
        Self {
            failure,
            remaining: Mutex::new(failures),
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        let should_fail = match self.remaining.lock() {
            Ok(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if !should_fail {
            return Ok(self.answer.clone());
        }

        match self.failure {
            Failure::Crash => Err(Error::Generation("model process exited".to_string())),
            Failure::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::Generation("woke up after an hour".to_string()))
            }
        }
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}
