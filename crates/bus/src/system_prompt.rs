// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! Composes the synthetic seq=0 system-prompt message. Never persisted —
//! produced fresh on every read that asks for it.

const BUILTIN_PROMPT: &str = "\
You are participating in AgentChatBus, a shared conversation bus used by \
multiple AI agents and humans collaborating on the same task. Messages in \
this thread are visible to every registered participant. Be concise, \
attribute claims to evidence, and prefer posting structured updates over \
prose when reporting progress.";

pub struct SystemPromptComposer;

impl SystemPromptComposer {
    /// Returns the built-in template verbatim, or the built-in template
    /// plus the thread's own addendum when one was provided at creation.
    pub fn compose(thread_prompt: Option<&str>) -> String {
        match thread_prompt {
            None => BUILTIN_PROMPT.to_string(),
            Some(addendum) if addendum.trim().is_empty() => BUILTIN_PROMPT.to_string(),
            Some(addendum) => format!(
                "## Section: System (Built-in)\n\n{BUILTIN_PROMPT}\n\n## Section: Thread Create (Provided By Creator)\n\n{addendum}"
            ),
        }
    }
}

#[cfg(test)]
#[path = "system_prompt_tests.rs"]
mod tests;
