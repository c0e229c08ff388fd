// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use super::*;

#[test]
fn no_thread_prompt_returns_builtin_verbatim() {
    assert_eq!(SystemPromptComposer::compose(None), BUILTIN_PROMPT);
}

#[test]
fn thread_prompt_is_composed_with_section_headers() {
    let composed = SystemPromptComposer::compose(Some("Focus on the billing module."));
    assert!(composed.starts_with("## Section: System (Built-in)"));
    assert!(composed.contains(BUILTIN_PROMPT));
    assert!(composed.contains("## Section: Thread Create (Provided By Creator)"));
    assert!(composed.ends_with("Focus on the billing module."));
}

#[test]
fn blank_thread_prompt_falls_back_to_builtin() {
    assert_eq!(SystemPromptComposer::compose(Some("   ")), BUILTIN_PROMPT);
}
