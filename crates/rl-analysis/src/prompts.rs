// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Prompt templates sent to the model

use std::fmt::Write;
use std::path::Path;

use rl_domain_types::{ChatMessage, ChatRole};

/// Lowercased file extension, used both as a language hint and a fence tag
fn language_hint(file_path: &str) -> String {
    Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Structured code review. The reply is expected to use the four labels
/// that [`crate::parse_analysis`] understands.
pub fn analysis_prompt(file_path: &str, content: &str) -> String {
    let lang = language_hint(file_path);
    let lang_label = if lang.is_empty() { "unknown" } else { lang.as_str() };

    format!(
        "You are a senior software engineer performing a careful code review.
You are looking at the file: {file_path}

Context:
- Language/Framework: {lang_label}
- This is production code that needs to be handled with care
- Only suggest changes that are clearly improvements
- Preserve existing functionality and coding style

Current code:
```{lang}
{content}
```

Please analyze this code and provide:
1. Brief overview of what the code does
2. Potential issues or improvements, if any, considering:
   - Code quality and maintainability
   - Performance optimizations
   - Security concerns
   - Best practices
3. Specific code changes, if needed, with:
   - Clear explanation of why each change is necessary
   - The exact location of the change
   - Before/after code snippets
   - Potential risks or side effects

If no significant improvements are needed, say so. Do not suggest changes just for the sake of it.

Format your response as:
OVERVIEW: Brief description of the code
ANALYSIS: Detailed review points
CHANGES: Specific code modifications (if any)
RISKS: Potential risks to consider
"
    )
}

/// Conversational prompt about one file. Earlier turns are replayed as a
/// transcript so the model sees the whole conversation in one message.
pub fn chat_prompt(
    file_path: Option<&str>,
    content: Option<&str>,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let mut prompt = String::from("You are a helpful AI assistant reviewing code.");
    if let Some(file_path) = file_path {
        let _ = write!(prompt, " You're looking at the file: {file_path}");
    }
    prompt.push_str("\n\n");

    if let Some(content) = content {
        let _ = write!(prompt, "Current code:\n```\n{content}\n```\n\n");
    }

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            let speaker = match turn.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
            };
            let _ = writeln!(prompt, "{speaker}: {}", turn.content);
        }
        prompt.push('\n');
    }

    let _ = write!(
        prompt,
        "User question/request: {message}

Please provide a helpful response. If the user requests code changes:
1. Clearly explain what changes you'll make and why
2. Show the exact lines to modify
3. Provide the updated code
4. Mention any potential risks or considerations

If you're suggesting code changes, put the complete updated code between a line containing CODE_START and a line containing CODE_END."
    );
    prompt
}

/// Short improvement request used for stored batch analyses
pub fn batch_prompt(file_path: &str, content: &str) -> String {
    format!(
        "Analyze and improve this code file {file_path}:\n{content}\n\nProvide specific improvements with explanations."
    )
}
