// Prompt templates. Placeholders are `<name>` tags replaced at render time.

/// System turn for general conversation; `<history>` receives the trailing window
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a cloud cost optimization assistant. You help engineers understand their cloud bills, find waste and choose cheaper configurations on AWS, Azure and GCP.

Stay on the topic of cloud infrastructure and its cost. If the user drifts to unrelated subjects, steer them back politely.

Answer concisely. Use concrete numbers when the user provides them and state your assumptions when they do not.

Recent conversation:
<history>"#;

/// Rendered in place of `<history>` when the thread has no prior turns
pub const NO_HISTORY: &str = "(no previous messages)";

/// Single user turn for file-analysis requests
pub const COST_ANALYSIS_PROMPT: &str = r#"You are a cloud cost analyst. Review the pricing plan and usage metrics below.

Pricing plan:
<plan>

Usage metrics:
<metrics>

Additional comments from the user:
<comment>

Instructions:
1. Identify inefficiencies such as idle, oversized or unused resources.
2. Propose concrete optimizations with an estimated monthly saving for each.
3. Propose platform-specific alternatives (reserved capacity, savings plans, spot, storage tiers) where they apply.

Respond with a short prose summary followed by a JSON code block of the form:
```json
[{"resource": "...", "issue": "...", "recommendation": "...", "estimatedMonthlySavings": 0}]
```"#;

/// Rendered when a file-analysis field was left empty
pub const NOT_PROVIDED: &str = "(not provided)";

/// Summarization request for a whole thread; `<conversation>` receives the transcript
pub const SUMMARY_PROMPT: &str = r#"Summarize the following conversation between a user and a cloud cost assistant.

Keep the resources discussed, the cost figures mentioned and every recommendation that was made. Use at most five bullet points.

Conversation:
<conversation>"#;

/// Yes/no classification of one piece of user-provided text
pub const RELEVANCE_PROMPT: &str = r#"Is the following text related to cloud computing, cloud infrastructure or cloud costs? Answer with a single word: yes or no.

Text:
<text>"#;

/// Fixed reply for messages caught by the off-topic filter
pub const OFF_TOPIC_REPLY: &str = "I'm here to help with cloud costs and infrastructure. \
Ask me about your bill, your usage metrics or how to save on AWS, Azure or GCP.";

/// Replace every `<key>` tag in `template`
///
/// Single pass over the template: inserted values are never scanned again, so
/// a value containing `<key>` text is kept verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let tag = values.iter().find_map(|(key, value)| {
            let after = tail.strip_prefix('<')?.strip_prefix(*key)?.strip_prefix('>')?;
            Some((*value, after))
        });
        match tag {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
