mod assembler;
mod mode;
mod relevance;
mod strategy;
mod templates;
mod topic;

pub use assembler::{ConversationAssembler, DEFAULT_HISTORY_WINDOW};
pub use mode::{ChatInput, RequestMode};
pub use relevance::RelevanceChecker;
pub use strategy::{ContextStrategy, ContextWindow};
pub use templates::{
    render, COST_ANALYSIS_PROMPT, OFF_TOPIC_REPLY, RELEVANCE_PROMPT, SUMMARY_PROMPT,
    SYSTEM_PROMPT_TEMPLATE,
};
pub use topic::OffTopicFilter;
