/// Raw text fields of one chat request, after uploads have been merged in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatInput {
    pub message: Option<String>,
    pub plan: Option<String>,
    pub metrics: Option<String>,
}

impl ChatInput {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    pub fn with_metrics(mut self, metrics: impl Into<String>) -> Self {
        self.metrics = Some(metrics.into());
        self
    }
}

/// How a request is answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMode {
    /// Plan and/or metrics attached: one specialized analysis prompt, no history
    FileAnalysis {
        plan: String,
        metrics: String,
        comment: String,
    },
    /// Free-form chat with a trailing window of history
    Conversation { message: String },
}

impl RequestMode {
    /// Pick the mode for `input`. Returns `None` when there is nothing to send.
    pub fn from_input(input: &ChatInput) -> Option<Self> {
        let plan = non_blank(input.plan.as_deref());
        let metrics = non_blank(input.metrics.as_deref());
        let message = non_blank(input.message.as_deref());

        if plan.is_some() || metrics.is_some() {
            return Some(RequestMode::FileAnalysis {
                plan: plan.unwrap_or_default().to_string(),
                metrics: metrics.unwrap_or_default().to_string(),
                comment: message.unwrap_or_default().to_string(),
            });
        }

        message.map(|m| RequestMode::Conversation {
            message: m.to_string(),
        })
    }

    pub fn is_file_analysis(&self) -> bool {
        matches!(self, RequestMode::FileAnalysis { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestMode::FileAnalysis { .. } => "file_analysis",
            RequestMode::Conversation { .. } => "conversation",
        }
    }

    /// Text stored as the user's turn in the thread
    pub fn user_turn_text(&self) -> String {
        match self {
            RequestMode::Conversation { message } => message.clone(),
            RequestMode::FileAnalysis { comment, .. } if !comment.is_empty() => comment.clone(),
            RequestMode::FileAnalysis { plan, metrics, .. } => {
                let attached: Vec<&str> = [("plan", plan), ("metrics", metrics)]
                    .into_iter()
                    .filter(|(_, text)| !text.is_empty())
                    .map(|(name, _)| name)
                    .collect();
                format!("Requested a cost analysis of the attached {}.", attached.join(" and "))
            }
        }
    }

    /// Every non-empty text field, for relevance checks
    pub fn fields(&self) -> Vec<&str> {
        match self {
            RequestMode::Conversation { message } => vec![message.as_str()],
            RequestMode::FileAnalysis {
                plan,
                metrics,
                comment,
            } => [plan, metrics, comment]
                .into_iter()
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
