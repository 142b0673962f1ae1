use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Snapshot of a file-driven cost analysis request and its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    pub user_id: String,
    pub thread_id: Option<String>,
    pub plan: String,
    pub metrics: String,
    pub comment: String,
    pub result: String,
    /// JSON block extracted from `result`, when the model produced one
    pub structured: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAnalysis {
    pub user_id: String,
    pub thread_id: Option<String>,
    pub plan: String,
    pub metrics: String,
    pub comment: String,
    pub result: String,
    pub structured: Option<serde_json::Value>,
}

impl NewAnalysis {
    pub(crate) fn into_analysis(self) -> Analysis {
        Analysis {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            thread_id: self.thread_id,
            plan: self.plan,
            metrics: self.metrics,
            comment: self.comment,
            result: self.result,
            structured: self.structured,
            created_at: Utc::now(),
        }
    }
}
