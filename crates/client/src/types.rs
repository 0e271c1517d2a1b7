//! List resources shown on the dashboard and the member portal.
//!
//! Shapes follow the backend's JSON; everything not needed for display is
//! optional so that additive backend changes do not break decoding.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use mizan_auth::{Module, StaffEntry};

use crate::views::ListResource;

/// Decimal amounts arrive as strings (`"150.00"`) or plain numbers.
fn amount<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected decimal amount, got {other}"
        ))),
    }
}

/// Ledger entry (dashboard finance page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub transaction_type: Option<String>,

    #[serde(deserialize_with = "amount")]
    pub amount: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Community survey (dashboard surveys page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Donation/payment receipt (member portal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,

    #[serde(default)]
    pub receipt_number: Option<String>,

    #[serde(deserialize_with = "amount")]
    pub amount: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Announcement (member portal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ListResource for Transaction {
    const ENDPOINT: &'static str = "/api/jamath/transactions/";
    const TITLE: &'static str = "Transactions";
    const EMPTY_MESSAGE: &'static str = "No transactions recorded yet.";
    const MODULE: Option<Module> = Some(Module::Finance);

    fn summary(&self) -> String {
        let date = self.date.map(|d| d.to_string()).unwrap_or_else(|| "----------".into());
        let kind = self.transaction_type.as_deref().unwrap_or("-");
        let description = self.description.as_deref().unwrap_or("");
        format!("{date}  {kind:<8} {:>12}  {description}", self.amount)
            .trim_end()
            .to_string()
    }
}

impl ListResource for Survey {
    const ENDPOINT: &'static str = "/api/jamath/surveys/";
    const TITLE: &'static str = "Surveys";
    const EMPTY_MESSAGE: &'static str = "No surveys created yet.";
    const MODULE: Option<Module> = Some(Module::Surveys);

    fn summary(&self) -> String {
        let status = if self.is_active { "active" } else { "closed" };
        format!("#{} {} [{status}]", self.id, self.title)
    }
}

impl ListResource for StaffEntry {
    const ENDPOINT: &'static str = "/api/jamath/staff-members/";
    const TITLE: &'static str = "Staff";
    const EMPTY_MESSAGE: &'static str = "No staff members yet.";
    const MODULE: Option<Module> = Some(Module::Settings);

    fn summary(&self) -> String {
        let role = self
            .role
            .map(|r| format!("role #{r}"))
            .unwrap_or_else(|| "no role".into());
        match &self.designation {
            Some(designation) => format!("user #{} ({designation}), {role}", self.user),
            None => format!("user #{}, {role}", self.user),
        }
    }
}

impl ListResource for Receipt {
    const ENDPOINT: &'static str = "/api/portal/receipts/";
    const TITLE: &'static str = "Receipts";
    const EMPTY_MESSAGE: &'static str = "You have no receipts yet.";

    fn summary(&self) -> String {
        let number = self
            .receipt_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id));
        let date = self.date.map(|d| d.to_string()).unwrap_or_default();
        format!("{number}  {date}  {}", self.amount)
    }
}

impl ListResource for Announcement {
    const ENDPOINT: &'static str = "/api/portal/announcements/";
    const TITLE: &'static str = "Announcements";
    const EMPTY_MESSAGE: &'static str = "No announcements at the moment.";

    fn summary(&self) -> String {
        match self.created_at {
            Some(at) => format!("{} ({})", self.title, at.format("%Y-%m-%d")),
            None => self.title.clone(),
        }
    }
}
