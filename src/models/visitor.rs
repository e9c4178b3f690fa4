use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::models::AppError;

/// One row of a vendor visitor listing. Every field is the cell text as scraped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub name: String,
    pub company: String,
    pub site: String,
    pub visit_from: String,
    pub visit_till: String,
    pub visitor_type: String,
    pub credential: String,
    pub invited_by: String,
    pub vehicle_number: String,
    pub reason: String,
    pub approved_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitorCategory {
    Today,
    Future,
    Pending,
}

impl VisitorCategory {
    pub const ALL: [VisitorCategory; 3] = [
        VisitorCategory::Today,
        VisitorCategory::Future,
        VisitorCategory::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorCategory::Today => "today",
            VisitorCategory::Future => "future",
            VisitorCategory::Pending => "pending",
        }
    }
}

impl fmt::Display for VisitorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitorCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(VisitorCategory::Today),
            "future" | "upcoming" => Ok(VisitorCategory::Future),
            "pending" => Ok(VisitorCategory::Pending),
            other => Err(AppError::ValidationError(format!(
                "Unknown visitor category '{}'",
                other
            ))),
        }
    }
}

/// Where a listing scrape should look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingTarget {
    Category(VisitorCategory),
    Url(String),
}

impl From<VisitorCategory> for ListingTarget {
    fn from(category: VisitorCategory) -> Self {
        ListingTarget::Category(category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitorAction {
    Approve,
    Reject,
    Delete,
}

impl VisitorAction {
    pub fn label(&self) -> &'static str {
        match self {
            VisitorAction::Approve => "Approve",
            VisitorAction::Reject => "Reject",
            VisitorAction::Delete => "Delete",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            VisitorAction::Approve => "approved",
            VisitorAction::Reject => "rejected",
            VisitorAction::Delete => "deleted",
        }
    }

    /// Listing to search when the caller does not say which one the visitor is on.
    pub fn default_category(&self) -> VisitorCategory {
        match self {
            VisitorAction::Approve | VisitorAction::Reject => VisitorCategory::Pending,
            VisitorAction::Delete => VisitorCategory::Today,
        }
    }
}

/// Raw cell content from one `<tr>`, as returned by the browser provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    pub image: Option<String>,
}

impl TableRow {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: texts
                .into_iter()
                .map(|text| TableCell {
                    text: text.into(),
                    image: None,
                })
                .collect(),
        }
    }

    pub fn text(&self, index: usize) -> String {
        self.cells
            .get(index)
            .map(|cell| cell.text.trim().to_string())
            .unwrap_or_default()
    }
}
