//! Nuveq page layout: paths, selectors and the positional column map of the
//! visitor tables. When the vendor changes its markup, this is the file to edit.

use crate::models::{TableRow, Visitor, VisitorAction, VisitorCategory};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

pub const USERNAME_INPUT: &str = "input[name='email']";
pub const PASSWORD_INPUT: &str = "input[name='password']";
pub const LOGIN_SUBMIT: &str = "form#loginForm button[type='submit']";
pub const DASHBOARD_MARKER: &str = "#dashboard-content";

pub const OTP_INPUT: &str = "input.otp-input";
pub const OTP_SUBMIT: &str = "button#verifyOtp";

pub const VISITOR_TABLE: &str = "table#visitorTable";
pub const VISITOR_ROWS: &str = "table#visitorTable tbody tr";
pub const NO_DATA_MARKER: &str = "table#visitorTable td.dataTables_empty";
pub const PAGE_SIZE_SELECT: &str = "select[name='visitorTable_length']";
pub const SHOW_ALL_VALUE: &str = "-1";
pub const CONFIRM_BUTTON: &str = "button.swal2-confirm";

/// Text the vendor puts in its single placeholder cell.
pub const NO_DATA_TEXT: &str = "No data available in table";

// Column order of the visitor listing tables.
pub const COL_PHOTO: usize = 0;
pub const COL_NAME: usize = 1;
pub const COL_COMPANY: usize = 2;
pub const COL_SITE: usize = 3;
pub const COL_VISIT_FROM: usize = 4;
pub const COL_VISIT_TILL: usize = 5;
pub const COL_VISITOR_TYPE: usize = 6;
pub const COL_CREDENTIAL: usize = 7;
pub const COL_INVITED_BY: usize = 8;
pub const COL_VEHICLE: usize = 9;
pub const COL_REASON: usize = 10;
pub const COL_APPROVED_BY: usize = 11;

pub fn login_url(base_url: &str) -> String {
    format!("{}{}", base_url, LOGIN_PATH)
}

pub fn dashboard_url(base_url: &str) -> String {
    format!("{}{}", base_url, DASHBOARD_PATH)
}

pub fn category_path(category: VisitorCategory) -> &'static str {
    match category {
        VisitorCategory::Today => "/visitors/today",
        VisitorCategory::Future => "/visitors/upcoming",
        VisitorCategory::Pending => "/visitors/pending-approval",
    }
}

pub fn category_url(base_url: &str, category: VisitorCategory) -> String {
    format!("{}{}", base_url, category_path(category))
}

pub fn is_login_url(url: &str) -> bool {
    url.split(['?', '#'])
        .next()
        .is_some_and(|path| path.ends_with(LOGIN_PATH))
}

pub fn otp_digit_input(index: usize) -> String {
    format!("{}:nth-of-type({})", OTP_INPUT, index + 1)
}

pub fn action_control(action: VisitorAction) -> &'static str {
    match action {
        VisitorAction::Approve => "button.btn-approve",
        VisitorAction::Reject => "button.btn-reject",
        VisitorAction::Delete => "button.btn-delete",
    }
}

/// Selector for an action control inside the `index`th (0-based) listing row.
pub fn row_action_selector(index: usize, action: VisitorAction) -> String {
    format!("{}:nth-child({}) {}", VISITOR_ROWS, index + 1, action_control(action))
}

/// Maps one listing row to a visitor, or `None` for the vendor's placeholder row.
pub fn row_to_visitor(row: &TableRow) -> Option<Visitor> {
    if row.cells.len() <= COL_NAME || row.text(0) == NO_DATA_TEXT {
        return None;
    }

    let photo_url = row
        .cells
        .get(COL_PHOTO)
        .and_then(|cell| cell.image.clone())
        .filter(|src| !src.trim().is_empty());

    Some(Visitor {
        name: row.text(COL_NAME),
        company: row.text(COL_COMPANY),
        site: row.text(COL_SITE),
        visit_from: row.text(COL_VISIT_FROM),
        visit_till: row.text(COL_VISIT_TILL),
        visitor_type: row.text(COL_VISITOR_TYPE),
        credential: row.text(COL_CREDENTIAL),
        invited_by: row.text(COL_INVITED_BY),
        vehicle_number: row.text(COL_VEHICLE),
        reason: row.text(COL_REASON),
        approved_by: row.text(COL_APPROVED_BY),
        photo_url,
    })
}
