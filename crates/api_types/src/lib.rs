use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    /// System-wide role of a user.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SystemRole {
        Admin,
        Manager,
        Partner,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub password: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub system_role: Option<SystemRole>,
    }

    /// Request body for editing a user, system-wide or inside a book.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserEdit {
        pub username: String,
        pub system_role: SystemRole,
        /// Required when editing through a book.
        pub book_role: Option<super::book::BookRole>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserEdited {
        pub user: UserView,
        pub book_role: Option<super::book::BookRole>,
        /// The caller edited their own account and should send the new
        /// credentials from now on.
        pub refresh_session: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ManagedMembershipView {
        pub book_id: Uuid,
        pub book_name: String,
        pub role: super::book::BookRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ManagedUserView {
        pub user: UserView,
        pub memberships: Vec<ManagedMembershipView>,
        pub can_manage: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ManagedUsersResponse {
        pub users: Vec<ManagedUserView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListResponse {
        pub users: Vec<UserView>,
    }
}

pub mod book {
    use super::*;

    /// Role of a user inside one book.
    ///
    /// - `partner`: read-only.
    /// - `manager`: can record entries.
    /// - `admin`: can also manage the book's users and categories.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BookRole {
        Partner,
        Manager,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookView {
        pub id: Uuid,
        pub name: String,
        pub created_by: Uuid,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookSummary {
        pub book: BookView,
        pub member_role: Option<BookRole>,
        /// Decimal string, e.g. `"-12.50"`.
        pub net_balance: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookListResponse {
        pub books: Vec<BookSummary>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookOverview {
        pub book: BookView,
        pub member_role: Option<BookRole>,
        pub is_creator: bool,
        pub can_modify_entries: bool,
        pub can_generate_report: bool,
        pub can_manage_users: bool,
    }
}

pub mod member {
    use super::*;
    use crate::{book::BookRole, user::SystemRole};

    /// Attach an existing user (`select_user`) or create one
    /// (`username` + `password` + `system_role`).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub select_user: Option<Uuid>,
        pub username: Option<String>,
        pub password: Option<String>,
        pub system_role: Option<SystemRole>,
        pub book_role: BookRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: Uuid,
        pub username: String,
        pub role: BookRole,
        pub created_by: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }
}

pub mod entry {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum EntryKind {
        In,
        Out,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryNew {
        /// Defaults to today in the server timezone.
        pub date: Option<NaiveDate>,
        pub time: Option<NaiveTime>,
        pub kind: EntryKind,
        /// Decimal string with at most two decimals, `.` or `,` separated.
        pub amount: String,
        pub category_id: Option<Uuid>,
        pub remarks: Option<String>,
        pub image: Option<String>,
        pub extra: Option<String>,
    }

    /// Partial entry update. Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryUpdate {
        pub date: Option<NaiveDate>,
        pub time: Option<NaiveTime>,
        pub kind: Option<EntryKind>,
        pub amount: Option<String>,
        pub category_id: Option<Uuid>,
        /// Remove the category. Ignored when `category_id` is set.
        #[serde(default)]
        pub clear_category: bool,
        pub remarks: Option<String>,
        pub image: Option<String>,
        pub extra: Option<String>,
    }

    /// Query string of the entry list.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryQuery {
        pub date: Option<NaiveDate>,
        /// `today`, `yesterday`, `this_month`, `last_month` or `custom`.
        pub date_range: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub category: Option<Uuid>,
        pub kind: Option<EntryKind>,
        pub search: Option<String>,
        pub page: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub date: NaiveDate,
        pub time: NaiveTime,
        pub kind: EntryKind,
        pub amount: String,
        pub category_id: Option<Uuid>,
        pub category_name: Option<String>,
        pub remarks: String,
        pub image: Option<String>,
        pub extra: Option<String>,
        pub recorded_by: Uuid,
        /// Only set in list responses.
        pub running_balance: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalsView {
        pub cash_in: String,
        pub cash_out: String,
        pub net: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
        pub totals: TotalsView,
        pub total_count: u64,
        pub page: u64,
        pub total_pages: u64,
        /// Set when the requested date range was invalid and not applied.
        pub date_filter_error: Option<String>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub book_id: Uuid,
        pub name: String,
        pub created_by: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod report {
    use super::*;

    /// Query string of the report download.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportQuery {
        /// `pdf`, `excel` or `csv`.
        pub report_type: Option<String>,
        /// `all` or `category`.
        pub report_scope: Option<String>,
        pub category: Option<Uuid>,
    }
}
