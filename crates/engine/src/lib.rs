//! Shared cashbook engine.
//!
//! Books hold dated cash-in/cash-out entries, optionally categorised. Users
//! reach a book through a system role, by having created it, or through a
//! per-book membership; [`access`] decides what each of them may do and
//! [`Engine`] enforces it around every store operation.

pub use access::{Actor, BookContext};
pub use books::Book;
pub use cash_entries::{CashEntry, EntryKind};
pub use categories::Category;
pub use error::EngineError;
pub use filter::{DateRange, EntryFilter};
pub use ledger::{PAGE_SIZE, Totals};
pub use money::MoneyCents;
pub use ops::{
    AddMember, AddMemberForm, BalancedEntry, BookOverview, BookSummary, EditOutcome, EditTarget,
    Engine, EngineBuilder, EntryChanges, EntryPage, ManagedMembership, ManagedUser, MemberInfo,
    NewEntry, UserEdit,
};
pub use report::{
    RenderedReport, Report, ReportFormat, ReportRenderer, ReportRequest, ReportRow, ReportScope,
};
pub use roles::{BookRole, SystemRole};
pub use users::User;

pub mod access;
pub mod book_members;
pub mod books;
pub mod cash_entries;
pub mod categories;
mod error;
mod filter;
pub mod ledger;
mod money;
mod ops;
pub mod report;
mod roles;
pub mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
