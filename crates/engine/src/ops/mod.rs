use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod books;
mod categories;
mod entries;
mod ledger;
mod reports;
mod users;

pub use books::{BookOverview, BookSummary, MemberInfo};
pub use entries::{EntryChanges, NewEntry};
pub use ledger::{BalancedEntry, EntryPage};
pub use users::{
    AddMember, AddMemberForm, EditOutcome, EditTarget, ManagedMembership, ManagedUser, UserEdit,
};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    timezone: Tz,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Current date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Current wall clock time in the configured timezone.
    fn now_time(&self) -> NaiveTime {
        let time = Utc::now().with_timezone(&self.timezone).time();
        time.with_nanosecond(0).unwrap_or(time)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    timezone: Option<Tz>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Timezone used to resolve "today" and default entry timestamps
    /// (default: UTC).
    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            timezone: self.timezone.unwrap_or(Tz::UTC),
        })
    }
}
