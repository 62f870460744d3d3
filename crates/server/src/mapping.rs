//! Conversions between engine values and API bodies.

use api_types::{
    book::{BookRole, BookView},
    category::CategoryView,
    entry::{EntryKind, EntryView, TotalsView},
    member::MemberView,
    user::{SystemRole, UserView},
};

pub fn system_role(role: engine::SystemRole) -> SystemRole {
    match role {
        engine::SystemRole::Admin => SystemRole::Admin,
        engine::SystemRole::Manager => SystemRole::Manager,
        engine::SystemRole::Partner => SystemRole::Partner,
    }
}

pub fn engine_system_role(role: SystemRole) -> engine::SystemRole {
    match role {
        SystemRole::Admin => engine::SystemRole::Admin,
        SystemRole::Manager => engine::SystemRole::Manager,
        SystemRole::Partner => engine::SystemRole::Partner,
    }
}

pub fn book_role(role: engine::BookRole) -> BookRole {
    match role {
        engine::BookRole::Partner => BookRole::Partner,
        engine::BookRole::Manager => BookRole::Manager,
        engine::BookRole::Admin => BookRole::Admin,
    }
}

pub fn engine_book_role(role: BookRole) -> engine::BookRole {
    match role {
        BookRole::Partner => engine::BookRole::Partner,
        BookRole::Manager => engine::BookRole::Manager,
        BookRole::Admin => engine::BookRole::Admin,
    }
}

pub fn engine_kind(kind: EntryKind) -> engine::EntryKind {
    match kind {
        EntryKind::In => engine::EntryKind::In,
        EntryKind::Out => engine::EntryKind::Out,
    }
}

fn kind(kind: engine::EntryKind) -> EntryKind {
    match kind {
        engine::EntryKind::In => EntryKind::In,
        engine::EntryKind::Out => EntryKind::Out,
    }
}

pub fn map_user(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        system_role: user.system_role.map(system_role),
    }
}

pub fn map_actor(actor: &engine::Actor) -> UserView {
    UserView {
        id: actor.id,
        username: actor.username.clone(),
        system_role: actor.system_role.map(system_role),
    }
}

pub fn map_book(book: engine::Book) -> BookView {
    BookView {
        id: book.id,
        name: book.name,
        created_by: book.created_by,
        created_at: book.created_at,
    }
}

pub fn map_member(member: engine::MemberInfo) -> MemberView {
    MemberView {
        user_id: member.user_id,
        username: member.username,
        role: book_role(member.role),
        created_by: member.created_by,
    }
}

pub fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        book_id: category.book_id,
        name: category.name,
        created_by: category.created_by,
    }
}

pub fn map_totals(totals: engine::Totals) -> TotalsView {
    TotalsView {
        cash_in: totals.cash_in.to_string(),
        cash_out: totals.cash_out.to_string(),
        net: totals.net.to_string(),
    }
}

pub fn map_entry(
    entry: engine::CashEntry,
    category_name: Option<String>,
    running_balance: Option<engine::MoneyCents>,
) -> EntryView {
    EntryView {
        id: entry.id,
        date: entry.date,
        time: entry.time,
        kind: kind(entry.kind),
        amount: entry.amount.to_string(),
        category_id: entry.category_id,
        category_name,
        remarks: entry.remarks,
        image: entry.image,
        extra: entry.extra,
        recorded_by: entry.user_id,
        running_balance: running_balance.map(|b| b.to_string()),
    }
}

/// Content-Disposition value for a download named `file_name`.
pub fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
