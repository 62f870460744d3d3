//! Initial schema migration.
//!
//! - `users`: accounts with an optional system role
//! - `books`: cashbooks, owned by their creator
//! - `book_members`: per-book roles
//! - `categories`: per-book entry categories
//! - `cash_entries`: dated cash-in/cash-out records

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    SystemRole,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Books {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum BookMembers {
    Table,
    BookId,
    UserId,
    Role,
    CreatedBy,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    BookId,
    Name,
    NameNorm,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum CashEntries {
    Table,
    Id,
    BookId,
    UserId,
    Date,
    Time,
    Kind,
    AmountMinor,
    CategoryId,
    Remarks,
    RemarksNorm,
    Image,
    Extra,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::SystemRole).string())
                    .col(ColumnDef::new(Users::CreatedBy).string())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-created_by")
                            .from(Users::Table, Users::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Books
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Books::Name).string().not_null())
                    .col(ColumnDef::new(Books::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Books::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-books-created_by")
                            .from(Books::Table, Books::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-books-created_by")
                    .table(Books::Table)
                    .col(Books::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Book members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BookMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BookMembers::BookId).string().not_null())
                    .col(ColumnDef::new(BookMembers::UserId).string().not_null())
                    .col(ColumnDef::new(BookMembers::Role).string().not_null())
                    .col(ColumnDef::new(BookMembers::CreatedBy).string())
                    .primary_key(
                        Index::create()
                            .col(BookMembers::BookId)
                            .col(BookMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_members-book_id")
                            .from(BookMembers::Table, BookMembers::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_members-user_id")
                            .from(BookMembers::Table, BookMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-book_members-created_by")
                            .from(BookMembers::Table, BookMembers::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-book_members-user_id")
                    .table(BookMembers::Table)
                    .col(BookMembers::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-book_members-created_by")
                    .table(BookMembers::Table)
                    .col(BookMembers::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::BookId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::CreatedBy).string())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-book_id")
                            .from(Categories::Table, Categories::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-created_by")
                            .from(Categories::Table, Categories::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-book_id-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::BookId)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Cash entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CashEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CashEntries::BookId).string().not_null())
                    .col(ColumnDef::new(CashEntries::UserId).string().not_null())
                    .col(ColumnDef::new(CashEntries::Date).date().not_null())
                    .col(ColumnDef::new(CashEntries::Time).time().not_null())
                    .col(ColumnDef::new(CashEntries::Kind).string().not_null())
                    .col(
                        ColumnDef::new(CashEntries::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CashEntries::CategoryId).string())
                    .col(
                        ColumnDef::new(CashEntries::Remarks)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CashEntries::RemarksNorm)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(CashEntries::Image).string())
                    .col(ColumnDef::new(CashEntries::Extra).string())
                    .col(
                        ColumnDef::new(CashEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CashEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_entries-book_id")
                            .from(CashEntries::Table, CashEntries::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_entries-user_id")
                            .from(CashEntries::Table, CashEntries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cash_entries-category_id")
                            .from(CashEntries::Table, CashEntries::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_entries-book_id-date")
                    .table(CashEntries::Table)
                    .col(CashEntries::BookId)
                    .col(CashEntries::Date)
                    .col(CashEntries::Time)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_entries-category_id")
                    .table(CashEntries::Table)
                    .col(CashEntries::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse creation order for the foreign keys.
        manager
            .drop_table(Table::drop().table(CashEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BookMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
