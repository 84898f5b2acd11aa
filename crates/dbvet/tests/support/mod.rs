//! In-memory host persistence layer for the integration suites.
//!
//! `Db` stands in for a real database session: it enforces a unique index
//! on user emails, a check constraint on the email column, an untracked
//! unique index on nicknames, and a foreign key from users to groups, and
//! it reports failures with the same diagnostics a real driver would
//! attach. It keeps accepting statements after a failure, like a session
//! running with per-statement savepoints.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use dbvet::prelude::*;
use dbvet::{Handling, InvalidRecord, RecordRef};
use dbvet_postgres::PostgresHandler;
use dbvet_sqlite::SqliteHandler;

/// Name of the check constraint on users.email, declared explicitly.
pub const USERS_EMAIL_CHECK: &str = "users_email_chk";

/// A translator configured the way a deployment with both dialects is.
pub fn translator() -> Translator {
    Translator::builder()
        .handler(PostgresHandler::new())
        .handler(SqliteHandler::new())
        .build()
}

/// Which dialect the fake database mimics when a statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// The fake database session.
pub struct Db {
    dialect: Dialect,
    emails: RefCell<HashSet<String>>,
    nicknames: RefCell<HashSet<String>>,
    teams: RefCell<HashSet<String>>,
    /// (room, slot) pairs already booked
    bookings: RefCell<HashSet<(String, i64)>>,
    /// group id -> number of users still referencing it
    groups: RefCell<HashMap<i64, usize>>,
}

impl Db {
    pub fn new(dialect: Dialect) -> Rc<Self> {
        Rc::new(Self {
            dialect,
            emails: RefCell::new(HashSet::new()),
            nicknames: RefCell::new(HashSet::new()),
            teams: RefCell::new(HashSet::new()),
            bookings: RefCell::new(HashSet::new()),
            groups: RefCell::new(HashMap::new()),
        })
    }

    pub fn postgres() -> Rc<Self> {
        Self::new(Dialect::Postgres)
    }

    pub fn sqlite() -> Rc<Self> {
        Self::new(Dialect::Sqlite)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.emails.borrow().contains(email)
    }

    pub fn has_team(&self, name: &str) -> bool {
        self.teams.borrow().contains(name)
    }

    pub fn insert_user(&self, email: &str, nickname: Option<&str>) -> Result<(), StatementError> {
        // CHECK (email NOT LIKE '!%')
        if email.starts_with('!') {
            return Err(self.check_violation(USERS_EMAIL_CHECK));
        }
        if self.emails.borrow().contains(email) {
            return Err(self.unique_violation("index_users_on_email", "users", "email", email));
        }
        if let Some(nickname) = nickname {
            if self.nicknames.borrow().contains(nickname) {
                // This index exists in the schema but is not declared on
                // the record type.
                return Err(self.unique_violation(
                    "index_users_on_nickname",
                    "users",
                    "nickname",
                    nickname,
                ));
            }
            self.nicknames.borrow_mut().insert(nickname.to_string());
        }
        self.emails.borrow_mut().insert(email.to_string());
        Ok(())
    }

    pub fn insert_team(&self, name: &str) -> Result<(), StatementError> {
        if !self.teams.borrow_mut().insert(name.to_string()) {
            return Err(self.unique_violation("index_teams_on_name", "teams", "name", name));
        }
        Ok(())
    }

    pub fn insert_booking(&self, room: &str, slot: i64) -> Result<(), StatementError> {
        // EXCLUDE USING gist (room WITH =, slot WITH &&), collapsed to
        // exact slot collisions for the fake.
        if !self
            .bookings
            .borrow_mut()
            .insert((room.to_string(), slot))
        {
            return Err(StatementError::postgres(
                "23P01",
                r#"conflicting key value violates exclusion constraint "bookings_room_excl""#,
            )
            .detail(format!(
                "Key (room)=({room}) conflicts with existing key (room)=({room})."
            )));
        }
        Ok(())
    }

    pub fn insert_group(&self, id: i64, members: usize) {
        self.groups.borrow_mut().insert(id, members);
    }

    pub fn delete_group(&self, id: i64) -> Result<(), StatementError> {
        let members = self.groups.borrow().get(&id).copied().unwrap_or(0);
        if members > 0 {
            return Err(match self.dialect {
                Dialect::Postgres => StatementError::postgres(
                    "23503",
                    r#"update or delete on table "groups" violates foreign key constraint "users_group_id_fkey" on table "users""#,
                )
                .detail(format!("Key (id)=({id}) is still referenced from table \"users\".")),
                Dialect::Sqlite => {
                    StatementError::sqlite(19, 787, "FOREIGN KEY constraint failed")
                }
            });
        }
        self.groups.borrow_mut().remove(&id);
        Ok(())
    }

    fn unique_violation(
        &self,
        index: &str,
        table: &str,
        column: &str,
        value: &str,
    ) -> StatementError {
        match self.dialect {
            Dialect::Postgres => StatementError::postgres(
                "23505",
                format!(r#"duplicate key value violates unique constraint "{index}""#),
            )
            .detail(format!("Key ({column})=({value}) already exists.")),
            Dialect::Sqlite => StatementError::sqlite(
                19,
                2067,
                format!("UNIQUE constraint failed: {table}.{column}"),
            ),
        }
    }

    fn check_violation(&self, name: &str) -> StatementError {
        match self.dialect {
            Dialect::Postgres => StatementError::postgres(
                "23514",
                format!(r#"new row for relation "users" violates check constraint "{name}""#),
            ),
            Dialect::Sqlite => {
                StatementError::sqlite(19, 275, format!("CHECK constraint failed: {name}"))
            }
        }
    }
}

/// Host-side write options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    pub skip_validation: bool,
}

pub fn user_constraints() -> &'static Arc<ConstraintSet> {
    static SET: OnceLock<Arc<ConstraintSet>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set = ConstraintSet::for_table("users");
        set.unique_constraint(Unique::new(["email"]))
            .expect("declared once");
        set.check_constraint(Check::new("email").name(USERS_EMAIL_CHECK))
            .expect("declared once");
        Arc::new(set)
    })
}

/// A user row. Email is unique and checked; nickname collides with an
/// index the type does not declare.
pub struct User {
    db: Rc<Db>,
    pub email: String,
    pub nickname: Option<String>,
    pub saved: bool,
    errors: Errors,
}

impl User {
    pub fn new(db: &Rc<Db>, email: impl Into<String>) -> Self {
        Self {
            db: Rc::clone(db),
            email: email.into(),
            nickname: None,
            saved: false,
            errors: Errors::new(),
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    fn validate(&mut self, options: &SaveOptions) -> bool {
        if options.skip_validation {
            return true;
        }
        if self.email.contains(char::is_whitespace) {
            self.errors
                .add("email", ErrorMessage::text("must not contain spaces"));
            return false;
        }
        true
    }
}

impl Record for User {
    fn table_name(&self) -> &str {
        "users"
    }

    fn constraints(&self) -> &ConstraintSet {
        user_constraints()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}

impl Persist for User {
    type Options = SaveOptions;

    fn persist(&mut self, _scope: &Handling<'_>, options: &SaveOptions) -> Result<bool, WriteError> {
        self.errors.clear();
        if !self.validate(options) {
            return Ok(false);
        }
        self.db.insert_user(&self.email, self.nickname.as_deref())?;
        self.saved = true;
        Ok(true)
    }

    fn persist_strict(
        &mut self,
        _scope: &Handling<'_>,
        options: &SaveOptions,
    ) -> Result<(), WriteError> {
        self.errors.clear();
        if !self.validate(options) {
            return Err(WriteError::Invalid(InvalidRecord {
                record: RecordRef::new(self.instance_id(), "users"),
                message: "email must not contain spaces".to_string(),
            }));
        }
        self.db.insert_user(&self.email, self.nickname.as_deref())?;
        self.saved = true;
        Ok(())
    }

    fn delete(&mut self, _scope: &Handling<'_>) -> Result<(), WriteError> {
        self.errors.clear();
        self.db.emails.borrow_mut().remove(&self.email);
        self.saved = false;
        Ok(())
    }
}

fn team_constraints() -> &'static ConstraintSet {
    static SET: OnceLock<ConstraintSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set = ConstraintSet::for_table("teams");
        set.unique_constraint(Unique::new(["name"]))
            .expect("declared once");
        set
    })
}

/// A team row persisting its members as a side effect, the way nested
/// attributes do: every member is attempted, the first violation is
/// re-raised after the loop, and the team's own row is only written when
/// all members went through.
pub struct Team {
    db: Rc<Db>,
    pub name: String,
    pub members: Vec<User>,
    pub saved: bool,
    errors: Errors,
}

impl Team {
    pub fn new(db: &Rc<Db>, name: impl Into<String>) -> Self {
        Self {
            db: Rc::clone(db),
            name: name.into(),
            members: Vec::new(),
            saved: false,
            errors: Errors::new(),
        }
    }

    pub fn member(mut self, user: User) -> Self {
        self.members.push(user);
        self
    }

    fn persist_inner(&mut self, scope: &Handling<'_>) -> Result<(), WriteError> {
        self.errors.clear();
        let mut violation: Option<WriteError> = None;
        for member in &mut self.members {
            let result = scope.handle_constraints_strict(member, |user, nested| {
                user.persist_strict(nested, &SaveOptions::default())
            });
            match result {
                Ok(()) => {}
                Err(err @ WriteError::Violation(_)) => {
                    if violation.is_none() {
                        violation = Some(err);
                    }
                }
                Err(other) => return Err(other),
            }
        }
        if let Some(err) = violation {
            return Err(err);
        }
        self.db.insert_team(&self.name)?;
        self.saved = true;
        Ok(())
    }
}

impl Record for Team {
    fn table_name(&self) -> &str {
        "teams"
    }

    fn constraints(&self) -> &ConstraintSet {
        team_constraints()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}

impl Persist for Team {
    type Options = SaveOptions;

    fn persist(&mut self, scope: &Handling<'_>, _options: &SaveOptions) -> Result<bool, WriteError> {
        match self.persist_inner(scope) {
            Ok(()) => Ok(true),
            // The host's lenient save reports its own validation failures
            // as an unsuccessful result, never as an error.
            Err(WriteError::Invalid(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn persist_strict(
        &mut self,
        scope: &Handling<'_>,
        _options: &SaveOptions,
    ) -> Result<(), WriteError> {
        self.persist_inner(scope)
    }

    fn delete(&mut self, _scope: &Handling<'_>) -> Result<(), WriteError> {
        self.errors.clear();
        self.db.teams.borrow_mut().remove(&self.name);
        self.saved = false;
        Ok(())
    }
}

fn org_constraints() -> &'static ConstraintSet {
    static SET: OnceLock<ConstraintSet> = OnceLock::new();
    SET.get_or_init(|| ConstraintSet::for_table("orgs"))
}

/// An organization persisting its teams, one more ancestor level above the
/// users a team persists.
pub struct Org {
    pub teams: Vec<Team>,
    pub saved: bool,
    errors: Errors,
}

impl Org {
    pub fn new() -> Self {
        Self {
            teams: Vec::new(),
            saved: false,
            errors: Errors::new(),
        }
    }

    pub fn team(mut self, team: Team) -> Self {
        self.teams.push(team);
        self
    }
}

impl Record for Org {
    fn table_name(&self) -> &str {
        "orgs"
    }

    fn constraints(&self) -> &ConstraintSet {
        org_constraints()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}

impl Persist for Org {
    type Options = SaveOptions;

    fn persist(&mut self, scope: &Handling<'_>, options: &SaveOptions) -> Result<bool, WriteError> {
        match self.persist_strict(scope, options) {
            Ok(()) => Ok(true),
            Err(WriteError::Invalid(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn persist_strict(
        &mut self,
        scope: &Handling<'_>,
        _options: &SaveOptions,
    ) -> Result<(), WriteError> {
        self.errors.clear();
        for team in &mut self.teams {
            scope.handle_constraints_strict(team, |team, nested| {
                team.persist_strict(nested, &SaveOptions::default())
            })?;
        }
        self.saved = true;
        Ok(())
    }

    fn delete(&mut self, _scope: &Handling<'_>) -> Result<(), WriteError> {
        Ok(())
    }
}

fn booking_constraints() -> &'static ConstraintSet {
    static SET: OnceLock<ConstraintSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set = ConstraintSet::for_table("bookings");
        set.exclusion_constraint(Exclusion::new("room"))
            .expect("declared once");
        set
    })
}

/// A booking row guarded by an exclusion constraint on the room.
pub struct Booking {
    db: Rc<Db>,
    pub room: String,
    pub slot: i64,
    pub saved: bool,
    errors: Errors,
}

impl Booking {
    pub fn new(db: &Rc<Db>, room: impl Into<String>, slot: i64) -> Self {
        Self {
            db: Rc::clone(db),
            room: room.into(),
            slot,
            saved: false,
            errors: Errors::new(),
        }
    }
}

impl Record for Booking {
    fn table_name(&self) -> &str {
        "bookings"
    }

    fn constraints(&self) -> &ConstraintSet {
        booking_constraints()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}

impl Persist for Booking {
    type Options = SaveOptions;

    fn persist(&mut self, _scope: &Handling<'_>, _options: &SaveOptions) -> Result<bool, WriteError> {
        self.errors.clear();
        self.db.insert_booking(&self.room, self.slot)?;
        self.saved = true;
        Ok(true)
    }

    fn persist_strict(
        &mut self,
        _scope: &Handling<'_>,
        _options: &SaveOptions,
    ) -> Result<(), WriteError> {
        self.errors.clear();
        self.db.insert_booking(&self.room, self.slot)?;
        self.saved = true;
        Ok(())
    }

    fn delete(&mut self, _scope: &Handling<'_>) -> Result<(), WriteError> {
        self.errors.clear();
        self.db
            .bookings
            .borrow_mut()
            .remove(&(self.room.clone(), self.slot));
        self.saved = false;
        Ok(())
    }
}

fn group_constraints() -> &'static ConstraintSet {
    static SET: OnceLock<ConstraintSet> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set = ConstraintSet::for_table("groups");
        set.foreign_key_constraint(
            ForeignKey::new(["id"])
                .name("users_group_id_fkey")
                .error_key("members"),
        )
        .expect("declared once");
        set
    })
}

/// A group row whose deletion is blocked while users still reference it.
pub struct Group {
    db: Rc<Db>,
    pub id: i64,
    pub deleted: bool,
    errors: Errors,
}

impl Group {
    pub fn create(db: &Rc<Db>, id: i64, members: usize) -> Self {
        db.insert_group(id, members);
        Self {
            db: Rc::clone(db),
            id,
            deleted: false,
            errors: Errors::new(),
        }
    }
}

impl Record for Group {
    fn table_name(&self) -> &str {
        "groups"
    }

    fn constraints(&self) -> &ConstraintSet {
        group_constraints()
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}

impl Persist for Group {
    type Options = SaveOptions;

    fn persist(&mut self, _scope: &Handling<'_>, _options: &SaveOptions) -> Result<bool, WriteError> {
        Ok(true)
    }

    fn persist_strict(
        &mut self,
        _scope: &Handling<'_>,
        _options: &SaveOptions,
    ) -> Result<(), WriteError> {
        Ok(())
    }

    fn delete(&mut self, _scope: &Handling<'_>) -> Result<(), WriteError> {
        self.errors.clear();
        self.db.delete_group(self.id)?;
        self.deleted = true;
        Ok(())
    }
}
