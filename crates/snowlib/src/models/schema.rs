use async_trait::async_trait;

use super::database::Database;
use super::object::{Scope, SchemaChild, SnowflakeObject, child_names, object_identity};
use super::show::Show;
use super::table::{Table, View};
use crate::context::Context;
use crate::sql::Fqn;
use crate::{Error, Result};

#[derive(Clone)]
pub struct Schema {
    fqn: Fqn,
    context: Context,
}

object_identity!(Schema);

impl Schema {
    pub fn new(database: &str, name: &str, context: Context) -> Result<Self> {
        Ok(Self::from_fqn(Fqn::from_parts([database, name])?, context))
    }

    pub(crate) const fn from_fqn(fqn: Fqn, context: Context) -> Self {
        Self { fqn, context }
    }

    /// Parse `db.schema` or `schema`, taking the database from the default
    /// or the session
    pub async fn from_name(
        name: &str,
        context: &Context,
        default_database: Option<&str>,
    ) -> Result<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        match parts.as_slice() {
            [database, schema] => Self::new(database, schema, context.clone()),
            [schema] => {
                let database = match default_database.filter(|d| !d.is_empty()) {
                    Some(database) => database.to_string(),
                    None => context.current_database().await?,
                };
                if database.is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "Cannot resolve '{name}': no database in context. \
                         Provide default_database or USE DATABASE first."
                    )));
                }
                Self::new(&database, schema, context.clone())
            }
            _ => Err(Error::invalid_argument(format!(
                "Invalid name: '{name}' (too many periods)"
            ))),
        }
    }

    #[must_use]
    pub fn database(&self) -> Database {
        Database::from_fqn(self.fqn.truncated(1), self.context.clone())
    }

    fn as_scope(&self) -> Scope {
        Scope::new(Self::OBJECT_TYPE, self.fqn.clone())
    }

    async fn children<T: SchemaChild>(&self) -> Result<Vec<T>> {
        Ok(child_names::<T>(&self.context, &self.as_scope())
            .await?
            .iter()
            .filter_map(|name| self.fqn.child(name).ok())
            .map(|fqn| T::from_fqn(fqn, self.context.clone()))
            .collect())
    }

    pub async fn tables(&self) -> Result<Vec<Table>> {
        self.children().await
    }

    pub async fn views(&self) -> Result<Vec<View>> {
        self.children().await
    }

    /// Table handle; existence is not checked
    pub fn table(&self, name: &str) -> Result<Table> {
        Ok(Table::from_fqn(self.fqn.child(name)?, self.context.clone()))
    }

    pub fn view(&self, name: &str) -> Result<View> {
        Ok(View::from_fqn(self.fqn.child(name)?, self.context.clone()))
    }

    pub async fn has_table(&self, name: &str) -> Result<bool> {
        Show::new(self.context.clone())
            .exists::<Table>(name, Some(&self.as_scope()))
            .await
    }

    pub async fn has_view(&self, name: &str) -> Result<bool> {
        Show::new(self.context.clone())
            .exists::<View>(name, Some(&self.as_scope()))
            .await
    }
}

#[async_trait]
impl SnowflakeObject for Schema {
    const SHOW_PLURAL: &'static str = "SCHEMAS";
    const OBJECT_TYPE: &'static str = "SCHEMA";

    fn context(&self) -> &Context {
        &self.context
    }

    fn fqn(&self) -> &Fqn {
        &self.fqn
    }

    fn scope(&self) -> Option<Scope> {
        Some(Scope::new(
            Database::OBJECT_TYPE,
            self.fqn.truncated(1),
        ))
    }
}
