use async_trait::async_trait;

use super::object::{Scope, SnowflakeObject, child_names, object_identity};
use super::schema::Schema;
use super::show::Show;
use crate::context::Context;
use crate::sql::Fqn;
use crate::{Error, Result};

#[derive(Clone)]
pub struct Database {
    fqn: Fqn,
    context: Context,
}

object_identity!(Database);

impl Database {
    pub fn new(name: &str, context: Context) -> Result<Self> {
        Ok(Self::from_fqn(Fqn::from_parts([name])?, context))
    }

    pub(crate) const fn from_fqn(fqn: Fqn, context: Context) -> Self {
        Self { fqn, context }
    }

    /// Single-part name; a qualified name is rejected
    pub fn from_name(name: &str, context: Context) -> Result<Self> {
        if name.contains('.') {
            return Err(Error::invalid_argument(format!(
                "Invalid name: '{name}' (too many periods)"
            )));
        }
        Self::new(name, context)
    }

    fn as_scope(&self) -> Scope {
        Scope::new(Self::OBJECT_TYPE, self.fqn.clone())
    }

    /// Schemas currently in this database
    pub async fn schemas(&self) -> Result<Vec<Schema>> {
        Ok(child_names::<Schema>(&self.context, &self.as_scope())
            .await?
            .iter()
            .filter_map(|name| self.fqn.child(name).ok())
            .map(|fqn| Schema::from_fqn(fqn, self.context.clone()))
            .collect())
    }

    /// Schema handle; existence is not checked
    pub fn schema(&self, name: &str) -> Result<Schema> {
        Ok(Schema::from_fqn(self.fqn.child(name)?, self.context.clone()))
    }

    pub async fn has_schema(&self, name: &str) -> Result<bool> {
        Show::new(self.context.clone())
            .exists::<Schema>(name, Some(&self.as_scope()))
            .await
    }
}

#[async_trait]
impl SnowflakeObject for Database {
    const SHOW_PLURAL: &'static str = "DATABASES";
    const OBJECT_TYPE: &'static str = "DATABASE";

    fn context(&self) -> &Context {
        &self.context
    }

    fn fqn(&self) -> &Fqn {
        &self.fqn
    }

    fn scope(&self) -> Option<Scope> {
        None
    }
}
