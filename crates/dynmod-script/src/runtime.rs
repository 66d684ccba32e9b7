//! Script runtime

use std::collections::HashMap;

use async_trait::async_trait;
use dynmod_loader::{ExecutionContext, LoadError, ScriptEngine, SourceLocation, Value};
use futures::future::{BoxFuture, FutureExt};

use crate::ast::{Expr, Program, Statement, StatementKind};

/// Executes programs produced by [`ScriptTransformer`](crate::ScriptTransformer).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptRuntime;

impl ScriptRuntime {
    /// Create a runtime
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptEngine for ScriptRuntime {
    async fn run(&self, code: &str, context: &ExecutionContext) -> Result<(), LoadError> {
        let program: Program = serde_json::from_str(code).map_err(|e| {
            LoadError::execution(
                context.info().filename(),
                format!("malformed compiled program: {}", e),
                None,
            )
        })?;

        let mut frame = Frame {
            context,
            locals: HashMap::new(),
        };
        for statement in &program.statements {
            frame.exec(statement).await?;
        }
        Ok(())
    }
}

/// Local bindings of one execution
struct Frame<'a> {
    context: &'a ExecutionContext,
    locals: HashMap<String, Value>,
}

impl<'a> Frame<'a> {
    async fn exec(&mut self, statement: &Statement) -> Result<(), LoadError> {
        let at = SourceLocation::new(statement.line, statement.column);
        match &statement.kind {
            StatementKind::Let { name, value } => {
                let value = self.eval(value, at).await?;
                self.locals.insert(name.clone(), value);
            }
            StatementKind::SetExport { name, value } => {
                let value = self.eval(value, at).await?;
                self.context.exports().set(name.clone(), value);
            }
            StatementKind::ReplaceExports { value } => {
                let value = self.eval(value, at).await?;
                self.context.exports().replace(value);
            }
            StatementKind::Throw { value } => {
                let value = self.eval(value, at).await?;
                return Err(self.error(at, display(&value)));
            }
            StatementKind::Eval { value } => {
                self.eval(value, at).await?;
            }
        }
        Ok(())
    }

    fn eval<'e>(&'e self, expr: &'e Expr, at: SourceLocation) -> BoxFuture<'e, Result<Value, LoadError>> {
        async move {
            let value = match expr {
                Expr::Null => Value::Null,
                Expr::Bool(b) => Value::Bool(*b),
                Expr::Number(n) => Value::Number(*n),
                Expr::String(s) => Value::from(s.as_str()),
                Expr::List(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(self.eval(item, at).await?);
                    }
                    Value::from(values)
                }
                Expr::Local(name) => match self.locals.get(name) {
                    Some(value) => value.clone(),
                    None => return Err(self.error(at, format!("{} is not defined", name))),
                },
                Expr::Exports => self.context.exports().get(),
                Expr::Filename => Value::from(self.context.info().filename()),
                Expr::Dirname => Value::from(self.context.info().dirname()),
                Expr::Require(specifier) => self.context.require(specifier)?,
                Expr::Import(specifier) => self.context.import(specifier).await?,
                Expr::Member(base, name) => {
                    let base = self.eval(base, at).await?;
                    match &base {
                        Value::Object(obj) => obj.get(name).unwrap_or_default(),
                        other => {
                            return Err(self.error(
                                at,
                                format!("cannot read property '{}' of {}", name, type_name(other)),
                            ))
                        }
                    }
                }
            };
            Ok(value)
        }
        .boxed()
    }

    fn error(&self, at: SourceLocation, message: impl Into<String>) -> LoadError {
        LoadError::execution(self.context.info().filename(), message, Some(at))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::List(_) => "list",
        Value::Object(_) => "object",
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => other.to_json().to_string(),
    }
}
