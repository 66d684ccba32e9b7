//! Statement parser
//!
//! ```text
//! statement := "use" STRING
//!            | "export" IDENT "=" expr          (module scripts only)
//!            | "let" IDENT "=" expr
//!            | "throw" expr
//!            | expr "=" expr                    (target: exports or exports.IDENT)
//!            | expr
//! expr      := primary ("." IDENT)*
//! primary   := null | true | false | NUMBER | STRING | IDENT
//!            | exports | __filename | __dirname
//!            | "require" STRING | "import" STRING | "env" STRING
//!            | "[" (expr ("," expr)*)? "]"
//! ```
//!
//! `env "NAME"` is replaced by the variable's value at transform time, which
//! makes the output depend on the environment.

use crate::ast::{Expr, Program, Statement, StatementKind};
use crate::token::{lex_line, Spanned, Token};

/// A parse failure with its source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Description of the problem
    pub message: String,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

/// Result of parsing a module
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModule {
    /// `use` specifiers in source order, duplicates removed
    pub dependencies: Vec<String>,
    /// Executable statements
    pub program: Program,
    /// True if the program inlined environment values
    pub volatile: bool,
}

/// Parse a whole module.
///
/// `env` looks up variables for `env "NAME"` expressions.
pub fn parse_module(
    source: &str,
    module_syntax: bool,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ParsedModule, ParseError> {
    let mut parsed = ParsedModule {
        dependencies: Vec::new(),
        program: Program::default(),
        volatile: false,
    };

    for (index, text) in source.lines().enumerate() {
        let line = index as u32 + 1;
        let tokens = lex_line(text).map_err(|e| ParseError {
            message: e.message,
            line,
            column: e.column,
        })?;
        let end_column = text.chars().count() as u32 + 1;

        let mut parser = LineParser {
            tokens,
            pos: 0,
            line,
            end_column,
            module_syntax,
            env,
            volatile: false,
        };

        match parser.statement()? {
            Some(Parsed::Use(specifier)) => {
                if !parsed.dependencies.contains(&specifier) {
                    parsed.dependencies.push(specifier);
                }
            }
            Some(Parsed::Statement(statement)) => parsed.program.statements.push(statement),
            None => {}
        }
        parsed.volatile |= parser.volatile;
    }

    Ok(parsed)
}

enum Parsed {
    Use(String),
    Statement(Statement),
}

struct LineParser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    line: u32,
    end_column: u32,
    module_syntax: bool,
    env: &'a dyn Fn(&str) -> Option<String>,
    volatile: bool,
}

impl LineParser<'_> {
    fn statement(&mut self) -> Result<Option<Parsed>, ParseError> {
        while self.eat(&Token::Semicolon) {}
        let Some(first) = self.peek().cloned() else {
            return Ok(None);
        };
        let column = first.column;

        let parsed = match first.token {
            Token::Use => {
                self.advance();
                Parsed::Use(self.string("module specifier after 'use'")?)
            }
            Token::Export => {
                if !self.module_syntax {
                    return Err(self.error_at(
                        column,
                        "'export' is only valid in module scripts; use 'exports.name = ...'",
                    ));
                }
                self.advance();
                let name = self.identifier("export name")?;
                self.expect(&Token::Equal, "'=' after export name")?;
                let value = self.expr()?;
                Parsed::Statement(self.at(column, StatementKind::SetExport { name, value }))
            }
            Token::Let => {
                self.advance();
                let name = self.identifier("binding name after 'let'")?;
                self.expect(&Token::Equal, "'=' after binding name")?;
                let value = self.expr()?;
                Parsed::Statement(self.at(column, StatementKind::Let { name, value }))
            }
            Token::Throw => {
                self.advance();
                let value = self.expr()?;
                Parsed::Statement(self.at(column, StatementKind::Throw { value }))
            }
            _ => {
                let target = self.expr()?;
                if self.eat(&Token::Equal) {
                    let value = self.expr()?;
                    let kind = match target {
                        Expr::Exports => StatementKind::ReplaceExports { value },
                        Expr::Member(base, name) if *base == Expr::Exports => {
                            StatementKind::SetExport { name, value }
                        }
                        _ => return Err(self.error_at(column, "invalid assignment target")),
                    };
                    Parsed::Statement(self.at(column, kind))
                } else {
                    Parsed::Statement(self.at(column, StatementKind::Eval { value: target }))
                }
            }
        };

        self.eat(&Token::Semicolon);
        if let Some(extra) = self.peek() {
            return Err(self.error_at(
                extra.column,
                format!("unexpected {} after statement", extra.token.describe()),
            ));
        }
        Ok(Some(parsed))
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        while self.eat(&Token::Dot) {
            let name = self.identifier("property name after '.'")?;
            expr = Expr::Member(Box::new(expr), name);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let Some(next) = self.advance() else {
            return Err(self.error_at(self.end_column, "expected expression"));
        };

        let expr = match next.token {
            Token::Null => Expr::Null,
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Number(n) if !n.is_finite() => {
                return Err(self.error_at(next.column, "number literal out of range"))
            }
            Token::Number(n) => Expr::Number(n),
            Token::Str(s) => Expr::String(s),
            Token::Identifier(name) => Expr::Local(name),
            Token::Exports => Expr::Exports,
            Token::Filename => Expr::Filename,
            Token::Dirname => Expr::Dirname,
            Token::Require => Expr::Require(self.string("module specifier after 'require'")?),
            Token::Import => Expr::Import(self.string("module specifier after 'import'")?),
            Token::Env => {
                let name = self.string("variable name after 'env'")?;
                self.volatile = true;
                match (self.env)(&name) {
                    Some(value) => Expr::String(value),
                    None => Expr::Null,
                }
            }
            Token::LeftBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RightBracket) {
                    loop {
                        items.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RightBracket, "',' or ']' in list")?;
                        break;
                    }
                }
                Expr::List(items)
            }
            other => {
                return Err(self.error_at(
                    next.column,
                    format!("expected expression, found {}", other.describe()),
                ))
            }
        };
        Ok(expr)
    }

    fn string(&mut self, what: &str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Spanned {
                token: Token::Str(s),
                ..
            }) => Ok(s),
            Some(other) => Err(self.error_at(
                other.column,
                format!("expected {}, found {}", what, other.token.describe()),
            )),
            None => Err(self.error_at(self.end_column, format!("expected {}", what))),
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Spanned {
                token: Token::Identifier(name),
                ..
            }) => Ok(name),
            Some(other) => Err(self.error_at(
                other.column,
                format!("expected {}, found {}", what, other.token.describe()),
            )),
            None => Err(self.error_at(self.end_column, format!("expected {}", what))),
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            return Ok(());
        }
        let (column, found) = match self.peek() {
            Some(next) => (next.column, format!(", found {}", next.token.describe())),
            None => (self.end_column, String::new()),
        };
        Err(self.error_at(column, format!("expected {}{}", what, found)))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().is_some_and(|next| &next.token == token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn at(&self, column: u32, kind: StatementKind) -> Statement {
        Statement {
            line: self.line,
            column,
            kind,
        }
    }

    fn error_at(&self, column: u32, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(source: &str) -> Result<ParsedModule, ParseError> {
        parse_module(source, false, &no_env)
    }

    #[test]
    fn test_use_collects_dependencies_in_order() {
        let parsed = parse("use \"./b\"\nuse './a'\nuse \"./b\"\nexports.x = 1").unwrap();
        assert_eq!(parsed.dependencies, vec!["./b".to_string(), "./a".to_string()]);
        assert_eq!(parsed.program.statements.len(), 1);
        assert!(!parsed.volatile);
    }

    #[test]
    fn test_statement_forms() {
        let parsed = parse(
            "let lib = require \"./lib\".inner\nexports.name = lib.name\nexports = [1, \"two\", null]\nthrow \"bad\"",
        )
        .unwrap();
        let kinds: Vec<_> = parsed.program.statements.iter().map(|s| &s.kind).collect();

        assert_eq!(
            kinds[0],
            &StatementKind::Let {
                name: "lib".to_string(),
                value: Expr::Member(Box::new(Expr::Require("./lib".to_string())), "inner".to_string()),
            }
        );
        assert_eq!(
            kinds[1],
            &StatementKind::SetExport {
                name: "name".to_string(),
                value: Expr::Member(Box::new(Expr::Local("lib".to_string())), "name".to_string()),
            }
        );
        assert!(matches!(kinds[2], StatementKind::ReplaceExports { value: Expr::List(items) } if items.len() == 3));
        assert!(matches!(kinds[3], StatementKind::Throw { .. }));
        assert_eq!(parsed.program.statements[3].line, 4);
    }

    #[test]
    fn test_export_requires_module_syntax() {
        let err = parse("\n  export x = 1").unwrap_err();
        assert_eq!((err.line, err.column), (2, 3));

        let parsed = parse_module("export x = 1", true, &no_env).unwrap();
        assert!(matches!(
            &parsed.program.statements[0].kind,
            StatementKind::SetExport { name, .. } if name == "x"
        ));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse("lib.x = 1").unwrap_err();
        assert_eq!(err.message, "invalid assignment target");
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("exports.x = 1 2").unwrap_err();
        assert_eq!(err.column, 15);
        assert!(err.message.contains("number 2"));
    }

    #[test]
    fn test_overflowing_number_rejected() {
        let err = parse("exports.ok = 1e300\nexports.x = 1e999").unwrap_err();
        assert_eq!(err.message, "number literal out of range");
        assert_eq!((err.line, err.column), (2, 13));

        let err = parse("let x = [-1e400]").unwrap_err();
        assert_eq!(err.column, 10);
    }

    #[test]
    fn test_missing_expression() {
        let err = parse("let x =").unwrap_err();
        assert_eq!(err.message, "expected expression");
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_env_is_inlined_and_volatile() {
        let env = |name: &str| (name == "MODE").then(|| "prod".to_string());
        let parsed = parse_module("exports.mode = env \"MODE\"\nexports.other = env \"NOPE\"", false, &env).unwrap();

        assert!(parsed.volatile);
        assert_eq!(
            parsed.program.statements[0].kind,
            StatementKind::SetExport {
                name: "mode".to_string(),
                value: Expr::String("prod".to_string()),
            }
        );
        assert_eq!(
            parsed.program.statements[1].kind,
            StatementKind::SetExport {
                name: "other".to_string(),
                value: Expr::Null,
            }
        );
    }
}
