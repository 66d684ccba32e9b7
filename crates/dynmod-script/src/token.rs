//! Tokens and lexing for the script language.
//!
//! Scripts are line oriented: each line is lexed on its own and holds at most
//! one statement. `#` and `//` start a comment that runs to the end of the line.

use logos::Logos;

/// Token kinds
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // Keywords (must come before identifiers)
    #[token("use")]
    Use,

    #[token("export")]
    Export,

    #[token("exports")]
    Exports,

    #[token("let")]
    Let,

    #[token("throw")]
    Throw,

    #[token("require")]
    Require,

    #[token("import")]
    Import,

    #[token("env")]
    Env,

    #[token("null")]
    Null,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("__filename")]
    Filename,

    #[token("__dirname")]
    Dirname,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number)]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r"'([^'\\\n]|\\.)*'", parse_string)]
    Str(String),

    #[token("=")]
    Equal,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token(";")]
    Semicolon,
}

impl Token {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::Str(s) => format!("string \"{}\"", s),
            Token::Comment => "comment".to_string(),
            Token::Use => "'use'".to_string(),
            Token::Export => "'export'".to_string(),
            Token::Exports => "'exports'".to_string(),
            Token::Let => "'let'".to_string(),
            Token::Throw => "'throw'".to_string(),
            Token::Require => "'require'".to_string(),
            Token::Import => "'import'".to_string(),
            Token::Env => "'env'".to_string(),
            Token::Null => "'null'".to_string(),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::Filename => "'__filename'".to_string(),
            Token::Dirname => "'__dirname'".to_string(),
            Token::Equal => "'='".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Comma => "','".to_string(),
            Token::LeftBracket => "'['".to_string(),
            Token::RightBracket => "']'".to_string(),
            Token::Semicolon => "';'".to_string(),
        }
    }
}

fn parse_number(lex: &mut logos::Lexer<'_, Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<'_, Token>) -> Option<String> {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn unescape(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next()? {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            '0' => result.push('\0'),
            '\\' => result.push('\\'),
            '"' => result.push('"'),
            '\'' => result.push('\''),
            _ => return None,
        }
    }

    Some(result)
}

/// A token with its 1-based column
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Column of the token's first character
    pub column: u32,
}

/// Lexing failure within one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Description of the problem
    pub message: String,
    /// Column where lexing failed
    pub column: u32,
}

/// Lex a single line.
pub fn lex_line(line: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(line);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let column = column_of(line, span.start);
        match result {
            Ok(token) => tokens.push(Spanned { token, column }),
            Err(()) => {
                let rest = &line[span.start..];
                let message = match rest.chars().next() {
                    Some(quote @ ('"' | '\'')) if !rest[1..].contains(quote) => {
                        "unterminated string literal".to_string()
                    }
                    Some('"' | '\'') => "invalid escape sequence in string literal".to_string(),
                    Some(c) => format!("unexpected character '{}'", c),
                    None => "unexpected end of line".to_string(),
                };
                return Err(LexError { message, column });
            }
        }
    }

    Ok(tokens)
}

fn column_of(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].chars().count() as u32 + 1
}
