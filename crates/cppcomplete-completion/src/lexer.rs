//! Reference C/C++ lexer and a slice-backed [`TokenCursor`]
//!
//! The lexer is shallow. It recognizes trivia, words, literals and
//! punctuators well enough for context classification, and folds every
//! preprocessor directive line into a single [`TokenKind::PreprocessorDirective`]
//! token whose contents are lexed again as an embedded stream.
//!
//! Lexing never fails. Unterminated comments and literals run to the end of
//! the line (literals) or the input (block comments); unexpected characters
//! become [`TokenKind::Unknown`].

use crate::token::{is_identifier_part, KeywordKind, Token, TokenCursor, TokenKind};
use crate::types::TextSpan;

/// A token produced by [`lex`], owning its embedded stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedToken {
    pub kind: TokenKind,
    pub span: TextSpan,
    /// Tokens of a directive line; empty for every other kind
    pub embedded: Vec<LexedToken>,
}

impl LexedToken {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: TextSpan::new(start as u32, end as u32),
            embedded: Vec::new(),
        }
    }
}

/// Lex a whole buffer
pub fn lex(text: &str) -> Vec<LexedToken> {
    Lexer::new(text, 0, false).tokenize()
}

const MULTI_CHAR_OPERATORS: &[&str] = &[
    "<<=", ">>=", "<=>", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "##",
];

struct Lexer<'a> {
    src: &'a str,
    /// Absolute offset of `src[0]` in the buffer
    base: usize,
    pos: usize,
    at_line_start: bool,
    in_directive: bool,
    expect_directive_name: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, base: usize, in_directive: bool) -> Self {
        Self {
            src,
            base,
            pos: 0,
            at_line_start: true,
            in_directive,
            expect_directive_name: false,
        }
    }

    fn tokenize(mut self) -> Vec<LexedToken> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> LexedToken {
        LexedToken::new(kind, self.base + start, self.base + self.pos)
    }

    fn next_token(&mut self) -> Option<LexedToken> {
        let start = self.pos;
        let ch = self.peek()?;

        let kind = match ch {
            '\n' => {
                self.bump();
                self.at_line_start = true;
                return Some(self.token(TokenKind::Newline, start));
            }
            ' ' | '\t' | '\r' | '\x0b' | '\x0c' => {
                self.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\x0b' | '\x0c'));
                return Some(self.token(TokenKind::Whitespace, start));
            }
            '\\' if self.in_directive && self.is_line_continuation() => {
                self.bump();
                self.eat("\r");
                self.eat("\n");
                return Some(self.token(TokenKind::Whitespace, start));
            }
            '#' if !self.in_directive && self.at_line_start => return Some(self.directive(start)),
            '#' if self.in_directive => {
                if self.eat("##") {
                    TokenKind::Operator
                } else {
                    self.bump();
                    self.expect_directive_name = start == self.first_significant_offset();
                    TokenKind::Hash
                }
            }
            '/' if self.rest().starts_with("//") => {
                let doc = self.rest().starts_with("///") || self.rest().starts_with("//!");
                self.eat_while(|c| c != '\n');
                if doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::LineComment
                }
            }
            '/' if self.rest().starts_with("/*") => {
                let rest = self.rest();
                let doc = (rest.starts_with("/**") && !rest.starts_with("/**/"))
                    || rest.starts_with("/*!");
                self.pos += 2;
                match self.rest().find("*/") {
                    Some(end) => self.pos += end + 2,
                    None => self.pos = self.src.len(),
                }
                let kind = if doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::BlockComment
                };
                return Some(self.token(kind, start));
            }
            '"' => {
                self.quoted('"');
                TokenKind::StringLiteral
            }
            '\'' => {
                self.quoted('\'');
                TokenKind::CharLiteral
            }
            c if c.is_ascii_digit() => {
                self.number();
                TokenKind::Number
            }
            '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.word(),
            '.' => {
                if self.eat("...") {
                    TokenKind::Ellipsis
                } else if self.eat(".*") {
                    TokenKind::DotStar
                } else {
                    self.bump();
                    TokenKind::Dot
                }
            }
            '-' if self.rest().starts_with("->") => {
                if self.eat("->*") {
                    TokenKind::ArrowStar
                } else {
                    self.pos += 2;
                    TokenKind::Arrow
                }
            }
            ':' => {
                if self.eat("::") {
                    TokenKind::Scope
                } else {
                    self.bump();
                    TokenKind::Colon
                }
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ';' | ',' => {
                self.bump();
                match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ';' => TokenKind::Semicolon,
                    _ => TokenKind::Comma,
                }
            }
            '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' | '~' | '?' => {
                if !MULTI_CHAR_OPERATORS.iter().any(|op| self.eat(op)) {
                    self.bump();
                }
                TokenKind::Operator
            }
            _ => {
                self.bump();
                TokenKind::Unknown
            }
        };

        self.at_line_start = false;
        Some(self.token(kind, start))
    }

    fn is_line_continuation(&self) -> bool {
        let rest = self.rest();
        rest.starts_with("\\\n") || rest.starts_with("\\\r\n")
    }

    /// Offset of the first non-whitespace character of this (directive) source
    fn first_significant_offset(&self) -> usize {
        self.src.len() - self.src.trim_start().len()
    }

    /// Fold a directive line, including `\` continuations, into one token
    fn directive(&mut self, start: usize) -> LexedToken {
        loop {
            match self.rest().find('\n') {
                Some(nl) => {
                    let line = &self.rest()[..nl];
                    let continued = line.trim_end_matches('\r').ends_with('\\');
                    if continued {
                        self.pos += nl + 1;
                    } else {
                        self.pos += nl;
                        break;
                    }
                }
                None => {
                    self.pos = self.src.len();
                    break;
                }
            }
        }

        let mut token = self.token(TokenKind::PreprocessorDirective, start);
        token.embedded = Lexer::new(&self.src[start..self.pos], self.base + start, true).tokenize();
        self.at_line_start = false;
        token
    }

    fn quoted(&mut self, quote: char) {
        self.bump();
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => return,
                '\\' => {
                    self.bump();
                    if self.peek() != Some('\n') {
                        self.bump();
                    }
                }
                c if c == quote => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// `R"delim( ... )delim"`; the cursor sits on the opening quote
    fn raw_string(&mut self) {
        self.bump();
        let delim_start = self.pos;
        self.eat_while(|c| c != '(' && c != '"' && c != '\n' && c != ' ');
        if self.peek() != Some('(') {
            self.quoted_tail();
            return;
        }
        let closing = format!("){}\"", &self.src[delim_start..self.pos]);
        match self.rest().find(&closing) {
            Some(end) => self.pos += end + closing.len(),
            None => self.pos = self.src.len(),
        }
    }

    fn quoted_tail(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '"' {
                return;
            }
            if self.peek() == Some('\n') {
                return;
            }
        }
    }

    fn number(&mut self) {
        let mut prev = '\0';
        while let Some(ch) = self.peek() {
            let accept = ch.is_ascii_alphanumeric()
                || ch == '_'
                || ch == '.'
                || (ch == '\'' && self.peek_nth(1).is_some_and(|c| c.is_ascii_alphanumeric()))
                || ((ch == '+' || ch == '-') && matches!(prev, 'e' | 'E' | 'p' | 'P'));
            if !accept {
                break;
            }
            prev = ch;
            self.bump();
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_while(is_identifier_part);
        let text = &self.src[start..self.pos];

        if matches!(self.peek(), Some('"') | Some('\'')) && is_literal_prefix(text) {
            if text.ends_with('R') && self.peek() == Some('"') {
                self.raw_string();
                return TokenKind::StringLiteral;
            }
            return match self.peek() {
                Some('"') => {
                    self.quoted('"');
                    TokenKind::StringLiteral
                }
                _ => {
                    self.quoted('\'');
                    TokenKind::CharLiteral
                }
            };
        }

        if self.in_directive && self.expect_directive_name {
            self.expect_directive_name = false;
            return TokenKind::DirectiveName;
        }

        match keyword_kind(text) {
            Some(kind) => TokenKind::Keyword(kind),
            None => TokenKind::Identifier,
        }
    }
}

fn is_literal_prefix(text: &str) -> bool {
    matches!(
        text,
        "L" | "u" | "U" | "u8" | "R" | "LR" | "uR" | "UR" | "u8R"
    )
}

/// Keyword classification for C and C++ reserved words
pub fn keyword_kind(text: &str) -> Option<KeywordKind> {
    let kind = match text {
        "goto" => KeywordKind::Goto,
        "namespace" => KeywordKind::Namespace,
        "static_cast" => KeywordKind::StaticCast,
        "dynamic_cast" => KeywordKind::DynamicCast,
        "reinterpret_cast" => KeywordKind::ReinterpretCast,
        "const_cast" => KeywordKind::ConstCast,
        "template" => KeywordKind::Template,
        "decltype" => KeywordKind::Decltype,
        "typeid" => KeywordKind::Typeid,
        "alignof" | "_Alignof" => KeywordKind::Alignof,
        "alignas" | "_Alignas" => KeywordKind::Alignas,
        "static_assert" | "_Static_assert" => KeywordKind::StaticAssert,
        "asm" | "__asm" | "__asm__" => KeywordKind::Asm,
        "auto" | "break" | "case" | "char" | "const" | "continue" | "default" | "do"
        | "double" | "else" | "enum" | "extern" | "float" | "for" | "if" | "inline" | "int"
        | "long" | "register" | "restrict" | "return" | "short" | "signed" | "sizeof"
        | "static" | "struct" | "switch" | "typedef" | "union" | "unsigned" | "void"
        | "volatile" | "while" | "_Atomic" | "_Bool" | "_Complex" | "_Generic"
        | "_Imaginary" | "_Noreturn" | "_Thread_local" | "and" | "and_eq" | "bitand"
        | "bitor" | "bool" | "catch" | "char8_t" | "char16_t" | "char32_t" | "class"
        | "co_await" | "co_return" | "co_yield" | "compl" | "concept" | "consteval"
        | "constexpr" | "constinit" | "delete" | "explicit" | "export" | "false" | "friend"
        | "mutable" | "new" | "noexcept" | "not" | "not_eq" | "nullptr" | "operator" | "or"
        | "or_eq" | "private" | "protected" | "public" | "requires" | "this"
        | "thread_local" | "throw" | "true" | "try" | "typename" | "using" | "virtual"
        | "wchar_t" | "xor" | "xor_eq" => KeywordKind::Plain,
        _ => return None,
    };
    Some(kind)
}

/// [`TokenCursor`] over a slice of [`LexedToken`]s and the text they index
#[derive(Debug, Clone)]
pub struct SliceTokenCursor<'a> {
    text: &'a str,
    tokens: &'a [LexedToken],
    index: Option<usize>,
}

impl<'a> SliceTokenCursor<'a> {
    pub fn new(text: &'a str, tokens: &'a [LexedToken]) -> Self {
        Self {
            text,
            tokens,
            index: None,
        }
    }
}

impl TokenCursor for SliceTokenCursor<'_> {
    fn move_to(&mut self, offset: u32) -> bool {
        let idx = self.tokens.partition_point(|t| t.span.end < offset);
        self.index = self
            .tokens
            .get(idx)
            .filter(|t| t.span.ends_at_or_covers(offset))
            .map(|_| idx);
        self.index.is_some()
    }

    fn token(&self) -> Option<Token<'_>> {
        let lexed = self.tokens.get(self.index?)?;
        let range = lexed.span.start as usize..lexed.span.end as usize;
        Some(Token::new(
            lexed.kind,
            lexed.span,
            self.text.get(range).unwrap_or(""),
        ))
    }

    fn move_previous(&mut self) -> bool {
        match self.index {
            Some(i) if i > 0 => {
                self.index = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    fn move_next(&mut self) -> bool {
        match self.index {
            Some(i) if i + 1 < self.tokens.len() => {
                self.index = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    fn embedded(&self) -> Option<Box<dyn TokenCursor + '_>> {
        let lexed = self.tokens.get(self.index?)?;
        if lexed.embedded.is_empty() {
            return None;
        }
        Some(Box::new(SliceTokenCursor::new(self.text, &lexed.embedded)))
    }
}
