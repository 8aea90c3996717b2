use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for Java-subset source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line and column where the current token started
    start_line: usize,
    start_column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' | '\u{000C}' => {}
            '\n' => self.newline(),

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ';' => self.add_token(TokenKind::Semicolon),
            '@' => self.add_token(TokenKind::At),
            '?' => self.add_token(TokenKind::Question),
            ':' => self.add_token(TokenKind::Colon),
            '~' => self.add_token(TokenKind::Tilde),

            '.' => {
                if self.peek().is_ascii_digit() {
                    self.scan_number()?;
                } else if self.peek() == '.' && self.peek_next() == '.' {
                    self.advance();
                    self.advance();
                    self.add_token(TokenKind::Ellipsis);
                } else {
                    self.add_token(TokenKind::Dot);
                }
            }

            '+' => {
                if self.match_char('+') {
                    self.add_token(TokenKind::PlusPlus);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::PlusAssign);
                } else {
                    self.add_token(TokenKind::Plus);
                }
            }
            '-' => {
                if self.match_char('-') {
                    self.add_token(TokenKind::MinusMinus);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::MinusAssign);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '*' => self.one_or_assign(TokenKind::Star, TokenKind::StarAssign),
            '%' => self.one_or_assign(TokenKind::Percent, TokenKind::PercentAssign),
            '^' => self.one_or_assign(TokenKind::Caret, TokenKind::CaretAssign),
            '=' => self.one_or_assign(TokenKind::Assign, TokenKind::Eq),
            '!' => self.one_or_assign(TokenKind::Bang, TokenKind::NotEq),
            // `>>`, `>>>`, `>>=` and `>>>=` are reassembled by the parser
            '>' => self.one_or_assign(TokenKind::Gt, TokenKind::GtEq),

            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else if self.match_char('*') {
                    self.skip_block_comment()?;
                } else {
                    self.one_or_assign(TokenKind::Slash, TokenKind::SlashAssign);
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenKind::AndAnd);
                } else {
                    self.one_or_assign(TokenKind::Amp, TokenKind::AmpAssign);
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenKind::OrOr);
                } else {
                    self.one_or_assign(TokenKind::Pipe, TokenKind::PipeAssign);
                }
            }
            '<' => {
                if self.match_char('<') {
                    self.one_or_assign(TokenKind::Shl, TokenKind::ShlAssign);
                } else {
                    self.one_or_assign(TokenKind::Lt, TokenKind::LtEq);
                }
            }

            '"' => self.scan_string()?,
            '\'' => self.scan_char()?,

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier_or_keyword(),

            _ => {
                return Err(Error::ParseError(format!(
                    "Unexpected character '{}' at line {}, column {}",
                    c, self.start_line, self.start_column
                )));
            }
        }

        Ok(())
    }

    fn one_or_assign(&mut self, single: TokenKind, with_eq: TokenKind) {
        if self.match_char('=') {
            self.add_token(with_eq);
        } else {
            self.add_token(single);
        }
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() {
                return Err(Error::ParseError(format!(
                    "Unterminated comment starting at line {}",
                    self.start_line
                )));
            }
            let c = self.advance();
            if c == '\n' {
                self.newline();
            } else if c == '*' && self.peek() == '/' {
                self.advance();
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            match self.peek() {
                '\n' => {
                    return Err(Error::ParseError(format!(
                        "Unterminated string at line {}",
                        self.start_line
                    )));
                }
                '\\' => {
                    value.push(self.advance());
                    if self.is_at_end() {
                        break;
                    }
                    value.push(self.advance());
                }
                _ => value.push(self.advance()),
            }
        }

        if self.is_at_end() {
            return Err(Error::ParseError(format!(
                "Unterminated string at line {}",
                self.start_line
            )));
        }

        self.advance(); // Closing "
        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_char(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '\'' && self.peek() != '\n' {
            if self.peek() == '\\' {
                value.push(self.advance());
                if self.is_at_end() {
                    break;
                }
            }
            value.push(self.advance());
        }

        if self.is_at_end() || self.peek() != '\'' || value.is_empty() {
            return Err(Error::ParseError(format!(
                "Invalid character literal at line {}, column {}",
                self.start_line, self.start_column
            )));
        }

        self.advance(); // Closing '
        self.add_token(TokenKind::Char(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let first = self.source[self.start];

        // Hex and binary integers
        if first == '0' && matches!(self.peek(), 'x' | 'X' | 'b' | 'B') {
            let radix_char = self.advance();
            let is_hex = matches!(radix_char, 'x' | 'X');
            let digits_start = self.current;
            while self.peek().is_ascii_hexdigit() || self.peek() == '_' {
                if !is_hex && !matches!(self.peek(), '0' | '1' | '_') {
                    break;
                }
                self.advance();
            }
            if self.current == digits_start {
                return Err(Error::ParseError(format!(
                    "Invalid integer literal at line {}, column {}",
                    self.start_line, self.start_column
                )));
            }
            return self.finish_integer();
        }

        let mut is_floating = first == '.';
        self.consume_digits();

        if !is_floating && self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_floating = true;
            self.advance();
            self.consume_digits();
        } else if !is_floating
            && self.peek() == '.'
            && !self.peek_next().is_alphabetic()
            && self.peek_next() != '.'
        {
            // `1.` is a valid double literal
            is_floating = true;
            self.advance();
        }

        if matches!(self.peek(), 'e' | 'E') {
            let sign_ok = self.peek_next().is_ascii_digit()
                || (matches!(self.peek_next(), '+' | '-')
                    && self
                        .source
                        .get(self.current + 2)
                        .is_some_and(|c| c.is_ascii_digit()));
            if sign_ok {
                is_floating = true;
                self.advance();
                if matches!(self.peek(), '+' | '-') {
                    self.advance();
                }
                self.consume_digits();
            }
        }

        match self.peek() {
            'f' | 'F' => {
                self.advance();
                let text = self.lexeme();
                self.add_token(TokenKind::Float(text));
            }
            'd' | 'D' => {
                self.advance();
                let text = self.lexeme();
                self.add_token(TokenKind::Double(text));
            }
            _ if is_floating => {
                let text = self.lexeme();
                self.add_token(TokenKind::Double(text));
            }
            _ => return self.finish_integer(),
        }

        Ok(())
    }

    fn finish_integer(&mut self) -> Result<()> {
        if matches!(self.peek(), 'l' | 'L') {
            self.advance();
            let text = self.lexeme();
            self.add_token(TokenKind::Long(text));
        } else {
            let text = self.lexeme();
            self.add_token(TokenKind::Integer(text));
        }
        Ok(())
    }

    fn consume_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == '_' {
            self.advance();
        }
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' || self.peek() == '$' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
        ));
    }
}
