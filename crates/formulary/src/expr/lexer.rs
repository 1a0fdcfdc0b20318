//! Tokenizer for the formula language.
//!
//! Only the constructs the evaluator understands are produced. Python-style
//! attribute access, indexing, assignment and the `**`, `%`, `@` operators are
//! rejected here with a reason naming the construct.

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,

    /// Bare identifier
    Ident(String),
    /// Backtick-quoted column name
    Quoted(String),

    // Keywords and operators
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LeftParen,
    RightParen,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(i) => i.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Str(s) => format!("{:?}", s),
            Token::True => "True".into(),
            Token::False => "False".into(),
            Token::Ident(name) => name.clone(),
            Token::Quoted(name) => format!("`{}`", name),
            Token::And => "and".into(),
            Token::Or => "or".into(),
            Token::Not => "not".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::EqualEqual => "==".into(),
            Token::NotEqual => "!=".into(),
            Token::Less => "<".into(),
            Token::LessEqual => "<=".into(),
            Token::Greater => ">".into(),
            Token::GreaterEqual => ">=".into(),
            Token::LeftParen => "(".into(),
            Token::RightParen => ")".into(),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Split an expression into tokens.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, String> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Spanned>, String> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek_char() else {
                break;
            };
            let start = self.pos;
            let token = self.scan_token(c)?;
            self.tokens.push(Spanned {
                token,
                offset: start,
            });
        }
        Ok(self.tokens)
    }

    fn scan_token(&mut self, c: char) -> Result<Token, String> {
        match c {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '/' => self.single(Token::Slash),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '&' => self.single(Token::And),
            '|' => self.single(Token::Or),
            '~' => self.single(Token::Not),
            '*' => {
                self.advance();
                if self.peek_char() == Some('*') {
                    return Err("the '**' operator is not allowed".into());
                }
                Ok(Token::Star)
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::EqualEqual);
                }
                Err("assignment ('=') is not allowed; use '==' to compare".into())
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                Err(format!("unexpected character '!' at position {}", self.pos - 1))
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::LessEqual);
                }
                Ok(Token::Less)
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::GreaterEqual);
                }
                Ok(Token::Greater)
            }
            '%' => Err("the '%' operator is not allowed".into()),
            '@' => Err("the '@' operator is not allowed".into()),
            '[' | ']' => Err("indexing is not allowed".into()),
            ',' => Err("function calls and tuples are not allowed".into()),
            '\'' | '"' => self.scan_string(c),
            '`' => self.scan_quoted_name(),
            '.' => {
                let follows_operand = self.input[..self.pos]
                    .chars()
                    .next_back()
                    .is_some_and(|p| p.is_ascii_alphanumeric() || p == '_' || p == ')' || p == '`');
                if !follows_operand && self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.scan_number()
                } else {
                    Err("attribute access is not allowed".into())
                }
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.scan_identifier()),
            other => Err(format!(
                "unexpected character '{}' at position {}",
                other, self.pos
            )),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, String> {
        self.advance();
        Ok(token)
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, String> {
        let start = self.pos;
        self.advance(); // opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return Err(format!("unterminated string starting at position {}", start)),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::Str(s));
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some(other) => {
                            return Err(format!("unknown escape '\\{}' in string", other));
                        }
                        None => {
                            return Err(format!(
                                "unterminated string starting at position {}",
                                start
                            ));
                        }
                    };
                    s.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_quoted_name(&mut self) -> Result<Token, String> {
        let start = self.pos;
        self.advance(); // opening backtick
        let name_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '`' {
                let name = self.input[name_start..self.pos].to_string();
                self.advance();
                if name.is_empty() {
                    return Err("empty column name in backticks".into());
                }
                return Ok(Token::Quoted(name));
            }
            self.advance();
        }
        Err(format!(
            "unterminated backtick name starting at position {}",
            start
        ))
    }

    fn scan_number(&mut self) -> Result<Token, String> {
        let start = self.pos;
        let mut is_float = false;

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            let exponent_digits = match self.peek_char_at(1) {
                Some('+') | Some('-') => self.peek_char_at(2),
                other => other,
            };
            if exponent_digits.is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance();
                if self.peek_char().is_some_and(|c| c == '+' || c == '-') {
                    self.advance();
                }
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        if self.peek_char() == Some('.') {
            return Err("attribute access is not allowed".into());
        }
        if self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            return Err(format!("invalid number literal at position {}", start));
        }

        let text = &self.input[start..self.pos];
        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Token::Int(i));
            }
        }
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| format!("invalid number literal '{}'", text))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "True" | "true" => Token::True,
            "False" | "false" => Token::False,
            name => Token::Ident(name.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}
